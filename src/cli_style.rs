use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Stylize};
use std::fmt::Write as _;
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Color Palette
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    pub const GREEN: Color = Color::Rgb {
        r: 30,
        g: 215,
        b: 96,
    };
    pub const TEAL: Color = Color::Rgb {
        r: 0,
        g: 200,
        b: 180,
    };
    pub const ORANGE: Color = Color::Rgb {
        r: 255,
        g: 165,
        b: 0,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
    pub const WHITE: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Box Drawing Characters
// ═══════════════════════════════════════════════════════════════════════════════

pub mod box_chars {
    pub const SINGLE_HORIZONTAL: &str = "─";
    pub const SINGLE_VERTICAL: &str = "│";

    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";

    pub const T_LEFT: &str = "├";
    pub const T_RIGHT: &str = "┤";
    pub const T_TOP: &str = "┬";
    pub const T_BOTTOM: &str = "┴";
    pub const CROSS: &str = "┼";

    pub const BULLET: &str = "●";
    pub const BULLET_EMPTY: &str = "○";
    pub const DIAMOND: &str = "◆";
    pub const CHECK: &str = "✓";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_success(message: &str) {
    println!(
        " {} {}",
        box_chars::CHECK.to_string().with(colors::GREEN).bold(),
        message.with(colors::GREEN)
    );
}

pub fn print_warning(message: &str) {
    println!(
        " {} {}",
        "⚠".with(colors::ORANGE).bold(),
        message.with(colors::ORANGE)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Section Headers
// ═══════════════════════════════════════════════════════════════════════════════

const SECTION_WIDTH: usize = 60;

pub fn print_section_header(title: &str) {
    let title_len = title.width();
    let padding = SECTION_WIDTH.saturating_sub(title_len + 4) / 2;

    println!();
    print!("{}", box_chars::ROUND_TOP_LEFT.with(colors::GREEN));
    print!(
        "{}",
        box_chars::SINGLE_HORIZONTAL
            .repeat(padding)
            .with(colors::GREEN)
    );
    print!(
        " {} ",
        title.with(colors::GREEN).bold().attribute(Attribute::Italic)
    );
    print!(
        "{}",
        box_chars::SINGLE_HORIZONTAL
            .repeat(SECTION_WIDTH.saturating_sub(title_len + 4 + padding))
            .with(colors::GREEN)
    );
    println!("{}", box_chars::ROUND_TOP_RIGHT.with(colors::GREEN));
}

pub fn print_section_footer() {
    print!("{}", box_chars::ROUND_BOTTOM_LEFT.with(colors::GREEN));
    print!(
        "{}",
        box_chars::SINGLE_HORIZONTAL
            .repeat(SECTION_WIDTH)
            .with(colors::GREEN)
    );
    println!("{}", box_chars::ROUND_BOTTOM_RIGHT.with(colors::GREEN));
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Key-Value Display
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::TEAL),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

pub fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::DIAMOND.with(colors::TEAL),
        format!("{}:", key).with(colors::GREEN).bold(),
        value.with(colors::GREEN).bold()
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Table Display
// ═══════════════════════════════════════════════════════════════════════════════

/// Column alignment of a report table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

pub struct TableBuilder {
    headers: Vec<String>,
    aligns: Vec<Align>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: Vec<&str>) -> Self {
        let col_widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
        TableBuilder {
            aligns: vec![Align::Left; headers.len()],
            headers: headers.into_iter().map(String::from).collect(),
            rows: Vec::new(),
            col_widths,
        }
    }

    /// Right-aligns column `index`, for counts.
    pub fn align_right(mut self, index: usize) -> Self {
        if let Some(align) = self.aligns.get_mut(index) {
            *align = Align::Right;
        }
        self
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (i, cell) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                self.col_widths[i] = self.col_widths[i].max(cell.width());
            }
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn border(&self, left: &str, junction: &str, right: &str) -> String {
        let inner = self
            .col_widths
            .iter()
            .map(|w| box_chars::SINGLE_HORIZONTAL.repeat(w + 2))
            .collect::<Vec<_>>()
            .join(junction);
        format!("{}{}{}", left, inner, right)
    }

    fn line(&self, cells: &[String]) -> String {
        let mut out = String::from(box_chars::SINGLE_VERTICAL);
        for (i, width) in self.col_widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let padding = " ".repeat(width.saturating_sub(cell.width()));
            let _ = match self.aligns[i] {
                Align::Left => write!(out, " {}{} ", cell, padding),
                Align::Right => write!(out, " {}{} ", padding, cell),
            };
            out.push_str(box_chars::SINGLE_VERTICAL);
        }
        out
    }

    /// Renders the table without colors.
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 4);
        lines.push(self.border(
            box_chars::ROUND_TOP_LEFT,
            box_chars::T_TOP,
            box_chars::ROUND_TOP_RIGHT,
        ));
        lines.push(self.line(&self.headers));
        lines.push(self.border(box_chars::T_LEFT, box_chars::CROSS, box_chars::T_RIGHT));
        for row in &self.rows {
            lines.push(self.line(row));
        }
        lines.push(self.border(
            box_chars::ROUND_BOTTOM_LEFT,
            box_chars::T_BOTTOM,
            box_chars::ROUND_BOTTOM_RIGHT,
        ));
        lines
    }

    pub fn print(&self) {
        let lines = self.render();
        let last = lines.len().saturating_sub(1);
        for (i, line) in lines.iter().enumerate() {
            // header row is bold, borders are green
            if i == 1 {
                println!("{}", line.clone().with(colors::GREEN).bold());
            } else if i == 0 || i == 2 || i == last {
                println!("{}", line.clone().with(colors::GREEN));
            } else {
                println!("{}", line.clone().with(colors::WHITE));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_columns_grow_to_widest_cell() {
        let mut table = TableBuilder::new(vec!["Title", "Plays"]).align_right(1);
        table.add_row(vec!["Song_Title_10".to_string(), "7".to_string()]);
        table.add_row(vec!["A".to_string(), "12".to_string()]);

        assert_eq!(
            table.render(),
            vec![
                "╭───────────────┬───────╮",
                "│ Title         │ Plays │",
                "├───────────────┼───────┤",
                "│ Song_Title_10 │     7 │",
                "│ A             │    12 │",
                "╰───────────────┴───────╯",
            ]
        );
    }

    #[test]
    fn test_missing_cells_render_blank() {
        let mut table = TableBuilder::new(vec!["a", "b"]);
        assert!(table.is_empty());
        table.add_row(vec!["x".to_string()]);
        assert!(!table.is_empty());
        assert_eq!(table.render()[3], "│ x │   │");
    }
}
