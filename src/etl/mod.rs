//! Loading stages: fixture files in, warehouse rows out.
//!
//! Both loaders walk their input tree in sorted order and hand every file to
//! a per-file processor inside its own transaction. A file is committed as
//! soon as its processor returns; the first error aborts the run and rolls
//! back only the file being processed.

mod files;
mod log_loader;
mod records;
mod song_loader;
mod time_dimension;

pub use files::collect_json_files;
pub use log_loader::{load_log_data, process_log_file, read_log_file, LogLoadStats};
pub use records::{LogEvent, SongRecord, NEXT_SONG_PAGE};
pub use song_loader::{load_song_data, process_song_file, read_song_file, SongLoadStats};
pub use time_dimension::{time_row, time_row_from_millis};

use crate::error::{EtlError, EtlResult};
use crate::warehouse::{FileTransaction, Warehouse};
use std::ops::AddAssign;
use std::path::Path;
use tracing::{debug, info};

/// Runs `func` on every JSON file below `dir`, committing after each file,
/// and sums up the per-file stats.
pub fn process_data<S, F>(warehouse: &mut Warehouse, dir: &Path, mut func: F) -> EtlResult<S>
where
    S: Default + AddAssign,
    F: FnMut(&FileTransaction<'_>, &Path) -> EtlResult<S>,
{
    let files = collect_json_files(dir)?;
    let total = files.len();
    info!("{} files found in {}", total, dir.display());

    let mut stats = S::default();
    for (i, path) in files.iter().enumerate() {
        debug!("Processing {}", path.display());
        let tx = warehouse
            .begin_file()
            .map_err(|e| EtlError::from_db(path, e))?;
        let file_stats = func(&tx, path)?;
        tx.commit().map_err(|e| EtlError::from_db(path, e))?;
        stats += file_stats;
        info!("{}/{} files processed.", i + 1, total);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::warehouse::ArtistRow;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Seen(Vec<String>);

    impl AddAssign for Seen {
        fn add_assign(&mut self, other: Self) {
            self.0.extend(other.0);
        }
    }

    fn setup() -> (TempDir, Warehouse) {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("warehouse.sqlite"),
        };
        let warehouse = Warehouse::open(&config).unwrap();
        warehouse.reset_schema().unwrap();
        fs::create_dir_all(dir.path().join("input")).unwrap();
        (dir, warehouse)
    }

    fn artist(id: &str) -> ArtistRow {
        ArtistRow {
            artist_id: id.to_string(),
            name: id.to_string(),
            location: None,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_files_are_visited_in_sorted_order() {
        let (dir, mut warehouse) = setup();
        let input = dir.path().join("input");
        for name in ["c.json", "a.json", "b.json"] {
            fs::write(input.join(name), "{}").unwrap();
        }

        let seen: Seen = process_data(&mut warehouse, &input, |_, path| {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            Ok(Seen(vec![name]))
        })
        .unwrap();

        assert_eq!(seen.0, vec!["a.json", "b.json", "c.json"]);
    }

    #[test]
    fn test_failed_file_rolls_back_but_earlier_files_stay() {
        let (dir, mut warehouse) = setup();
        let input = dir.path().join("input");
        for name in ["1.json", "2.json"] {
            fs::write(input.join(name), "{}").unwrap();
        }

        let result: EtlResult<Seen> = process_data(&mut warehouse, &input, |tx, path| {
            let name = path.file_stem().unwrap().to_string_lossy().to_string();
            tx.insert_artist(&artist(&format!("AR{}", name)))
                .map_err(|e| EtlError::from_db(path, e))?;
            if name == "2" {
                return Err(EtlError::malformed(path, "boom"));
            }
            Ok(Seen(vec![name]))
        });

        assert!(matches!(result, Err(EtlError::MalformedInput { .. })));
        assert_eq!(warehouse.count_rows("artists").unwrap(), 1);
    }
}
