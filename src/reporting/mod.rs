//! Read-only aggregate queries over a loaded warehouse.

use crate::warehouse::{Level, Warehouse, WAREHOUSE_SCHEMA};
use rusqlite::{params, Connection};

/// Row limit of the top-N reports printed by the analytics binary.
pub const REPORT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongPlayCount {
    pub title: String,
    pub play_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourActivity {
    pub hour: u32,
    pub activity_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCount {
    pub level: Level,
    pub user_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub total_listens: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    pub total_songplays: u64,
    pub matched_songplays: u64,
}

impl MatchSummary {
    pub fn unmatched_songplays(&self) -> u64 {
        self.total_songplays - self.matched_songplays
    }
}

pub struct Reports<'a> {
    conn: &'a Connection,
}

impl<'a> Reports<'a> {
    pub fn new(warehouse: &'a Warehouse) -> Self {
        Reports {
            conn: warehouse.connection(),
        }
    }

    /// Most played song titles. Plays without a resolved song are not counted.
    pub fn top_songs(&self, limit: usize) -> rusqlite::Result<Vec<SongPlayCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.title, COUNT(*) AS play_count
             FROM songplays sp
             JOIN songs s ON sp.song_id = s.song_id
             GROUP BY s.title
             ORDER BY play_count DESC, s.title ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(SongPlayCount {
                title: row.get(0)?,
                play_count: row.get::<_, i64>(1)? as u64,
            })
        })?;
        rows.collect()
    }

    pub fn busiest_hours(&self, limit: usize) -> rusqlite::Result<Vec<HourActivity>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.hour, COUNT(*) AS activity_count
             FROM songplays sp
             JOIN time t ON sp.start_time = t.start_time
             GROUP BY t.hour
             ORDER BY activity_count DESC, t.hour ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(HourActivity {
                hour: row.get(0)?,
                activity_count: row.get::<_, i64>(1)? as u64,
            })
        })?;
        rows.collect()
    }

    /// Distinct users per subscription level, as currently stored.
    pub fn user_levels(&self) -> rusqlite::Result<Vec<LevelCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT level, COUNT(DISTINCT user_id) AS user_count
             FROM users
             GROUP BY level
             ORDER BY level ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let raw: String = row.get(0)?;
            let level = Level::from_db_str(&raw).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    format!("Unknown level '{}'", raw).into(),
                )
            })?;
            Ok(LevelCount {
                level,
                user_count: row.get::<_, i64>(1)? as u64,
            })
        })?;
        rows.collect()
    }

    /// Users with the most plays. Users sharing both names are counted
    /// together.
    pub fn most_active_users(&self, limit: usize) -> rusqlite::Result<Vec<ActiveUser>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.first_name, u.last_name, COUNT(*) AS total_listens
             FROM songplays sp
             JOIN users u ON sp.user_id = u.user_id
             GROUP BY u.first_name, u.last_name
             ORDER BY total_listens DESC, u.first_name ASC, u.last_name ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(ActiveUser {
                first_name: row.get(0)?,
                last_name: row.get(1)?,
                total_listens: row.get::<_, i64>(2)? as u64,
            })
        })?;
        rows.collect()
    }

    pub fn match_summary(&self) -> rusqlite::Result<MatchSummary> {
        self.conn.query_row(
            "SELECT COUNT(*), COUNT(song_id) FROM songplays",
            [],
            |row| {
                Ok(MatchSummary {
                    total_songplays: row.get::<_, i64>(0)? as u64,
                    matched_songplays: row.get::<_, i64>(1)? as u64,
                })
            },
        )
    }

    /// Row count of every warehouse table, in schema order.
    pub fn table_counts(&self) -> rusqlite::Result<Vec<(&'static str, u64)>> {
        WAREHOUSE_SCHEMA
            .tables
            .iter()
            .map(|table| {
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |r| {
                        r.get::<_, i64>(0)
                    })
                    .map(|count| (table.name, count as u64))
            })
            .collect()
    }
}
