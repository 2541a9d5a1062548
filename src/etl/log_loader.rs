use super::process_data;
use super::records::LogEvent;
use super::time_dimension::time_row_from_millis;
use crate::error::{EtlError, EtlResult};
use crate::warehouse::{FileTransaction, TimeRow, UserRow, Warehouse};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::ops::AddAssign;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogLoadStats {
    pub files: usize,
    pub events_read: usize,
    /// Events whose page is not `NextSong`.
    pub events_skipped: usize,
    /// Newly inserted time rows; instants already present are not counted.
    pub time_rows: usize,
    pub user_upserts: usize,
    pub songplays: usize,
    pub songplays_matched: usize,
}

impl AddAssign for LogLoadStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.events_read += other.events_read;
        self.events_skipped += other.events_skipped;
        self.time_rows += other.time_rows;
        self.user_upserts += other.user_upserts;
        self.songplays += other.songplays;
        self.songplays_matched += other.songplays_matched;
    }
}

/// Parses every non-blank line of an event-stream file, in file order.
pub fn read_log_file(path: &Path) -> EtlResult<Vec<LogEvent>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(EtlError::malformed(
                    path,
                    format!("line {}: {}", index + 1, e),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        let event: LogEvent = serde_json::from_str(&line)
            .map_err(|e| EtlError::malformed(path, format!("line {}: {}", index + 1, e)))?;
        events.push(event);
    }
    Ok(events)
}

struct PreparedPlay<'a> {
    event: &'a LogEvent,
    time: TimeRow,
    user: UserRow,
}

/// Loads the `NextSong` events of one file: time rows, then users, then one
/// songplay per event with its song/artist keys resolved by lookup.
pub fn process_log_file(tx: &FileTransaction<'_>, path: &Path) -> EtlResult<LogLoadStats> {
    let events = read_log_file(path)?;
    let mut stats = LogLoadStats {
        files: 1,
        events_read: events.len(),
        ..Default::default()
    };

    // Derive every row up front so an incomplete event fails the file before
    // anything is written.
    let mut plays = Vec::new();
    for event in events.iter().filter(|e| e.is_song_play()) {
        let time = time_row_from_millis(event.ts).ok_or_else(|| {
            EtlError::malformed(path, format!("ts {} is out of range", event.ts))
        })?;
        let user = event
            .user_row()
            .map_err(|reason| EtlError::malformed(path, reason))?;
        plays.push(PreparedPlay { event, time, user });
    }
    stats.events_skipped = events.len() - plays.len();

    let db_err = |e: rusqlite::Error| EtlError::from_db(path, e);

    for play in &plays {
        if tx.insert_time(&play.time).map_err(db_err)? {
            stats.time_rows += 1;
        }
    }

    for play in &plays {
        tx.upsert_user(&play.user).map_err(db_err)?;
        stats.user_upserts += 1;
    }

    for play in &plays {
        let song_match = match play.event.lookup_key() {
            Some((title, artist, length)) => {
                tx.find_song_match(title, artist, length).map_err(db_err)?
            }
            None => None,
        };
        if song_match.is_some() {
            stats.songplays_matched += 1;
        }
        let row = play
            .event
            .songplay_row(play.time.start_time, &play.user, song_match);
        tx.insert_songplay(&row).map_err(db_err)?;
        stats.songplays += 1;
    }

    debug!(
        "{}: {} events, {} songplays ({} matched)",
        path.display(),
        stats.events_read,
        stats.songplays,
        stats.songplays_matched
    );
    Ok(stats)
}

pub fn load_log_data(warehouse: &mut Warehouse, dir: &Path) -> EtlResult<LogLoadStats> {
    let stats = process_data(warehouse, dir, process_log_file)?;
    info!(
        "Log data loaded: {} files, {} events read, {} skipped, {} songplays ({} matched)",
        stats.files,
        stats.events_read,
        stats.events_skipped,
        stats.songplays,
        stats.songplays_matched
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::warehouse::{ArtistRow, SongRow};
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const TS: i64 = 1767225600000;

    fn setup() -> (TempDir, Warehouse, PathBuf) {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("warehouse.sqlite"),
        };
        let mut warehouse = Warehouse::open(&config).unwrap();
        warehouse.reset_schema().unwrap();

        let tx = warehouse.begin_file().unwrap();
        for (artist_id, name) in [("AR_B", "Artist_1"), ("AR_A", "Artist_1"), ("AR_C", "Artist_2")] {
            tx.insert_artist(&ArtistRow {
                artist_id: artist_id.to_string(),
                name: name.to_string(),
                location: None,
                latitude: None,
                longitude: None,
            })
            .unwrap();
        }
        for (song_id, title, artist_id, duration) in [
            ("SONG_1", "Song_Title_1", "AR_B", 215.37),
            ("SONG_0", "Song_Title_1", "AR_A", 215.37),
            ("SONG_2", "Song_Title_2", "AR_C", 180.0),
        ] {
            tx.insert_song(&SongRow {
                song_id: song_id.to_string(),
                title: title.to_string(),
                artist_id: artist_id.to_string(),
                year: 2000,
                duration,
            })
            .unwrap();
        }
        tx.commit().unwrap();

        let logs_dir = dir.path().join("log_data");
        fs::create_dir_all(&logs_dir).unwrap();
        (dir, warehouse, logs_dir)
    }

    fn event(
        page: &str,
        ts: i64,
        user_id: &str,
        level: &str,
        song: Option<(&str, &str, f64)>,
    ) -> serde_json::Value {
        let (title, artist, length) = match song {
            Some((t, a, l)) => (json!(t), json!(a), json!(l)),
            None => (json!(null), json!(null), json!(null)),
        };
        json!({
            "artist": artist,
            "auth": "Logged In",
            "firstName": format!("First_{}", user_id),
            "gender": "M",
            "itemInSession": 0,
            "lastName": "Last",
            "length": length,
            "level": level,
            "location": "Somewhere",
            "method": "PUT",
            "page": page,
            "registration": 1540000000000.0,
            "sessionId": 123,
            "song": title,
            "status": 200,
            "ts": ts,
            "userAgent": "Agent",
            "userId": user_id,
        })
    }

    fn write_log(dir: &Path, name: &str, events: &[serde_json::Value]) -> PathBuf {
        let body = events
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn songplay_keys(warehouse: &Warehouse) -> Vec<(Option<String>, Option<String>)> {
        let mut stmt = warehouse
            .connection()
            .prepare("SELECT song_id, artist_id FROM songplays ORDER BY songplay_id")
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_non_song_pages_are_filtered() {
        let (_dir, mut warehouse, logs_dir) = setup();
        write_log(
            &logs_dir,
            "events.json",
            &[
                event("Home", TS, "1", "free", None),
                event("NextSong", TS + 1000, "1", "free", Some(("Song_Title_2", "Artist_2", 180.0))),
                event("Logout", TS + 2000, "1", "free", None),
            ],
        );

        let stats = load_log_data(&mut warehouse, &logs_dir).unwrap();

        assert_eq!(stats.events_read, 3);
        assert_eq!(stats.events_skipped, 2);
        assert_eq!(stats.songplays, 1);
        assert_eq!(warehouse.count_rows("songplays").unwrap(), 1);
        assert_eq!(warehouse.count_rows("time").unwrap(), 1);
    }

    #[test]
    fn test_exact_match_sets_keys_and_anything_else_is_null() {
        let (_dir, mut warehouse, logs_dir) = setup();
        write_log(
            &logs_dir,
            "events.json",
            &[
                event("NextSong", TS, "1", "free", Some(("Song_Title_2", "Artist_2", 180.0))),
                event("NextSong", TS + 1, "1", "free", Some(("Song_Title_2", "Artist_2", 180.01))),
                event("NextSong", TS + 2, "1", "free", Some(("Song_Title_2", "Artist_1", 180.0))),
                event("NextSong", TS + 3, "1", "free", Some(("Random_Song_3", "Random_Artist_3", 200.0))),
            ],
        );

        let stats = load_log_data(&mut warehouse, &logs_dir).unwrap();

        assert_eq!(stats.songplays, 4);
        assert_eq!(stats.songplays_matched, 1);
        assert_eq!(
            songplay_keys(&warehouse),
            vec![
                (Some("SONG_2".to_string()), Some("AR_C".to_string())),
                (None, None),
                (None, None),
                (None, None),
            ]
        );
    }

    #[test]
    fn test_ambiguous_match_takes_lowest_song_id() {
        let (_dir, mut warehouse, logs_dir) = setup();
        write_log(
            &logs_dir,
            "events.json",
            &[event("NextSong", TS, "1", "paid", Some(("Song_Title_1", "Artist_1", 215.37)))],
        );

        load_log_data(&mut warehouse, &logs_dir).unwrap();

        assert_eq!(
            songplay_keys(&warehouse),
            vec![(Some("SONG_0".to_string()), Some("AR_A".to_string()))]
        );
    }

    #[test]
    fn test_user_level_is_last_write_wins() {
        let (_dir, mut warehouse, logs_dir) = setup();
        write_log(
            &logs_dir,
            "a.json",
            &[event("NextSong", TS, "7", "free", None)],
        );
        write_log(
            &logs_dir,
            "b.json",
            &[
                event("NextSong", TS + 60_000, "7", "paid", None),
                event("NextSong", TS + 120_000, "7", "free", None),
                event("NextSong", TS + 180_000, "7", "paid", None),
            ],
        );

        load_log_data(&mut warehouse, &logs_dir).unwrap();

        let level: String = warehouse
            .connection()
            .query_row("SELECT level FROM users WHERE user_id = '7'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(level, "paid");
        assert_eq!(warehouse.count_rows("users").unwrap(), 1);

        // each fact row keeps the level of its own event
        let levels: Vec<String> = warehouse
            .connection()
            .prepare("SELECT level FROM songplays ORDER BY songplay_id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(levels, vec!["free", "paid", "free", "paid"]);
    }

    #[test]
    fn test_rerun_duplicates_songplays_only() {
        let (_dir, mut warehouse, logs_dir) = setup();
        write_log(
            &logs_dir,
            "events.json",
            &[
                event("NextSong", TS, "1", "free", None),
                event("NextSong", TS, "2", "paid", None),
            ],
        );

        let first = load_log_data(&mut warehouse, &logs_dir).unwrap();
        let second = load_log_data(&mut warehouse, &logs_dir).unwrap();

        assert_eq!(first.time_rows, 1);
        assert_eq!(second.time_rows, 0);
        assert_eq!(warehouse.count_rows("time").unwrap(), 1);
        assert_eq!(warehouse.count_rows("users").unwrap(), 2);
        assert_eq!(warehouse.count_rows("songplays").unwrap(), 4);
    }

    #[test]
    fn test_time_row_is_derived_from_ts() {
        let (_dir, mut warehouse, logs_dir) = setup();
        write_log(&logs_dir, "events.json", &[event("NextSong", TS, "1", "free", None)]);

        load_log_data(&mut warehouse, &logs_dir).unwrap();

        let row: (String, u32, u32, u32, u32, i32, u32) = warehouse
            .connection()
            .query_row(
                "SELECT start_time, hour, day, week, month, year, weekday FROM time",
                [],
                |r| {
                    Ok((
                        r.get(0)?,
                        r.get(1)?,
                        r.get(2)?,
                        r.get(3)?,
                        r.get(4)?,
                        r.get(5)?,
                        r.get(6)?,
                    ))
                },
            )
            .unwrap();
        assert_eq!(
            row,
            ("2026-01-01 00:00:00.000".to_string(), 0, 1, 1, 1, 2026, 3)
        );
    }

    #[test]
    fn test_parse_error_reports_line_number() {
        let (_dir, mut warehouse, logs_dir) = setup();
        let path = logs_dir.join("events.json");
        let good = event("NextSong", TS, "1", "free", None).to_string();
        fs::write(&path, format!("{}\n\n{{not json\n", good)).unwrap();

        let err = load_log_data(&mut warehouse, &logs_dir).unwrap_err();

        match err {
            EtlError::MalformedInput { reason, .. } => assert!(reason.starts_with("line 3:")),
            other => panic!("expected malformed input, got {:?}", other),
        }
        assert_eq!(warehouse.count_rows("songplays").unwrap(), 0);
    }

    #[test]
    fn test_invalid_utf8_is_malformed_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        let good = event("NextSong", TS, "1", "free", None).to_string();
        let mut bytes = format!("{}\n{{\"page\": \"", good).into_bytes();
        bytes.extend_from_slice(b"\xff\xfe\"}\n");
        fs::write(&path, bytes).unwrap();

        match read_log_file(&path).unwrap_err() {
            EtlError::MalformedInput { path: p, reason } => {
                assert_eq!(p, path);
                assert!(reason.starts_with("line 2:"));
            }
            other => panic!("expected malformed input, got {:?}", other),
        }
    }

    #[test]
    fn test_song_play_without_user_fails_before_writing() {
        let (_dir, mut warehouse, logs_dir) = setup();
        write_log(
            &logs_dir,
            "events.json",
            &[
                event("NextSong", TS, "1", "free", None),
                event("NextSong", TS + 1, "", "free", None),
            ],
        );

        let result = load_log_data(&mut warehouse, &logs_dir);

        assert!(matches!(result, Err(EtlError::MalformedInput { .. })));
        assert_eq!(warehouse.count_rows("users").unwrap(), 0);
        assert_eq!(warehouse.count_rows("time").unwrap(), 0);
    }

    #[test]
    fn test_logged_out_non_song_events_are_tolerated() {
        let (_dir, mut warehouse, logs_dir) = setup();
        write_log(
            &logs_dir,
            "events.json",
            &[
                event("Login", TS, "", "free", None),
                event("NextSong", TS + 1, "3", "free", None),
            ],
        );

        let stats = load_log_data(&mut warehouse, &logs_dir).unwrap();
        assert_eq!(stats.songplays, 1);
        assert_eq!(stats.user_upserts, 1);
    }
}
