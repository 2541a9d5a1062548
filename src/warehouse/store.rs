//! SQLite-backed warehouse.
//!
//! `Warehouse` owns the single connection of a stage. Loaders write through a
//! `FileTransaction`, one per input file, which is the commit boundary.

use super::models::*;
use super::schema::WAREHOUSE_SCHEMA;
use crate::config::DatabaseConfig;
use crate::error::{EtlError, EtlResult};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct Warehouse {
    conn: Connection,
    path: PathBuf,
}

impl Warehouse {
    /// Opens (creating if needed) the warehouse database for writing.
    pub fn open(config: &DatabaseConfig) -> EtlResult<Self> {
        Self::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    /// Opens an existing warehouse database; every write fails.
    pub fn open_read_only(config: &DatabaseConfig) -> EtlResult<Self> {
        Self::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
    }

    fn open_with_flags(path: &Path, flags: OpenFlags) -> EtlResult<Self> {
        let connection_error = |source| EtlError::Connection {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open_with_flags(path, flags).map_err(connection_error)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(connection_error)?;
        Ok(Warehouse {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Drops every warehouse table (if present) and recreates the empty schema.
    pub fn reset_schema(&self) -> Result<()> {
        WAREHOUSE_SCHEMA
            .reset(&self.conn)
            .with_context(|| format!("Failed to reset schema of {:?}", self.path))?;
        info!(
            "Warehouse schema reset: {}",
            WAREHOUSE_SCHEMA
                .tables
                .iter()
                .map(|t| t.name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }

    pub fn validate_schema(&self) -> Result<()> {
        WAREHOUSE_SCHEMA.validate(&self.conn).with_context(|| {
            format!(
                "Warehouse {:?} has no valid schema, run create-tables first",
                self.path
            )
        })
    }

    pub fn begin_file(&mut self) -> rusqlite::Result<FileTransaction<'_>> {
        Ok(FileTransaction {
            tx: self.conn.transaction()?,
        })
    }

    /// Number of rows in one of the warehouse tables.
    pub fn count_rows(&self, table: &str) -> rusqlite::Result<u64> {
        let known = WAREHOUSE_SCHEMA.tables.iter().any(|t| t.name == table);
        if !known {
            return Err(rusqlite::Error::InvalidParameterName(table.to_string()));
        }
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
                r.get::<_, i64>(0)
            })
            .map(|count| count as u64)
    }
}

/// Writes of a single input file; dropped without `commit` means rollback.
pub struct FileTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl FileTransaction<'_> {
    /// Plain insert, a duplicate `artist_id` is a constraint violation.
    pub fn insert_artist(&self, artist: &ArtistRow) -> rusqlite::Result<()> {
        self.tx
            .prepare_cached(
                "INSERT INTO artists (artist_id, name, location, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                &artist.artist_id,
                &artist.name,
                &artist.location,
                artist.latitude,
                artist.longitude
            ])?;
        Ok(())
    }

    /// Plain insert, a duplicate `song_id` is a constraint violation.
    pub fn insert_song(&self, song: &SongRow) -> rusqlite::Result<()> {
        self.tx
            .prepare_cached(
                "INSERT INTO songs (song_id, title, artist_id, year, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                &song.song_id,
                &song.title,
                &song.artist_id,
                song.year,
                song.duration
            ])?;
        Ok(())
    }

    /// Returns false when the instant was already present.
    pub fn insert_time(&self, time: &TimeRow) -> rusqlite::Result<bool> {
        let inserted = self
            .tx
            .prepare_cached(
                "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(start_time) DO NOTHING",
            )?
            .execute(params![
                format_start_time(&time.start_time),
                time.hour,
                time.day,
                time.week,
                time.month,
                time.year,
                time.weekday
            ])?;
        Ok(inserted > 0)
    }

    /// Last write wins on every column.
    pub fn upsert_user(&self, user: &UserRow) -> rusqlite::Result<()> {
        self.tx
            .prepare_cached(
                "INSERT INTO users (user_id, first_name, last_name, gender, level)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    gender = excluded.gender,
                    level = excluded.level",
            )?
            .execute(params![
                &user.user_id,
                &user.first_name,
                &user.last_name,
                user.gender.map(|g| g.to_db_str()),
                user.level.to_db_str()
            ])?;
        Ok(())
    }

    /// Exact match on title, artist name and duration. Several matches
    /// resolve to the lowest song_id.
    pub fn find_song_match(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> rusqlite::Result<Option<SongMatch>> {
        self.tx
            .prepare_cached(
                "SELECT s.song_id, a.artist_id
                 FROM songs s
                 JOIN artists a ON s.artist_id = a.artist_id
                 WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
                 ORDER BY s.song_id, a.artist_id
                 LIMIT 1",
            )?
            .query_row(params![title, artist_name, duration], |row| {
                Ok(SongMatch {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })
            .optional()
    }

    /// Returns the assigned songplay_id.
    pub fn insert_songplay(&self, play: &SongplayRow) -> rusqlite::Result<i64> {
        self.tx
            .prepare_cached(
                "INSERT INTO songplays
                    (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?
            .execute(params![
                format_start_time(&play.start_time),
                &play.user_id,
                play.level.to_db_str(),
                &play.song_id,
                &play.artist_id,
                play.session_id,
                &play.location,
                &play.user_agent
            ])?;
        Ok(self.tx.last_insert_rowid())
    }

    pub fn commit(self) -> rusqlite::Result<()> {
        self.tx.commit()
    }
}
