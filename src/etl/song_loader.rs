use super::process_data;
use super::records::SongRecord;
use crate::error::{EtlError, EtlResult};
use crate::warehouse::{FileTransaction, Warehouse};
use std::fs::File;
use std::io::BufReader;
use std::ops::AddAssign;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SongLoadStats {
    pub files: usize,
    pub songs: usize,
    pub artists: usize,
}

impl AddAssign for SongLoadStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.songs += other.songs;
        self.artists += other.artists;
    }
}

/// Parses one song metadata document.
pub fn read_song_file(path: &Path) -> EtlResult<SongRecord> {
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|e| EtlError::malformed(path, e.to_string()))
}

/// Inserts the artist and then the song of one metadata file.
pub fn process_song_file(tx: &FileTransaction<'_>, path: &Path) -> EtlResult<SongLoadStats> {
    let record = read_song_file(path)?;

    tx.insert_artist(&record.artist_row())
        .map_err(|e| EtlError::from_db(path, e))?;
    tx.insert_song(&record.song_row())
        .map_err(|e| EtlError::from_db(path, e))?;

    Ok(SongLoadStats {
        files: 1,
        songs: 1,
        artists: 1,
    })
}

pub fn load_song_data(warehouse: &mut Warehouse, dir: &Path) -> EtlResult<SongLoadStats> {
    let stats = process_data(warehouse, dir, process_song_file)?;
    info!(
        "Song data loaded: {} files, {} songs, {} artists",
        stats.files, stats.songs, stats.artists
    );
    Ok(stats)
}
