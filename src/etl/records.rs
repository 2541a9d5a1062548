//! Input records as they appear in the fixture files.

use crate::warehouse::{ArtistRow, Gender, Level, SongMatch, SongRow, SongplayRow, UserRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// `page` value of events that played a song.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// One song metadata file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    /// Present in the dataset, not loaded.
    #[serde(default)]
    pub num_songs: Option<u32>,
    pub artist_id: String,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub artist_location: Option<String>,
    pub artist_name: String,
    pub song_id: String,
    pub title: String,
    pub duration: f64,
    pub year: i32,
}

impl SongRecord {
    pub fn artist_row(&self) -> ArtistRow {
        ArtistRow {
            artist_id: self.artist_id.clone(),
            name: self.artist_name.clone(),
            location: self.artist_location.clone(),
            latitude: self.artist_latitude,
            longitude: self.artist_longitude,
        }
    }

    pub fn song_row(&self) -> SongRow {
        SongRow {
            song_id: self.song_id.clone(),
            title: self.title.clone(),
            artist_id: self.artist_id.clone(),
            year: self.year,
            duration: self.duration,
        }
    }
}

/// One line of an event-stream file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub artist: Option<String>,
    pub auth: Option<String>,
    pub first_name: Option<String>,
    pub gender: Option<Gender>,
    pub item_in_session: Option<i64>,
    pub last_name: Option<String>,
    /// Seconds, compared verbatim against `songs.duration`.
    pub length: Option<f64>,
    pub level: Option<Level>,
    pub location: Option<String>,
    pub method: Option<String>,
    pub page: String,
    pub registration: Option<f64>,
    pub session_id: i64,
    pub song: Option<String>,
    pub status: Option<i64>,
    /// Epoch milliseconds.
    pub ts: i64,
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<String>,
}

/// Dumps write `userId` both as a string and as a number; logged-out events
/// carry an empty string.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUserId {
        Text(String),
        Number(i64),
    }

    Ok(
        match Option::<RawUserId>::deserialize(deserializer)? {
            Some(RawUserId::Text(s)) if s.trim().is_empty() => None,
            Some(RawUserId::Text(s)) => Some(s),
            Some(RawUserId::Number(n)) => Some(n.to_string()),
            None => None,
        },
    )
}

impl LogEvent {
    pub fn is_song_play(&self) -> bool {
        self.page == NEXT_SONG_PAGE
    }

    /// `(song, artist, length)` to resolve against the song dimension, if the
    /// event carries all three.
    pub fn lookup_key(&self) -> Option<(&str, &str, f64)> {
        match (&self.song, &self.artist, self.length) {
            (Some(song), Some(artist), Some(length)) => {
                Some((song.as_str(), artist.as_str(), length))
            }
            _ => None,
        }
    }

    pub fn user_row(&self) -> Result<UserRow, String> {
        let user_id = self
            .user_id
            .clone()
            .ok_or_else(|| format!("{} event at ts {} has no userId", self.page, self.ts))?;
        let level = self
            .level
            .ok_or_else(|| format!("{} event at ts {} has no level", self.page, self.ts))?;
        Ok(UserRow {
            user_id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender,
            level,
        })
    }

    pub fn songplay_row(
        &self,
        start_time: DateTime<Utc>,
        user: &UserRow,
        song_match: Option<SongMatch>,
    ) -> SongplayRow {
        let (song_id, artist_id) = match song_match {
            Some(m) => (Some(m.song_id), Some(m.artist_id)),
            None => (None, None),
        };
        SongplayRow {
            start_time,
            user_id: user.user_id.clone(),
            level: user.level,
            song_id,
            artist_id,
            session_id: self.session_id,
            location: self.location.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}
