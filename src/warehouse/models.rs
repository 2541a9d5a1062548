//! Row types of the star schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Textual form of `start_time` keys. Sorts chronologically.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn format_start_time(start_time: &DateTime<Utc>) -> String {
    start_time.format(START_TIME_FORMAT).to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Level::Free),
            "paid" => Some(Level::Paid),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtistRow {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SongRow {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    /// Seconds.
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UserRow {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub level: Level,
}

/// Calendar breakdown of a play's start instant (UTC).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeRow {
    pub start_time: DateTime<Utc>,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// Monday = 0 ... Sunday = 6.
    pub weekday: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SongplayRow {
    pub start_time: DateTime<Utc>,
    pub user_id: String,
    pub level: Level,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Keys resolved for a play by the song/artist lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}
