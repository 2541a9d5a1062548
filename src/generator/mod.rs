//! Synthetic fixture generator.
//!
//! Writes one metadata document per song under `song_data/` and a single
//! JSON-lines event file under `log_data/`. About half of the playback events
//! copy title, artist name and duration from a generated song so that the
//! loader's lookup finds them; the rest name songs that do not exist.

use crate::config::GeneratorSettings;
use crate::etl::{LogEvent, SongRecord, NEXT_SONG_PAGE};
use crate::warehouse::{Gender, Level};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const EVENT_INTERVAL_MS: i64 = 60_000;
const UNKNOWN_SONG_LENGTH: f64 = 200.0;
const NUM_USERS: u32 = 10;
const NUM_NAMES: u32 = 5;
const NON_SONG_PAGES: [&str; 4] = ["Home", "Login", "Logout", "Settings"];
const LOCATION: &str = "San Francisco-Oakland-Hayward, CA";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4)";
const REGISTRATION: f64 = 1540000000000.0;
const SESSION_ID: i64 = 123;

#[derive(Debug)]
pub struct GeneratedData {
    pub songs: Vec<SongRecord>,
    pub events: Vec<LogEvent>,
    pub song_files: Vec<PathBuf>,
    pub log_path: PathBuf,
}

impl GeneratedData {
    pub fn song_play_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_song_play()).count()
    }
}

fn new_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

fn event_timestamp(start_ms: i64, i: usize) -> Option<i64> {
    i64::try_from(i)
        .ok()?
        .checked_mul(EVENT_INTERVAL_MS)?
        .checked_add(start_ms)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Six decimals is about 10 cm on the ground.
fn round_coordinate(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn generate_song(rng: &mut impl Rng, i: usize) -> SongRecord {
    SongRecord {
        num_songs: Some(1),
        artist_id: format!("ARTIST_{}", i),
        artist_latitude: Some(round_coordinate(rng.random_range(-90.0..90.0))),
        artist_longitude: Some(round_coordinate(rng.random_range(-180.0..180.0))),
        artist_location: Some(format!("City_{}", i)),
        artist_name: format!("Artist_{}", i),
        song_id: format!("SONG_{}", i),
        title: format!("Song_Title_{}", i),
        duration: round_to_cents(rng.random_range(120.0..300.0)),
        year: rng.random_range(1990..=2024),
    }
}

fn generate_event(
    rng: &mut impl Rng,
    songs: &[SongRecord],
    i: usize,
    ts: i64,
    non_song_page_ratio: f64,
) -> LogEvent {
    let is_song_play = !rng.random_bool(non_song_page_ratio);

    let (page, song, artist, length, method) = if is_song_play {
        let known = if rng.random_bool(0.5) {
            songs.choose(rng)
        } else {
            None
        };
        let (title, artist, length) = match known {
            Some(s) => (s.title.clone(), s.artist_name.clone(), s.duration),
            None => (
                format!("Random_Song_{}", i),
                format!("Random_Artist_{}", i),
                UNKNOWN_SONG_LENGTH,
            ),
        };
        (NEXT_SONG_PAGE, Some(title), Some(artist), Some(length), "PUT")
    } else {
        let page = NON_SONG_PAGES.choose(rng).copied().unwrap_or("Home");
        (page, None, None, None, "GET")
    };

    LogEvent {
        artist,
        auth: Some("Logged In".to_string()),
        first_name: Some(format!("UserFirst_{}", rng.random_range(1..=NUM_NAMES))),
        gender: Some(if rng.random_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        }),
        item_in_session: Some(i as i64),
        last_name: Some(format!("UserLast_{}", rng.random_range(1..=NUM_NAMES))),
        length,
        level: Some(if rng.random_bool(0.5) {
            Level::Free
        } else {
            Level::Paid
        }),
        location: Some(LOCATION.to_string()),
        method: Some(method.to_string()),
        page: page.to_string(),
        registration: Some(REGISTRATION),
        session_id: SESSION_ID,
        song,
        status: Some(200),
        ts,
        user_agent: Some(USER_AGENT.to_string()),
        user_id: Some(rng.random_range(1..=NUM_USERS).to_string()),
    }
}

fn write_song_file(path: &Path, song: &SongRecord) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, song)?;
    writer.flush()?;
    Ok(())
}

fn write_log_file(path: &Path, events: &[LogEvent]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Generates and writes a fixture set under `data_dir`.
pub fn generate(settings: &GeneratorSettings, data_dir: &Path) -> Result<GeneratedData> {
    if !(0.0..=1.0).contains(&settings.non_song_page_ratio) {
        bail!(
            "non_song_page_ratio must be between 0 and 1, got {}",
            settings.non_song_page_ratio
        );
    }

    let start_ms = settings
        .start_time_ms
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let start: DateTime<Utc> = DateTime::from_timestamp_millis(start_ms)
        .with_context(|| format!("start_time_ms {} is out of range", start_ms))?;

    if settings.num_log_entries > 0 {
        let last_ms = event_timestamp(start_ms, settings.num_log_entries - 1)
            .filter(|ts| DateTime::from_timestamp_millis(*ts).is_some());
        if last_ms.is_none() {
            bail!(
                "{} log entries starting at {} run past the supported time range",
                settings.num_log_entries,
                start_ms
            );
        }
    }

    let song_dir = data_dir.join("song_data");
    let log_dir = data_dir.join("log_data");
    fs::create_dir_all(&song_dir).with_context(|| format!("Cannot create {:?}", song_dir))?;
    fs::create_dir_all(&log_dir).with_context(|| format!("Cannot create {:?}", log_dir))?;
    info!(
        "Created directories: {} and {}",
        song_dir.display(),
        log_dir.display()
    );

    let mut rng = new_rng(settings.seed);

    info!("Generating {} songs...", settings.num_songs);
    let mut songs = Vec::with_capacity(settings.num_songs);
    let mut song_files = Vec::with_capacity(settings.num_songs);
    for i in 0..settings.num_songs {
        let song = generate_song(&mut rng, i);
        let path = song_dir.join(format!("song_{}.json", i));
        write_song_file(&path, &song)?;
        songs.push(song);
        song_files.push(path);
    }

    info!("Generating {} log entries...", settings.num_log_entries);
    let mut events = Vec::with_capacity(settings.num_log_entries);
    for i in 0..settings.num_log_entries {
        let ts = event_timestamp(start_ms, i)
            .with_context(|| format!("Timestamp of event {} overflows", i))?;
        events.push(generate_event(
            &mut rng,
            &songs,
            i,
            ts,
            settings.non_song_page_ratio,
        ));
    }

    let log_path = log_dir.join(format!("{}-events.json", start.format("%Y-%m-%d")));
    write_log_file(&log_path, &events)?;

    let data = GeneratedData {
        songs,
        events,
        song_files,
        log_path,
    };
    info!(
        "Wrote {} song files and {} events ({} song plays) to {}",
        data.song_files.len(),
        data.events.len(),
        data.song_play_count(),
        data.log_path.display()
    );
    Ok(data)
}
