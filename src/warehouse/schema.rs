//! Star schema of the warehouse: four dimension tables and the `songplays`
//! fact table. Tables are listed parents first.

use crate::sqlite_column;
use crate::sqlite_persistence::{ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema};

// =============================================================================
// Foreign keys
// =============================================================================

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "artist_id",
    on_delete: ForeignKeyOnChange::NoAction,
};

const SONG_FK: ForeignKey = ForeignKey {
    foreign_table: "songs",
    foreign_column: "song_id",
    on_delete: ForeignKeyOnChange::NoAction,
};

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "users",
    foreign_column: "user_id",
    on_delete: ForeignKeyOnChange::NoAction,
};

const TIME_FK: ForeignKey = ForeignKey {
    foreign_table: "time",
    foreign_column: "start_time",
    on_delete: ForeignKeyOnChange::NoAction,
};

// =============================================================================
// Dimension tables
// =============================================================================

pub const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("latitude", &SqlType::Real),
        sqlite_column!("longitude", &SqlType::Real),
    ],
    indices: &[("idx_artists_name", "name")],
};

pub const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("song_id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("duration", &SqlType::Real, non_null = true), // seconds
    ],
    indices: &[("idx_songs_title", "title")],
};

pub const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("user_id", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("first_name", &SqlType::Text),
        sqlite_column!("last_name", &SqlType::Text),
        sqlite_column!("gender", &SqlType::Text), // 'M', 'F'
        sqlite_column!("level", &SqlType::Text, non_null = true), // 'free', 'paid'
    ],
    indices: &[],
};

pub const TIME_TABLE: Table = Table {
    name: "time",
    columns: &[
        // 'YYYY-MM-DD HH:MM:SS.mmm', UTC
        sqlite_column!("start_time", &SqlType::Text, is_primary_key = true, non_null = true),
        sqlite_column!("hour", &SqlType::Integer, non_null = true),
        sqlite_column!("day", &SqlType::Integer, non_null = true),
        sqlite_column!("week", &SqlType::Integer, non_null = true),
        sqlite_column!("month", &SqlType::Integer, non_null = true),
        sqlite_column!("year", &SqlType::Integer, non_null = true),
        sqlite_column!("weekday", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
};

// =============================================================================
// Fact table
// =============================================================================

pub const SONGPLAYS_TABLE: Table = Table {
    name: "songplays",
    columns: &[
        sqlite_column!("songplay_id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "start_time",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&TIME_FK)
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("level", &SqlType::Text, non_null = true),
        sqlite_column!("song_id", &SqlType::Text, foreign_key = Some(&SONG_FK)),
        sqlite_column!("artist_id", &SqlType::Text, foreign_key = Some(&ARTIST_FK)),
        sqlite_column!("session_id", &SqlType::Integer, non_null = true),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("user_agent", &SqlType::Text),
    ],
    indices: &[
        ("idx_songplays_user", "user_id"),
        ("idx_songplays_start_time", "start_time"),
    ],
};

pub const WAREHOUSE_SCHEMA: VersionedSchema = VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        SONGS_TABLE,
        USERS_TABLE,
        TIME_TABLE,
        SONGPLAYS_TABLE,
    ],
};
