//! SQLite schema of the vibe database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, ForeignKey, OnDelete, SqlType, Table, VersionedSchema};

const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("external_id", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["external_id"]],
};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: OnDelete::Restrict,
};

const GENRE_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "id",
    on_delete: OnDelete::Restrict,
};

const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("external_id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("album", &SqlType::Text),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!(
            "genre_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&GENRE_FK)
        ),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("original_genre", &SqlType::Text),
    ],
    indices: &[
        ("idx_tracks_artist", "artist_id"),
        ("idx_tracks_genre", "genre_id"),
    ],
    unique_constraints: &[&["external_id"]],
};

const LOCATIONS_TABLE: Table = Table {
    name: "locations",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("lat", &SqlType::Real, non_null = true),
        sqlite_column!("lon", &SqlType::Real, non_null = true),
    ],
    indices: &[("idx_locations_lat_lon", "lat, lon")],
    unique_constraints: &[&["lat", "lon"]],
};

const LOCATION_FK: ForeignKey = ForeignKey {
    foreign_table: "locations",
    foreign_column: "id",
    on_delete: OnDelete::Cascade,
};

const TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "id",
    on_delete: OnDelete::Cascade,
};

/// One row per (location, track), counting plays.
const VIBE_EVENTS_TABLE: Table = Table {
    name: "vibe_events",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "location_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&LOCATION_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!(
            "play_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!("last_seen", &SqlType::Integer, non_null = true), // epoch millis
    ],
    indices: &[
        ("idx_vibe_events_last_seen", "last_seen"),
        ("idx_vibe_events_track", "track_id"),
    ],
    unique_constraints: &[&["location_id", "track_id"]],
};

pub const VIBE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        GENRES_TABLE,
        ARTISTS_TABLE,
        TRACKS_TABLE,
        LOCATIONS_TABLE,
        VIBE_EVENTS_TABLE,
    ],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = VIBE_VERSIONED_SCHEMAS.last().unwrap();
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn event_pair_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        VIBE_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        conn.execute("INSERT INTO genres (name) VALUES ('jazz')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO artists (external_id, name) VALUES ('a1', 'Artist')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO tracks (external_id, title, artist_id, genre_id, popularity)
             VALUES ('t1', 'Track', 1, 1, 10)",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO locations (lat, lon) VALUES (1.0, 2.0)", [])
            .unwrap();
        conn.execute(
            "INSERT INTO vibe_events (location_id, track_id, last_seen) VALUES (1, 1, 0)",
            [],
        )
        .unwrap();

        let duplicate = conn.execute(
            "INSERT INTO vibe_events (location_id, track_id, last_seen) VALUES (1, 1, 5)",
            [],
        );
        assert!(duplicate.is_err());

        let play_count: i64 = conn
            .query_row("SELECT play_count FROM vibe_events", [], |r| r.get(0))
            .unwrap();
        assert_eq!(play_count, 1);
    }
}
