//! SQLite-backed vibe store.
//!
//! Writes go through a single connection; reads are spread round-robin over
//! a small pool of read-only connections so concurrent scans don't queue
//! behind ingestion.

use super::models::*;
use super::schema::VIBE_VERSIONED_SCHEMAS;
use super::trait_def::VibeStore;
use crate::geo::BoundingBox;
use crate::sqlite_persistence::create_or_migrate;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OpenFlags, Transaction};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Clone)]
pub struct SqliteVibeStore {
    write_conn: Arc<Mutex<Connection>>,
    read_pool: Vec<Arc<Mutex<Connection>>>,
    read_index: Arc<AtomicUsize>,
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| anyhow!("Vibe db connection mutex poisoned"))
}

impl SqliteVibeStore {
    /// Open (or create) the vibe database at `db_path`.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `read_pool_size` - Number of read-only connections, at least 1
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open vibe database {:?}", db_path))?;

        let version = create_or_migrate(&mut write_conn, VIBE_VERSIONED_SCHEMAS)?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", "ON")?;
        info!("Vibe db at {:?} is at schema version {}", db_path, version);

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .context("Failed to open read-only vibe db connection")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteVibeStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn upsert_genre(tx: &Transaction, name: &str) -> Result<i64> {
        tx.execute(
            "INSERT INTO genres (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        Ok(tx.query_row(
            "SELECT id FROM genres WHERE name = ?1",
            params![name],
            |r| r.get(0),
        )?)
    }

    fn upsert_artist(tx: &Transaction, artist: &ArtistReport) -> Result<i64> {
        tx.execute(
            "INSERT INTO artists (external_id, name) VALUES (?1, ?2)
             ON CONFLICT(external_id) DO UPDATE SET name = excluded.name",
            params![artist.external_id, artist.name],
        )?;
        Ok(tx.query_row(
            "SELECT id FROM artists WHERE external_id = ?1",
            params![artist.external_id],
            |r| r.get(0),
        )?)
    }

    /// Returns the track id and the genre it is filed under after the upsert.
    ///
    /// Fields a repeat report leaves out keep their stored values. An untagged
    /// repeat keeps the stored genre.
    fn upsert_track(
        tx: &Transaction,
        report: &VibeReport,
        artist_id: i64,
        genre_id: i64,
    ) -> Result<(i64, i64)> {
        let track = &report.track;
        tx.execute(
            "INSERT INTO tracks (external_id, title, album, artist_id, genre_id, popularity, original_genre)
             VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, 0), ?7)
             ON CONFLICT(external_id) DO UPDATE SET
                title = excluded.title,
                album = COALESCE(excluded.album, album),
                artist_id = excluded.artist_id,
                genre_id = CASE WHEN ?8 THEN excluded.genre_id ELSE genre_id END,
                popularity = COALESCE(?6, popularity),
                original_genre = CASE WHEN ?8 THEN excluded.original_genre ELSE original_genre END",
            params![
                track.external_id,
                track.title,
                track.album,
                artist_id,
                genre_id,
                track.popularity,
                track.genre,
                report.tagged_genre().is_some(),
            ],
        )?;
        Ok(tx.query_row(
            "SELECT id, genre_id FROM tracks WHERE external_id = ?1",
            params![track.external_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
    }

    fn upsert_location(tx: &Transaction, lat: f64, lon: f64) -> Result<i64> {
        tx.execute(
            "INSERT INTO locations (lat, lon) VALUES (?1, ?2) ON CONFLICT(lat, lon) DO NOTHING",
            params![lat, lon],
        )?;
        Ok(tx.query_row(
            "SELECT id FROM locations WHERE lat = ?1 AND lon = ?2",
            params![lat, lon],
            |r| r.get(0),
        )?)
    }

    fn parse_event_row(row: &rusqlite::Row) -> rusqlite::Result<EventRow> {
        let artist_id: i64 = row.get(4)?;
        let genre_id: i64 = row.get(5)?;
        Ok(EventRow {
            track: Track {
                id: row.get(0)?,
                external_id: row.get(1)?,
                title: row.get(2)?,
                album: row.get(3)?,
                artist_id,
                genre_id,
                popularity: row.get(6)?,
                original_genre: row.get(7)?,
            },
            artist: Artist {
                id: artist_id,
                external_id: row.get(8)?,
                name: row.get(9)?,
            },
            genre: Genre {
                id: genre_id,
                name: row.get(10)?,
            },
            lat: row.get(11)?,
            lon: row.get(12)?,
            play_count: row.get(13)?,
            last_seen: row.get(14)?,
        })
    }
}

impl VibeStore for SqliteVibeStore {
    fn record_vibe(&self, report: &VibeReport, seen_at: i64) -> Result<VibeEvent> {
        let mut conn = lock(&self.write_conn)?;
        let tx = conn.transaction()?;

        let genre_id = Self::upsert_genre(&tx, report.genre_name())?;
        let artist_id = Self::upsert_artist(&tx, &report.track.artist)?;
        let (track_id, genre_id) = Self::upsert_track(&tx, report, artist_id, genre_id)?;
        let location_id = Self::upsert_location(&tx, report.lat, report.lon)?;

        // A late report must not move last_seen backwards.
        tx.execute(
            "INSERT INTO vibe_events (location_id, track_id, play_count, last_seen)
             VALUES (?1, ?2, 1, ?3)
             ON CONFLICT(location_id, track_id) DO UPDATE SET
                play_count = play_count + 1,
                last_seen = MAX(last_seen, excluded.last_seen)",
            params![location_id, track_id, seen_at],
        )?;

        let (id, play_count, last_seen): (i64, i64, i64) = tx.query_row(
            "SELECT id, play_count, last_seen FROM vibe_events
             WHERE location_id = ?1 AND track_id = ?2",
            params![location_id, track_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;
        tx.commit().context("Failed to commit vibe report")?;

        debug!(
            "Recorded vibe {} for track {} at ({}, {}), count {}",
            id, report.track.external_id, report.lat, report.lon, play_count
        );

        Ok(VibeEvent {
            id,
            location: Location {
                id: location_id,
                lat: report.lat,
                lon: report.lon,
            },
            track_id,
            artist_id,
            genre_id,
            play_count,
            last_seen,
        })
    }

    fn query_events_in_box(&self, bbox: &BoundingBox, seen_after: i64) -> Result<Vec<EventRow>> {
        let conn = self.get_read_conn();
        let conn = lock(&conn)?;
        let mut stmt = conn.prepare_cached(
            "SELECT t.id, t.external_id, t.title, t.album, t.artist_id, t.genre_id,
                    t.popularity, t.original_genre, a.external_id, a.name, g.name,
                    l.lat, l.lon, e.play_count, e.last_seen
             FROM vibe_events e
             JOIN locations l ON l.id = e.location_id
             JOIN tracks t ON t.id = e.track_id
             JOIN artists a ON a.id = t.artist_id
             JOIN genres g ON g.id = t.genre_id
             WHERE l.lat >= ?1 AND l.lat < ?2
               AND l.lon >= ?3 AND l.lon < ?4
               AND e.last_seen > ?5",
        )?;
        let rows = stmt
            .query_map(
                params![bbox.lat_min, bbox.lat_max, bbox.lon_min, bbox.lon_max, seen_after],
                Self::parse_event_row,
            )?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read events in {}", bbox))?;
        Ok(rows)
    }

    fn prune_events_older_than(&self, cutoff: i64) -> Result<usize> {
        let conn = lock(&self.write_conn)?;
        let removed = conn.execute(
            "DELETE FROM vibe_events WHERE last_seen < ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }

    fn get_counts(&self) -> Result<StoreCounts> {
        let conn = self.get_read_conn();
        let conn = lock(&conn)?;
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
                r.get(0)
            })?;
            Ok(n as usize)
        };
        Ok(StoreCounts {
            genres: count("genres")?,
            artists: count("artists")?,
            tracks: count("tracks")?,
            locations: count("locations")?,
            events: count("vibe_events")?,
        })
    }
}
