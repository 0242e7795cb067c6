//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per vibe-server endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Vibe Endpoints
    // ========================================================================

    /// Reports a play of `track_id` at (lat, lon)
    pub async fn post_vibe(
        &self,
        lat: f64,
        lon: f64,
        track_id: &str,
        artist_id: &str,
        genre: Option<&str>,
        popularity: i64,
    ) -> Response {
        self.post_vibe_json(json!({
            "lat": lat,
            "lon": lon,
            "track": {
                "external_id": track_id,
                "title": format!("Title of {}", track_id),
                "album": "Some Album",
                "popularity": popularity,
                "genre": genre,
                "artist": {
                    "external_id": artist_id,
                    "name": format!("Name of {}", artist_id),
                },
            },
        }))
        .await
    }

    pub async fn post_vibe_json(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/api/vibe", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Post vibe request failed")
    }

    /// Trending query around a point, optionally split in a grid
    pub async fn get_vibes_around(&self, lat: f64, lon: f64, divisions: Option<u32>) -> Response {
        let mut query = vec![("lat", lat.to_string()), ("lon", lon.to_string())];
        if let Some(divisions) = divisions {
            query.push(("divisions", divisions.to_string()));
        }
        self.get_vibes(&query).await
    }

    pub async fn get_vibes(&self, query: &[(&str, String)]) -> Response {
        self.client
            .get(format!("{}/api/vibe", self.base_url))
            .query(query)
            .send()
            .await
            .expect("Get vibes request failed")
    }
}
