//! Coordinate resolution for districts.
//!
//! Stored coordinates win; otherwise the district name is looked up with the
//! Open-Meteo geocoding API.
//! See: https://open-meteo.com/en/docs/geocoding-api

use serde::Deserialize;
use std::time::Duration;

use crate::db::models::Location;
use crate::errors::AppError;
use crate::helpers::opt_dec_to_f64;

const GEOCODING_SEARCH_PATH: &str = "/v1/search";

/// A resolved latitude/longitude pair (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

// --- Open-Meteo geocoding JSON response types ---

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    /// Omitted entirely by the API when nothing matches.
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: Option<String>,
}

/// Resolves usable coordinates for a location.
#[derive(Debug, Clone)]
pub struct CoordinateResolver {
    client: reqwest::Client,
    base_url: String,
    country_code: String,
    language: String,
}

impl CoordinateResolver {
    pub fn new(
        base_url: &str,
        country_code: &str,
        language: &str,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to build geocoding client: {}", e))
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            country_code: country_code.to_string(),
            language: language.to_string(),
        })
    }

    /// Coordinates for `location`, geocoding `district` only when the
    /// location lacks a stored latitude/longitude pair.
    pub async fn resolve(
        &self,
        location: &Location,
        state: &str,
        district: &str,
    ) -> Result<Coordinates, AppError> {
        if let (Some(latitude), Some(longitude)) = (
            opt_dec_to_f64(location.latitude),
            opt_dec_to_f64(location.longitude),
        ) {
            return Ok(Coordinates {
                latitude,
                longitude,
            });
        }

        tracing::debug!(
            "No stored coordinates for {}, {}; geocoding district name",
            district,
            state
        );
        self.geocode(state, district).await
    }

    async fn geocode(&self, state: &str, district: &str) -> Result<Coordinates, AppError> {
        let url = format!("{}{}", self.base_url, GEOCODING_SEARCH_PATH);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", district),
                ("count", "1"),
                ("language", self.language.as_str()),
                ("format", "json"),
                ("countryCode", self.country_code.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timed out" } else { "failed" };
                AppError::UpstreamResolution(format!(
                    "Geocoding request for {}, {} {}: {}",
                    district, state, kind, e
                ))
            })?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamResolution(format!(
                "Geocoding service returned HTTP {} for {}, {}",
                response.status(),
                district,
                state
            )));
        }

        let body: GeocodingResponse = response.json().await.map_err(|e| {
            AppError::UpstreamResolution(format!("Geocoding response parse error: {}", e))
        })?;

        let best = body.results.into_iter().next().ok_or_else(|| {
            AppError::UpstreamResolution(format!(
                "Could not resolve coordinates for {}, {}",
                district, state
            ))
        })?;

        tracing::debug!(
            "Geocoded {} as {} ({:.4}, {:.4})",
            district,
            best.name.as_deref().unwrap_or("?"),
            best.latitude,
            best.longitude
        );

        Ok(Coordinates {
            latitude: best.latitude,
            longitude: best.longitude,
        })
    }
}
