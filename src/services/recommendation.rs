//! Recommendation pipeline.
//!
//! Sequences location lookup, snapshot construction, optional live weather,
//! prediction and reconciliation, then persists one audit record. The cached
//! and live entry points share `run` and differ only in how weather is sourced.

use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::{Location, NewRecommendation, Season};
use crate::db::store::{CropStore, LocationStore, RecommendationStore};
use crate::errors::AppError;
use crate::services::geocoding::CoordinateResolver;
use crate::services::live_weather::LiveWeatherClient;
use crate::services::prediction::{PredictionClient, PredictionRequest};
use crate::services::reconcile::{reconcile, RecommendationEntry};
use crate::services::snapshot::{
    soil_snapshot, stored_weather_snapshot, EnvironmentalSnapshot, WeatherSnapshot,
};

const LOCATION_NOT_FOUND: &str =
    "Location data not found. Please ensure data has been processed for this district.";
const MISSING_FIELDS: &str = "State, district, and season are required";

/// One pipeline invocation.
#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    pub user_id: Uuid,
    pub state: String,
    pub district: String,
    pub season: String,
    pub use_realtime_weather: bool,
}

/// Result envelope shared by both entry points.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOutcome {
    pub recommendation_id: Uuid,
    pub recommendations: Vec<RecommendationEntry>,
    pub environmental_snapshot: EnvironmentalSnapshot,
}

#[derive(Clone)]
pub struct RecommendationPipeline {
    locations: Arc<dyn LocationStore>,
    crops: Arc<dyn CropStore>,
    records: Arc<dyn RecommendationStore>,
    resolver: CoordinateResolver,
    weather: LiveWeatherClient,
    predictor: PredictionClient,
}

impl RecommendationPipeline {
    pub fn new(
        locations: Arc<dyn LocationStore>,
        crops: Arc<dyn CropStore>,
        records: Arc<dyn RecommendationStore>,
        resolver: CoordinateResolver,
        weather: LiveWeatherClient,
        predictor: PredictionClient,
    ) -> Self {
        Self {
            locations,
            crops,
            records,
            resolver,
            weather,
            predictor,
        }
    }

    /// Recommendations computed from the district's stored weather means.
    pub async fn get_cached_recommendations(
        &self,
        user_id: Uuid,
        state: &str,
        district: &str,
        season: &str,
    ) -> Result<RecommendationOutcome, AppError> {
        self.run(RecommendationRequest {
            user_id,
            state: state.to_string(),
            district: district.to_string(),
            season: season.to_string(),
            use_realtime_weather: false,
        })
        .await
    }

    /// Recommendations computed from live weather at the district's coordinates.
    pub async fn get_live_recommendations(
        &self,
        user_id: Uuid,
        state: &str,
        district: &str,
        season: &str,
    ) -> Result<RecommendationOutcome, AppError> {
        self.run(RecommendationRequest {
            user_id,
            state: state.to_string(),
            district: district.to_string(),
            season: season.to_string(),
            use_realtime_weather: true,
        })
        .await
    }

    /// Run the pipeline end to end.
    ///
    /// Exactly one record is persisted on success. Any failure before the
    /// final write leaves the store untouched.
    pub async fn run(&self, request: RecommendationRequest) -> Result<RecommendationOutcome, AppError> {
        let (state, district, season) = validate(&request)?;
        tracing::info!(
            "Recommendation run for {}, {} ({}), live weather: {}",
            district,
            state,
            season,
            request.use_realtime_weather
        );

        let location = self
            .locations
            .find_by_state_district(&state, &district)
            .await?
            .ok_or_else(|| AppError::NotFound(LOCATION_NOT_FOUND.to_string()))?;

        let soil = soil_snapshot(&location);
        let weather = if request.use_realtime_weather {
            self.live_weather(&location, &state, &district).await?
        } else {
            stored_weather_snapshot(&location)
        };
        let snapshot = EnvironmentalSnapshot { soil, weather };

        let predictions = self
            .predictor
            .predict(&PredictionRequest {
                state: state.clone(),
                district: district.clone(),
                season,
                soil,
                weather,
            })
            .await?;
        if predictions.is_empty() {
            tracing::warn!(
                "Prediction service returned no candidates for {}, {}",
                district,
                state
            );
        }

        let entries = reconcile(predictions, self.crops.as_ref()).await?;

        let record = self
            .records
            .create(NewRecommendation {
                user_id: request.user_id,
                state,
                district,
                season,
                recommendations: entries,
                environmental_snapshot: snapshot,
            })
            .await?;

        tracing::info!(
            "Stored recommendation {} with {} entries",
            record.id,
            record.recommendations.0.len()
        );

        Ok(RecommendationOutcome {
            recommendation_id: record.id,
            recommendations: record.recommendations.0,
            environmental_snapshot: record.environmental_snapshot.0,
        })
    }

    async fn live_weather(
        &self,
        location: &Location,
        state: &str,
        district: &str,
    ) -> Result<WeatherSnapshot, AppError> {
        let coords = self.resolver.resolve(location, state, district).await?;
        self.weather.fetch(coords).await
    }
}

/// Trimmed state and district plus the parsed season.
fn validate(request: &RecommendationRequest) -> Result<(String, String, Season), AppError> {
    let state = request.state.trim();
    let district = request.district.trim();
    let season = request.season.trim();

    if state.is_empty() || district.is_empty() || season.is_empty() {
        return Err(AppError::Validation(MISSING_FIELDS.to_string()));
    }

    let season: Season = season.parse().map_err(AppError::Validation)?;
    Ok((state.to_string(), district.to_string(), season))
}
