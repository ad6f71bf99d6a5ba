//! Reconciliation of predicted crop names against the crop catalog.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::store::CropStore;
use crate::errors::AppError;
use crate::services::prediction::{EnvironmentalFactors, PredictedCrop, YieldPrediction};

/// One ranked crop in a recommendation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationEntry {
    /// Catalog crop id; null when the predicted name is not in the catalog
    pub crop: Option<Uuid>,
    pub crop_name: String,
    /// 0-100
    pub suitability_score: f64,
    pub yield_prediction: YieldPrediction,
    pub explanation: String,
    pub environmental_factors: EnvironmentalFactors,
}

/// Attach catalog references to predictions.
///
/// Lookups run concurrently; the result has one entry per prediction, in
/// prediction order.
pub async fn reconcile(
    predictions: Vec<PredictedCrop>,
    crops: &dyn CropStore,
) -> Result<Vec<RecommendationEntry>, AppError> {
    let lookups = predictions.iter().map(|p| crops.find_by_name(&p.crop_name));
    let matches = futures::future::try_join_all(lookups).await?;

    Ok(predictions
        .into_iter()
        .zip(matches)
        .map(|(prediction, crop)| {
            if crop.is_none() {
                tracing::debug!("Predicted crop '{}' not in catalog", prediction.crop_name);
            }
            shape_entry(prediction, crop.map(|c| c.id))
        })
        .collect())
}

fn shape_entry(prediction: PredictedCrop, crop: Option<Uuid>) -> RecommendationEntry {
    let score = prediction.suitability_score;
    let suitability_score = if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    };
    if suitability_score != score {
        tracing::warn!(
            "Suitability score {} for '{}' out of range, clamped to {}",
            score,
            prediction.crop_name,
            suitability_score
        );
    }

    let explanation = if prediction.explanation.trim().is_empty() {
        format!(
            "{} was ranked by the prediction service for your location.",
            prediction.crop_name
        )
    } else {
        prediction.explanation
    };

    RecommendationEntry {
        crop,
        crop_name: prediction.crop_name,
        suitability_score,
        yield_prediction: prediction.yield_prediction,
        explanation,
        environmental_factors: prediction.environmental_factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::memory::MemoryStore;
    use std::time::Duration;

    fn prediction(name: &str, score: f64) -> PredictedCrop {
        PredictedCrop {
            crop_name: name.to_string(),
            suitability_score: score,
            yield_prediction: YieldPrediction {
                min: 800.0,
                max: 1200.0,
                expected: 1000.0,
            },
            explanation: format!("{} is suitable for your location.", name),
            environmental_factors: EnvironmentalFactors {
                soil_match: 80.0,
                weather_match: 75.0,
                historical_yield: 70.0,
            },
        }
    }

    #[tokio::test]
    async fn test_order_preserved_regardless_of_lookup_latency() {
        // A resolves slowest, C fastest.
        let store = MemoryStore::default()
            .with_crop("A")
            .with_crop("B")
            .with_crop("C")
            .with_crop_delay("A", Duration::from_millis(60))
            .with_crop_delay("B", Duration::from_millis(30));

        let entries = reconcile(
            vec![
                prediction("A", 90.0),
                prediction("B", 80.0),
                prediction("C", 70.0),
            ],
            &store,
        )
        .await
        .unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.crop_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(entries[0].crop, store.crop_id("A"));
        assert_eq!(entries[2].crop, store.crop_id("C"));
    }

    #[tokio::test]
    async fn test_missing_catalog_match_keeps_entry() {
        let store = MemoryStore::default().with_crop("Rice");

        let entries = reconcile(
            vec![
                prediction("Quinoa", 85.0),
                prediction("Rice", 80.0),
                prediction("Teff", 60.0),
            ],
            &store,
        )
        .await
        .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].crop, None);
        assert_eq!(entries[0].crop_name, "Quinoa");
        assert_eq!(entries[1].crop, store.crop_id("Rice"));
        assert_eq!(entries[2].crop, None);
        assert_eq!(entries[2].crop_name, "Teff");
    }

    #[tokio::test]
    async fn test_lookup_is_exact_name_match() {
        let store = MemoryStore::default().with_crop("Rice");
        let entries = reconcile(vec![prediction("rice", 50.0)], &store)
            .await
            .unwrap();
        assert_eq!(entries[0].crop, None);
    }

    #[tokio::test]
    async fn test_empty_predictions() {
        let store = MemoryStore::default();
        let entries = reconcile(Vec::new(), &store).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = MemoryStore::default().failing_crop_lookups();
        let err = reconcile(vec![prediction("Rice", 50.0)], &store)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[test]
    fn test_shape_entry_clamps_score() {
        assert_eq!(shape_entry(prediction("Rice", 104.2), None).suitability_score, 100.0);
        assert_eq!(shape_entry(prediction("Rice", -3.0), None).suitability_score, 0.0);
        assert_eq!(shape_entry(prediction("Rice", f64::NAN), None).suitability_score, 0.0);
        assert_eq!(shape_entry(prediction("Rice", 64.5), None).suitability_score, 64.5);
    }

    #[test]
    fn test_shape_entry_fills_empty_explanation() {
        let mut p = prediction("Jowar", 70.0);
        p.explanation = "  ".to_string();
        let entry = shape_entry(p, None);
        assert!(entry.explanation.starts_with("Jowar"));
    }

    #[test]
    fn test_entry_serializes_null_crop() {
        let entry = shape_entry(prediction("Jowar", 70.0), None);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json["crop"].is_null());
        assert_eq!(json["cropName"], "Jowar");
        assert_eq!(json["environmentalFactors"]["soilMatch"], 80.0);
    }
}
