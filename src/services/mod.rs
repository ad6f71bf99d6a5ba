pub mod geocoding;
pub mod live_weather;
pub mod prediction;
pub mod reconcile;
pub mod recommendation;
pub mod snapshot;
