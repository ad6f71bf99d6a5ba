//! Shared numeric helpers.
//!
//! Coordinates and crop tolerance ranges are stored as NUMERIC (`Decimal`),
//! while snapshots and service payloads are plain `f64`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convert an Option<Decimal> to Option<f64>.
pub(crate) fn opt_dec_to_f64(d: Option<Decimal>) -> Option<f64> {
    d.and_then(|v| v.to_f64())
}

/// Arithmetic mean of the finite values in `samples`.
///
/// `None` samples (gaps in an upstream series) and non-finite values are
/// skipped. Returns `None` when nothing usable remains.
pub(crate) fn mean(samples: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = samples
        .iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
