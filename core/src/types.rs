//! Shared primitive types used across the analytics crate.

/// A PaySim time step. One step = one hour of simulated time.
pub type Step = i64;

/// A customer identifier as it appears in the source data (`nameOrig` / `nameDest`).
pub type CustomerId = String;

/// Store-assigned transaction identity, 1-based in ingestion order.
pub type TxnId = i64;

/// The identifier of one report run.
pub type RunId = String;

/// Round `value` to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
