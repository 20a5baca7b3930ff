/// Currency units charged per second of charging.
pub const RATE_PER_SECOND: f64 = 0.5;

/// Bill for a session that lasted `elapsed_seconds`. No rounding or clamping.
pub fn session_cost(elapsed_seconds: f64) -> f64 {
    elapsed_seconds * RATE_PER_SECOND
}
