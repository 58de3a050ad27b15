pub const DEFAULT_MAX_CATEGORIES: usize = 20;
pub const DEFAULT_MIN_CATEGORIES: usize = 2;
pub const DEFAULT_N_BINS: usize = 5;
pub const DEFAULT_LIFT_FRACTION: f64 = 0.1;
/// Saturating value returned by `logodds` for rates of exactly 0 or 1.
pub const LOGODDS_CLAMP: f64 = 10.0;
pub const MARGIN_NAME: &str = "All";
pub const DEFAULT_PERCENTILES: [f64; 5] = [10.0, 25.0, 50.0, 75.0, 90.0];
pub const LIFT_CURVE_STEPS: usize = 10;
