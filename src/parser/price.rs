/// Prices above this are read as cents per litre.
const CENTS_THRESHOLD: f64 = 10.0;

/// Normalize a raw litre price to dollars. Table posts quote cents (`162.1`),
/// prose quotes dollars (`$1.659`); nothing realistic sits above $10/L.
pub fn normalize(value: f64) -> f64 {
    if value > CENTS_THRESHOLD {
        value / 100.0
    } else {
        value
    }
}
