use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Direction, FuelSlot, FuelType, Slots};

static NO_CHANGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bno[\s-]change\b").unwrap());
static UP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bup\b|increase|higher|rise|raising").unwrap());
static DOWN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdown\b|decrease|lower|drop|fall|reduc").unwrap());
static DOLLAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$(\d+\.\d{2,3})").unwrap());
static DIESEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bdiesel\b").unwrap());

/// Fallback for posts without a table: infer one slot from prose.
///
/// Always fills a slot; with no signal its fields are all `None`.
pub fn extract(text: &str) -> Slots {
    let direction = infer_direction(text);
    let price = infer_price(text);

    let mut slots = Slots::default();
    let fuel = if DIESEL_RE.is_match(text) {
        FuelType::Diesel
    } else {
        FuelType::Gas
    };
    slots.set(
        fuel,
        FuelSlot {
            direction,
            adjustment: None,
            price,
        },
    );
    slots
}

fn infer_direction(text: &str) -> Option<Direction> {
    if NO_CHANGE_RE.is_match(text) {
        return Some(Direction::NoChange);
    }
    let mut direction = None;
    if UP_RE.is_match(text) {
        direction = Some(Direction::Up);
    }
    // Down-family wins a tie with up-family.
    if DOWN_RE.is_match(text) {
        direction = Some(Direction::Down);
    }
    direction
}

/// "current → predicted": with two or more amounts the second is the prediction.
fn infer_price(text: &str) -> Option<f64> {
    let amounts: Vec<f64> = DOLLAR_RE
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<f64>().ok())
        .take(2)
        .collect();
    match amounts.as_slice() {
        [_, second] => Some(*second),
        [only] => Some(*only),
        _ => None,
    }
}
