use std::sync::LazyLock;

use regex::Regex;

use super::{adjustment, price};
use crate::model::{FuelSlot, FuelType, Slots};

// | Regular | UP 3.6 | 162.1 |
static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\|\s*(regular|gasoline|gas|diesel)\s*\|\s*([^|\n]+?)\s*\|\s*(\d+(?:\.\d+)?)\s*(?:\||$)")
        .unwrap()
});

/// Scan for fuel rows. A later row for the same fuel overwrites an earlier one.
pub fn extract(text: &str) -> Slots {
    let mut slots = Slots::default();

    for caps in ROW_RE.captures_iter(text) {
        let Some(fuel) = fuel_for_label(&caps[1]) else {
            continue;
        };
        let Ok(raw_price) = caps[3].parse::<f64>() else {
            continue;
        };
        let adj = adjustment::parse(&caps[2]);
        slots.set(
            fuel,
            FuelSlot {
                direction: adj.direction,
                adjustment: adj.adjustment,
                price: Some(price::normalize(raw_price)),
            },
        );
    }

    slots
}

fn fuel_for_label(label: &str) -> Option<FuelType> {
    match label.to_ascii_lowercase().as_str() {
        "regular" | "gas" | "gasoline" => Some(FuelType::Gas),
        "diesel" => Some(FuelType::Diesel),
        _ => None,
    }
}
