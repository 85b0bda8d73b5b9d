use std::sync::LazyLock;

use regex::Regex;

use crate::model::Direction;

static NO_CHANGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bno[\s-]change\b").unwrap());
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(up|down)\s+(\d+(?:\.\d+)?|\.\d+)").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(up|down)\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub direction: Option<Direction>,
    pub adjustment: Option<f64>,
}

/// Parse a directional phrase such as "UP 3.6" or "NO CHANGE".
///
/// Total: anything unrecognized comes back as `{None, None}`.
pub fn parse(phrase: &str) -> Adjustment {
    let phrase = phrase.trim();

    if NO_CHANGE_RE.is_match(phrase) {
        return Adjustment {
            direction: Some(Direction::NoChange),
            adjustment: Some(0.0),
        };
    }

    if let Some(caps) = AMOUNT_RE.captures(phrase) {
        if let Ok(amount) = caps[2].parse::<f64>() {
            return Adjustment {
                direction: word_direction(&caps[1]),
                adjustment: Some(amount),
            };
        }
    }

    // Direction without a magnitude
    let direction = WORD_RE.captures(phrase).and_then(|c| word_direction(&c[1]));
    Adjustment {
        direction,
        adjustment: None,
    }
}

fn word_direction(word: &str) -> Option<Direction> {
    match word.to_ascii_lowercase().as_str() {
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        _ => None,
    }
}
