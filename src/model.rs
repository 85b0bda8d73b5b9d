use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Max length of the free-text note carried on a prediction.
pub const MAX_NOTES_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Up,
    Down,
    NoChange,
}

impl Direction {
    pub const ALLOWED: &'static str = "up, down, no-change";

    /// Parse the wire spelling. Exact and lowercase only; the parser handles
    /// the looser post text.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "no-change" => Some(Direction::NoChange),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::NoChange => "no-change",
        }
    }
}

/// One fuel type's prediction. `adjustment` is a magnitude in cents; the sign
/// lives in `direction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelSlot {
    pub direction: Option<Direction>,
    pub adjustment: Option<f64>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelType {
    #[serde(rename = "gas")]
    Gas,
    #[serde(rename = "diesel")]
    Diesel,
}

impl FuelType {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "gas" => Some(FuelType::Gas),
            "diesel" => Some(FuelType::Diesel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Reddit,
    Webhook,
    ManualTool,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Reddit => "reddit",
            Source::Webhook => "webhook",
            Source::ManualTool => "manual-tool",
        }
    }
}

/// Canonical dual-fuel record, whichever way it came in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub gas: Option<FuelSlot>,
    pub diesel: Option<FuelSlot>,
    pub notes: Option<String>,
    pub source: Source,
    pub identifier: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The `{gas, diesel}` pair both strategies and both wire shapes converge on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slots {
    pub gas: Option<FuelSlot>,
    pub diesel: Option<FuelSlot>,
}

impl Slots {
    pub fn is_empty(&self) -> bool {
        self.gas.is_none() && self.diesel.is_none()
    }

    pub fn set(&mut self, fuel: FuelType, slot: FuelSlot) {
        match fuel {
            FuelType::Gas => self.gas = Some(slot),
            FuelType::Diesel => self.diesel = Some(slot),
        }
    }
}

/// A source post, as handed to the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub permalink: Option<String>,
}

/// Truncate to at most `max` chars (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
