use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{Rejection, ValidationResult};
use crate::model::{truncate_chars, Direction, FuelSlot, FuelType, Prediction, Slots, Source, MAX_NOTES_CHARS};

/// Token configured for the endpoint, and the one the caller presented.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub expected: Option<&'a str>,
    pub provided: Option<&'a str>,
}

/// Fails closed: with no configured token nothing gets in.
pub fn authorize(creds: &Credentials) -> ValidationResult<()> {
    match (creds.expected, creds.provided) {
        (Some(expected), Some(provided)) if !expected.is_empty() && expected == provided => Ok(()),
        (None, _) => Err(Rejection::Unauthorized("submissions are disabled: no token configured".into())),
        (_, None) => Err(Rejection::Unauthorized("missing bearer token".into())),
        _ => Err(Rejection::Unauthorized("invalid bearer token".into())),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuelInput {
    pub direction: Direction,
    pub adjustment: Option<f64>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DualFuelSubmission {
    pub gas: Option<FuelInput>,
    pub diesel: Option<FuelInput>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacySubmission {
    pub direction: Direction,
    pub predicted_price: f64,
    pub current_price: Option<f64>,
    pub fuel_type: FuelType,
    pub notes: Option<String>,
}

/// The two accepted wire shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    DualFuel(DualFuelSubmission),
    Legacy(LegacySubmission),
}

impl Submission {
    /// A `gas` or `diesel` key marks the dual-fuel shape; a `direction` key
    /// the legacy one.
    ///
    /// Fields are read off the `Value` rather than through a derived
    /// `Deserialize` so each failure names the offending field.
    pub fn from_value(payload: &Value) -> ValidationResult<Self> {
        let obj = payload
            .as_object()
            .ok_or_else(|| Rejection::invalid("request body must be a JSON object"))?;

        if obj.contains_key("gas") || obj.contains_key("diesel") {
            Ok(Submission::DualFuel(DualFuelSubmission {
                gas: fuel_input(obj, "gas")?,
                diesel: fuel_input(obj, "diesel")?,
                notes: notes(obj)?,
            }))
        } else if obj.contains_key("direction") {
            Ok(Submission::Legacy(legacy(obj)?))
        } else {
            Err(Rejection::invalid(
                "body must contain gas/diesel objects or a direction field",
            ))
        }
    }

    /// Collapse either shape to the canonical `{gas, diesel}` slots plus notes.
    pub fn into_slots(self) -> (Slots, Option<String>) {
        match self {
            Submission::DualFuel(d) => (
                Slots {
                    gas: d.gas.map(FuelInput::into_slot),
                    diesel: d.diesel.map(FuelInput::into_slot),
                },
                d.notes,
            ),
            Submission::Legacy(l) => {
                let adjustment = match (l.direction, l.current_price) {
                    (Direction::NoChange, _) => Some(0.0),
                    (_, Some(current)) => Some(cents_between(current, l.predicted_price)),
                    (_, None) => None,
                };
                let mut slots = Slots::default();
                slots.set(
                    l.fuel_type,
                    FuelSlot {
                        direction: Some(l.direction),
                        adjustment,
                        price: Some(l.predicted_price),
                    },
                );
                (slots, l.notes)
            }
        }
    }
}

impl FuelInput {
    fn into_slot(self) -> FuelSlot {
        let adjustment = match (self.direction, self.adjustment) {
            (Direction::NoChange, None) => Some(0.0),
            (_, a) => a,
        };
        FuelSlot {
            direction: Some(self.direction),
            adjustment,
            price: self.price,
        }
    }
}

/// Authenticate, then check the payload against the wire shapes.
pub fn validate(
    payload: &Value,
    creds: &Credentials,
    source: Source,
    received_at: DateTime<Utc>,
) -> ValidationResult<Prediction> {
    authorize(creds)?;
    let (slots, notes) = Submission::from_value(payload)?.into_slots();
    Ok(Prediction {
        gas: slots.gas,
        diesel: slots.diesel,
        notes,
        source,
        identifier: None,
        timestamp: received_at,
    })
}

fn fuel_input(obj: &Map<String, Value>, key: &str) -> ValidationResult<Option<FuelInput>> {
    let fuel = match obj.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(fuel)) => fuel,
        Some(_) => return Err(Rejection::invalid(format!("{} must be an object", key))),
    };

    let direction = fuel
        .get("direction")
        .and_then(Value::as_str)
        .and_then(Direction::from_wire)
        .ok_or_else(|| {
            Rejection::invalid(format!("{}.direction must be one of: {}", key, Direction::ALLOWED))
        })?;

    let adjustment = optional_number(fuel, "adjustment", key)?;
    if adjustment.is_some_and(|a| a < 0.0) {
        return Err(Rejection::invalid(format!(
            "{}.adjustment must be a non-negative number",
            key
        )));
    }

    Ok(Some(FuelInput {
        direction,
        adjustment,
        price: optional_number(fuel, "price", key)?,
    }))
}

fn legacy(obj: &Map<String, Value>) -> ValidationResult<LegacySubmission> {
    let direction = obj
        .get("direction")
        .and_then(Value::as_str)
        .and_then(Direction::from_wire)
        .ok_or_else(|| Rejection::invalid(format!("direction must be one of: {}", Direction::ALLOWED)))?;

    let fuel_type = match obj.get("fuel_type") {
        None | Some(Value::Null) => FuelType::Gas,
        Some(v) => v
            .as_str()
            .and_then(FuelType::from_wire)
            .ok_or_else(|| Rejection::invalid("fuel_type must be one of: gas, diesel"))?,
    };

    let predicted_price = optional_number(obj, "predicted_price", "")?
        .ok_or_else(|| Rejection::invalid("predicted_price is required"))?;

    Ok(LegacySubmission {
        direction,
        predicted_price,
        current_price: optional_number(obj, "current_price", "")?,
        fuel_type,
        notes: notes(obj)?,
    })
}

/// Absent or null is `None`; anything else has to be a finite number.
fn optional_number(obj: &Map<String, Value>, field: &str, parent: &str) -> ValidationResult<Option<f64>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_f64() {
            Some(n) if n.is_finite() => Ok(Some(n)),
            _ => {
                let name = if parent.is_empty() {
                    field.to_string()
                } else {
                    format!("{}.{}", parent, field)
                };
                Err(Rejection::invalid(format!("{} must be a number", name)))
            }
        },
    }
}

fn notes(obj: &Map<String, Value>) -> ValidationResult<Option<String>> {
    match obj.get("notes") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(truncate_chars(trimmed, MAX_NOTES_CHARS)))
            }
        }
        Some(_) => Err(Rejection::invalid("notes must be a string")),
    }
}

/// Price gap in cents, one decimal place.
fn cents_between(current: f64, predicted: f64) -> f64 {
    ((predicted - current).abs() * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TOKEN: &str = "s3cret";

    fn creds() -> Credentials<'static> {
        Credentials { expected: Some(TOKEN), provided: Some(TOKEN) }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_000_000, 0).unwrap()
    }

    fn check(payload: Value) -> ValidationResult<Prediction> {
        validate(&payload, &creds(), Source::Webhook, now())
    }

    #[test]
    fn dual_fuel_accepted() {
        let p = check(json!({
            "gas": { "direction": "up", "adjustment": 3.6, "price": 1.621 },
            "diesel": { "direction": "no-change" },
            "notes": "weekly update"
        }))
        .unwrap();
        assert_eq!(
            p.gas,
            Some(FuelSlot { direction: Some(Direction::Up), adjustment: Some(3.6), price: Some(1.621) })
        );
        assert_eq!(
            p.diesel,
            Some(FuelSlot { direction: Some(Direction::NoChange), adjustment: Some(0.0), price: None })
        );
        assert_eq!(p.notes.as_deref(), Some("weekly update"));
        assert_eq!(p.source, Source::Webhook);
        assert_eq!(p.identifier, None);
    }

    #[test]
    fn bad_direction_rejected() {
        let err = check(json!({ "gas": { "direction": "sideways" } })).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "gas.direction must be one of: up, down, no-change");

        let err = check(json!({ "direction": "sideways", "predicted_price": 1.5 })).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "direction must be one of: up, down, no-change");
    }

    #[test]
    fn null_direction_rejected_on_submission() {
        let err = check(json!({ "diesel": { "direction": null, "price": 1.7 } })).unwrap_err();
        assert_eq!(err.to_string(), "diesel.direction must be one of: up, down, no-change");
    }

    #[test]
    fn non_numeric_price_rejected() {
        let err = check(json!({ "gas": { "direction": "up", "price": "1.60" } })).unwrap_err();
        assert_eq!(err.to_string(), "gas.price must be a number");
    }

    #[test]
    fn negative_adjustment_rejected() {
        let err = check(json!({ "gas": { "direction": "down", "adjustment": -2 } })).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn fuel_must_be_object() {
        let err = check(json!({ "gas": "up" })).unwrap_err();
        assert_eq!(err.to_string(), "gas must be an object");
    }

    #[test]
    fn legacy_rules() {
        let err = check(json!({ "direction": "up" })).unwrap_err();
        assert_eq!(err.to_string(), "predicted_price is required");

        let err = check(json!({ "direction": "up", "predicted_price": 1.5, "fuel_type": "premium" })).unwrap_err();
        assert_eq!(err.to_string(), "fuel_type must be one of: gas, diesel");

        let err = check(json!({ "direction": "up", "predicted_price": 1.5, "current_price": "x" })).unwrap_err();
        assert_eq!(err.to_string(), "current_price must be a number");
    }

    #[test]
    fn legacy_defaults_to_gas() {
        let p = check(json!({ "direction": "down", "predicted_price": 1.549 })).unwrap();
        assert!(p.diesel.is_none());
        let gas = p.gas.unwrap();
        assert_eq!(gas.direction, Some(Direction::Down));
        assert_eq!(gas.price, Some(1.549));
        assert_eq!(gas.adjustment, None);
    }

    #[test]
    fn legacy_diesel_with_current_price() {
        let p = check(json!({
            "direction": "up",
            "predicted_price": 1.719,
            "current_price": 1.659,
            "fuel_type": "diesel"
        }))
        .unwrap();
        assert!(p.gas.is_none());
        let diesel = p.diesel.unwrap();
        assert_eq!(diesel.adjustment, Some(6.0));
        assert_eq!(diesel.price, Some(1.719));
    }

    #[test]
    fn legacy_and_dual_converge() {
        let legacy = check(json!({
            "direction": "no-change",
            "predicted_price": 1.599,
            "fuel_type": "gas",
            "notes": "steady week"
        }))
        .unwrap();
        let dual = check(json!({
            "gas": { "direction": "no-change", "price": 1.599 },
            "notes": "steady week"
        }))
        .unwrap();
        assert_eq!(legacy, dual);

        let legacy = check(json!({ "direction": "up", "predicted_price": 1.7, "fuel_type": "diesel" })).unwrap();
        let dual = check(json!({ "diesel": { "direction": "up", "price": 1.7 } })).unwrap();
        assert_eq!(legacy, dual);
    }

    #[test]
    fn notes_truncated_and_blank_dropped() {
        let long = "n".repeat(700);
        let p = check(json!({ "gas": { "direction": "up" }, "notes": long })).unwrap();
        assert_eq!(p.notes.unwrap().chars().count(), MAX_NOTES_CHARS);

        let p = check(json!({ "gas": { "direction": "up" }, "notes": "   " })).unwrap();
        assert_eq!(p.notes, None);

        let p = check(json!({ "gas": { "direction": "up" }, "notes": "  steady week \n" })).unwrap();
        assert_eq!(p.notes.as_deref(), Some("steady week"));

        let err = check(json!({ "gas": { "direction": "up" }, "notes": 5 })).unwrap_err();
        assert_eq!(err.to_string(), "notes must be a string");
    }

    #[test]
    fn both_null_is_representable() {
        let p = check(json!({ "gas": null, "diesel": null })).unwrap();
        assert!(p.gas.is_none() && p.diesel.is_none());
    }

    #[test]
    fn unknown_shape_rejected() {
        assert_eq!(check(json!({ "price": 1.5 })).unwrap_err().status_code(), 400);
        assert_eq!(check(json!([1, 2])).unwrap_err().status_code(), 400);
    }

    #[test]
    fn auth_checked_before_schema() {
        let payload = json!({ "direction": "sideways" });
        for provided in [None, Some("wrong")] {
            let c = Credentials { expected: Some(TOKEN), provided };
            let err = validate(&payload, &c, Source::Webhook, now()).unwrap_err();
            assert_eq!(err.status_code(), 401);
        }
    }

    #[test]
    fn no_configured_token_fails_closed() {
        let c = Credentials { expected: None, provided: Some("anything") };
        let err = validate(&json!({ "direction": "up", "predicted_price": 1.5 }), &c, Source::ManualTool, now())
            .unwrap_err();
        assert!(matches!(err, Rejection::Unauthorized(_)));
    }
}
