//! SOS trigger requests and their field-level validation.
//!
//! Validation collects every problem before failing, keyed by field name,
//! so the HTTP layer can return them all at once:
//!
//! ```json
//! { "risk_level": ["This field is required."],
//!   "location": { "latitude": ["A valid number is required."] } }
//! ```

use std::fmt;

use haven_core::{location::Location, user::UserId};
use serde::Serialize;
use serde_json::{Map, Value};

/// Longest accepted `risk_level`, in characters.
pub const RISK_LEVEL_MAX_CHARS: usize = 10;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const BLANK: &str = "This field may not be blank.";
const INVALID_INT: &str = "A valid integer is required.";
const INVALID_NUMBER: &str = "A valid number is required.";
const INVALID_STRING: &str = "Not a valid string.";
const NON_FIELD: &str = "non_field_errors";

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Per-field validation messages. Nested objects (e.g. `location`) get a
/// nested map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Map<String, Value>);

impl ValidationErrors {
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Messages recorded for `field`, if any.
  pub fn field(&self, field: &str) -> Option<&Value> { self.0.get(field) }

  fn add(&mut self, field: &str, message: impl Into<String>) {
    let entry = self
      .0
      .entry(field)
      .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(messages) = entry {
      messages.push(Value::String(message.into()));
    }
  }

  fn nest(&mut self, field: &str, inner: ValidationErrors) {
    self.0.insert(field.to_owned(), Value::Object(inner.0));
  }

  fn not_a_dictionary(value: &Value) -> Self {
    let mut errors = Self::default();
    errors.add(
      NON_FIELD,
      format!("Invalid data. Expected a dictionary, but got {}.", json_kind(value)),
    );
    errors
  }

  fn into_result<T>(self, value: T) -> Result<T, Self> {
    if self.is_empty() { Ok(value) } else { Err(self) }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", Value::Object(self.0.clone()))
  }
}

impl std::error::Error for ValidationErrors {}

// ─── Request ─────────────────────────────────────────────────────────────────

/// A validated SOS trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerRequest {
  pub user_id:          UserId,
  /// Advisory severity, at most [`RISK_LEVEL_MAX_CHARS`] characters.
  pub risk_level:       String,
  pub message:          Option<String>,
  pub location:         Option<Location>,
  /// Which chat character the SOS was raised from.
  pub source_character: Option<String>,
}

impl TriggerRequest {
  pub fn new(user_id: UserId, risk_level: impl Into<String>) -> Self {
    Self {
      user_id,
      risk_level: risk_level.into(),
      message: None,
      location: None,
      source_character: None,
    }
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = Some(message.into());
    self
  }

  pub fn with_location(mut self, location: Location) -> Self {
    self.location = Some(location);
    self
  }

  pub fn with_source_character(mut self, name: impl Into<String>) -> Self {
    self.source_character = Some(name.into());
    self
  }

  /// Parse and validate a JSON request body.
  ///
  /// Strings are trimmed; blank optional strings become `None`. Integer
  /// and number fields also accept numeric strings.
  pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
    let Some(obj) = body.as_object() else {
      return Err(ValidationErrors::not_a_dictionary(body));
    };
    let mut errors = ValidationErrors::default();

    let user_id = required(obj, "user_id", &mut errors, parse_int);
    let risk_level = required(obj, "risk_level", &mut errors, parse_risk_level);
    let message = optional(obj, "message", &mut errors, parse_string).flatten();
    let source_character =
      optional(obj, "source_character", &mut errors, parse_string).flatten();

    let location = match obj.get("location") {
      None => None,
      Some(Value::Null) => {
        errors.add("location", NOT_NULL);
        None
      }
      Some(value) => match parse_location(value) {
        Ok(location) => Some(location),
        Err(inner) => {
          errors.nest("location", inner);
          None
        }
      },
    };

    match (user_id, risk_level) {
      (Some(user_id), Some(risk_level)) if errors.is_empty() => Ok(Self {
        user_id,
        risk_level,
        message,
        location,
        source_character,
      }),
      _ => Err(errors),
    }
  }

  /// Re-check the invariants `from_json` enforces, for requests built in
  /// code.
  pub fn validate(&self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if let Err(message) = check_risk_level(&self.risk_level) {
      errors.add("risk_level", message);
    }

    if let Some(location) = &self.location {
      let mut inner = ValidationErrors::default();
      for (name, value) in [
        ("latitude", Some(location.latitude)),
        ("longitude", Some(location.longitude)),
        ("accuracy", location.accuracy),
      ] {
        if value.is_some_and(|v| !v.is_finite()) {
          inner.add(name, INVALID_NUMBER);
        }
      }
      if !inner.is_empty() {
        errors.nest("location", inner);
      }
    }

    errors.into_result(())
  }
}

// ─── Field helpers ───────────────────────────────────────────────────────────

fn required<T>(
  obj: &Map<String, Value>,
  name: &str,
  errors: &mut ValidationErrors,
  parse: impl Fn(&Value) -> Result<T, String>,
) -> Option<T> {
  if !obj.contains_key(name) {
    errors.add(name, REQUIRED);
    return None;
  }
  optional(obj, name, errors, parse)
}

fn optional<T>(
  obj: &Map<String, Value>,
  name: &str,
  errors: &mut ValidationErrors,
  parse: impl Fn(&Value) -> Result<T, String>,
) -> Option<T> {
  match obj.get(name)? {
    Value::Null => {
      errors.add(name, NOT_NULL);
      None
    }
    value => parse(value)
      .map_err(|message| errors.add(name, message))
      .ok(),
  }
}

fn parse_int(value: &Value) -> Result<i64, String> {
  let parsed = match value {
    Value::Number(n) => n.as_i64().or_else(|| {
      n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
    }),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  };
  parsed.ok_or_else(|| INVALID_INT.to_string())
}

fn parse_float(value: &Value) -> Result<f64, String> {
  let parsed = match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  };
  parsed
    .filter(|f: &f64| f.is_finite())
    .ok_or_else(|| INVALID_NUMBER.to_string())
}

/// A trimmed string; `None` when blank.
fn parse_string(value: &Value) -> Result<Option<String>, String> {
  let s = match value {
    Value::String(s) => s.trim().to_owned(),
    Value::Number(n) => n.to_string(),
    _ => return Err(INVALID_STRING.to_string()),
  };
  Ok(if s.is_empty() { None } else { Some(s) })
}

fn parse_risk_level(value: &Value) -> Result<String, String> {
  let level = parse_string(value)?.unwrap_or_default();
  check_risk_level(&level)?;
  Ok(level)
}

fn check_risk_level(level: &str) -> Result<(), String> {
  if level.trim().is_empty() {
    return Err(BLANK.to_string());
  }
  if level.chars().count() > RISK_LEVEL_MAX_CHARS {
    return Err(format!(
      "Ensure this field has no more than {RISK_LEVEL_MAX_CHARS} characters."
    ));
  }
  Ok(())
}

fn parse_location(value: &Value) -> Result<Location, ValidationErrors> {
  let Some(obj) = value.as_object() else {
    return Err(ValidationErrors::not_a_dictionary(value));
  };
  let mut errors = ValidationErrors::default();

  let latitude = required(obj, "latitude", &mut errors, parse_float);
  let longitude = required(obj, "longitude", &mut errors, parse_float);
  let accuracy = optional(obj, "accuracy", &mut errors, parse_float);

  match (latitude, longitude) {
    (Some(latitude), Some(longitude)) => {
      errors.into_result(Location { latitude, longitude, accuracy })
    }
    _ => Err(errors),
  }
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "bool",
    Value::Number(_) => "number",
    Value::String(_) => "str",
    Value::Array(_) => "list",
    Value::Object(_) => "dict",
  }
}
