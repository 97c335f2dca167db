use serde_json::{Map, Value};
use std::fmt;

/// Shown in place of a field the pipeline has not published.
pub const PLACEHOLDER: &str = "-";

/// A single metrics field, which may be absent or arrive in an unexpected
/// shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Missing,
    Number(f64),
    Text(String),
}

impl Reading {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(number)) => {
                number.as_f64().map_or(Reading::Missing, Reading::Number)
            }
            Some(Value::String(text)) => Reading::Text(text.clone()),
            Some(Value::Bool(flag)) => Reading::Text(flag.to_string()),
            _ => Reading::Missing,
        }
    }

    /// Reads `key` from `metrics`, substituting `default` when absent.
    pub fn field(metrics: Option<&Map<String, Value>>, key: &str, default: Reading) -> Self {
        match Reading::from_value(metrics.and_then(|map| map.get(key))) {
            Reading::Missing => default,
            reading => reading,
        }
    }

    pub fn number_or(metrics: Option<&Map<String, Value>>, key: &str, default: f64) -> Self {
        Reading::field(metrics, key, Reading::Number(default))
    }

    pub fn text_or_placeholder(metrics: Option<&Map<String, Value>>, key: &str) -> Self {
        Reading::field(metrics, key, Reading::Text(PLACEHOLDER.into()))
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Reading::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reading::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Fixed-decimal rendering; non-numeric readings are shown unchanged.
    pub fn fixed(&self, decimals: usize) -> String {
        match self {
            Reading::Number(value) => format!("{value:.decimals$}"),
            other => other.to_string(),
        }
    }

    /// Nearest-integer rendering; non-numeric readings are shown unchanged.
    pub fn rounded(&self) -> String {
        match self {
            Reading::Number(value) => format!("{}", value.round()),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Missing => f.write_str(PLACEHOLDER),
            Reading::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Reading::Number(value) => write!(f, "{value}"),
            Reading::Text(text) => f.write_str(text),
        }
    }
}

/// Nested mapping `key` inside `metrics`, if present and an object.
pub fn section<'a>(
    metrics: Option<&'a Map<String, Value>>,
    key: &str,
) -> Option<&'a Map<String, Value>> {
    metrics.and_then(|map| map.get(key)).and_then(Value::as_object)
}

/// Two-slice share rendered as a pie.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub first: Slice,
    pub second: Slice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: &'static str,
    pub value: f64,
}

impl Share {
    /// A percentage and its complement; the slices always sum to 100.
    pub fn of_percent(label: &'static str, rest: &'static str, percent: f64) -> Self {
        let first = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        Self {
            first: Slice { label, value: first },
            second: Slice {
                label: rest,
                value: 100.0 - first,
            },
        }
    }

    /// Two independent magnitudes, negatives and NaN counted as zero.
    pub fn of_pair(first: (&'static str, f64), second: (&'static str, f64)) -> Self {
        let clean = |value: f64| if value > 0.0 { value } else { 0.0 };
        Self {
            first: Slice {
                label: first.0,
                value: clean(first.1),
            },
            second: Slice {
                label: second.0,
                value: clean(second.1),
            },
        }
    }

    pub fn total(&self) -> f64 {
        self.first.value + self.second.value
    }

    /// Fraction of the whole held by the first slice, 0 when both are empty.
    pub fn first_fraction(&self) -> f64 {
        let total = self.total();
        if total > 0.0 {
            self.first.value / total
        } else {
            0.0
        }
    }
}

/// One categorical bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: &'static str,
    pub value: f64,
}

/// Display emphasis of a categorical label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Strong,
    Moderate,
    Weak,
}
