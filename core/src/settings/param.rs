use crate::api::PipelineDescriptor;
use crate::prelude::{EditError, EditResult};
use serde_json::{Number, Value};

/// Edit widget chosen for a parameter from the type of its default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Toggle,
    Numeric,
    /// Fixed-length sequence edited element by element.
    Sequence(usize),
    Text,
}

impl ParamKind {
    pub fn infer(default: &Value) -> Self {
        match default {
            Value::Bool(_) => ParamKind::Toggle,
            Value::Number(_) => ParamKind::Numeric,
            Value::Array(items) => ParamKind::Sequence(items.len()),
            _ => ParamKind::Text,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ParamKind::Toggle => "toggle",
            ParamKind::Numeric => "numeric",
            ParamKind::Sequence(_) => "sequence",
            ParamKind::Text => "text",
        }
    }
}

/// One editable row of the settings form.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamField {
    pub name: String,
    pub kind: ParamKind,
    pub help: String,
    pub default: Value,
}

impl ParamField {
    /// Builds the field list for a descriptor, in descriptor order.
    pub fn from_descriptor(descriptor: &PipelineDescriptor) -> Vec<ParamField> {
        descriptor
            .default_params
            .iter()
            .map(|(name, default)| ParamField {
                name: name.clone(),
                kind: ParamKind::infer(default),
                help: descriptor.help_for(name).to_string(),
                default: default.clone(),
            })
            .collect()
    }

    /// What the widget should display for the current draft value.
    pub fn state(&self, current: Option<&Value>) -> FieldState {
        match self.kind {
            ParamKind::Toggle => {
                FieldState::Toggle(current.and_then(Value::as_bool).unwrap_or(false))
            }
            ParamKind::Numeric => FieldState::Numeric(match current {
                Some(Value::Number(number)) => number.to_string(),
                _ => "0".into(),
            }),
            ParamKind::Sequence(_) => {
                let items = match current {
                    Some(Value::Array(items)) => items.as_slice(),
                    _ => self.default.as_array().map(Vec::as_slice).unwrap_or(&[]),
                };
                FieldState::Sequence(items.iter().map(element_text).collect())
            }
            ParamKind::Text => FieldState::Text(match current {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }),
        }
    }

    /// Applies `edit` on top of `current`, returning the new stored value.
    ///
    /// Numbers keep the integer or float representation of `reference` (the
    /// confirmed value), or of the default when there is none, so retyping a
    /// confirmed value restores it exactly. The edit must match the field
    /// kind; rejected edits leave the caller's value untouched.
    pub fn apply(
        &self,
        current: Option<&Value>,
        reference: Option<&Value>,
        edit: ParamEdit,
    ) -> EditResult<Value> {
        match (self.kind, edit) {
            (ParamKind::Toggle, ParamEdit::Toggle(on)) => Ok(Value::Bool(on)),
            (ParamKind::Numeric, ParamEdit::Number(text)) => {
                parse_number(&text, is_float(reference, &self.default))
            }
            (ParamKind::Sequence(_), ParamEdit::Element(index, text)) => {
                let mut items = match current {
                    Some(Value::Array(items)) => items.clone(),
                    _ => self.default.as_array().cloned().unwrap_or_default(),
                };
                let len = items.len();
                let slot = items.get_mut(index).ok_or_else(|| EditError::IndexOutOfRange {
                    param: self.name.clone(),
                    index,
                    len,
                })?;
                let element = |value: Option<&Value>| value?.as_array()?.get(index).cloned();
                let float = is_float(
                    element(reference).as_ref(),
                    &element(Some(&self.default)).unwrap_or(Value::Null),
                );
                *slot = parse_number(&text, float)?;
                Ok(Value::Array(items))
            }
            (ParamKind::Text, ParamEdit::Text(text)) => Ok(Value::String(text)),
            (kind, _) => Err(EditError::KindMismatch {
                param: self.name.clone(),
                expected: kind.label(),
            }),
        }
    }
}

/// A user edit against a single parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamEdit {
    Toggle(bool),
    Number(String),
    Element(usize, String),
    Text(String),
}

/// Display state of a field widget.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldState {
    Toggle(bool),
    Numeric(String),
    Sequence(Vec<String>),
    Text(String),
}

fn element_text(value: &Value) -> String {
    match value {
        Value::Number(number) => number.to_string(),
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Whether numbers edited against `reference` (else `default`) stay floats.
fn is_float(reference: Option<&Value>, default: &Value) -> bool {
    match reference {
        Some(Value::Number(number)) => number.is_f64(),
        _ => default.is_f64(),
    }
}

/// Parses a numeric edit. Integral results become JSON integers unless
/// `float` asks for a float representation.
pub fn parse_number(text: &str, float: bool) -> EditResult<Value> {
    let trimmed = text.trim();
    let parsed: f64 = trimmed
        .parse()
        .map_err(|_| EditError::InvalidNumber(text.to_string()))?;
    if !parsed.is_finite() {
        return Err(EditError::InvalidNumber(text.to_string()));
    }
    if !float && parsed.fract() == 0.0 && parsed.abs() < 9.0e15 {
        return Ok(Value::Number(Number::from(parsed as i64)));
    }
    Number::from_f64(parsed)
        .map(Value::Number)
        .ok_or_else(|| EditError::InvalidNumber(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, default: Value) -> ParamField {
        ParamField {
            name: name.into(),
            kind: ParamKind::infer(&default),
            help: String::new(),
            default,
        }
    }

    #[test]
    fn kind_depends_only_on_value_type() {
        assert_eq!(ParamKind::infer(&json!(true)), ParamKind::Toggle);
        assert_eq!(ParamKind::infer(&json!(false)), ParamKind::Toggle);
        assert_eq!(ParamKind::infer(&json!(0)), ParamKind::Numeric);
        assert_eq!(ParamKind::infer(&json!(-1e12)), ParamKind::Numeric);
        assert_eq!(ParamKind::infer(&json!(0.5)), ParamKind::Numeric);
        assert_eq!(ParamKind::infer(&json!([0, 255, 0])), ParamKind::Sequence(3));
        assert_eq!(ParamKind::infer(&json!([10, 30])), ParamKind::Sequence(2));
        assert_eq!(ParamKind::infer(&json!("jet")), ParamKind::Text);
        assert_eq!(ParamKind::infer(&json!(null)), ParamKind::Text);
        assert_eq!(ParamKind::infer(&json!({"a": 1})), ParamKind::Text);
    }

    #[test]
    fn absent_values_fall_back_per_kind() {
        assert_eq!(field("a", json!(true)).state(None), FieldState::Toggle(false));
        assert_eq!(field("b", json!(3)).state(None), FieldState::Numeric("0".into()));
        assert_eq!(field("c", json!("x")).state(None), FieldState::Text(String::new()));
        assert_eq!(
            field("d", json!([1, 2])).state(None),
            FieldState::Sequence(vec!["1".into(), "2".into()])
        );
    }

    #[test]
    fn numeric_edits_fail_closed() {
        let threshold = field("threshold", json!(128));
        assert_eq!(
            threshold.apply(Some(&json!(128)), None, ParamEdit::Number("abc".into())),
            Err(EditError::InvalidNumber("abc".into()))
        );
        assert!(threshold
            .apply(None, None, ParamEdit::Number("inf".into()))
            .is_err());
        assert_eq!(
            threshold.apply(None, None, ParamEdit::Number(" 100 ".into())),
            Ok(json!(100))
        );
        assert_eq!(
            threshold.apply(None, None, ParamEdit::Number("0.25".into())),
            Ok(json!(0.25))
        );
    }

    #[test]
    fn whole_numbers_keep_float_representation() {
        let scale = field("font_scale", json!(1.0));
        assert_eq!(
            scale.apply(Some(&json!(1.5)), None, ParamEdit::Number("1".into())),
            Ok(json!(1.0))
        );
        assert!(scale
            .apply(None, None, ParamEdit::Number("1.0".into()))
            .unwrap()
            .is_f64());

        let threshold = field("threshold", json!(128));
        assert_eq!(
            threshold.apply(None, Some(&json!(0.9)), ParamEdit::Number("2".into())),
            Ok(json!(2.0))
        );
        assert_eq!(
            threshold.apply(None, None, ParamEdit::Number("2.0".into())),
            Ok(json!(2))
        );

        let position = field("count_position", json!([10.5, 30]));
        let updated = position
            .apply(None, None, ParamEdit::Element(0, "12".into()))
            .unwrap();
        assert!(updated[0].is_f64());
        assert!(updated[1].is_i64());
    }

    #[test]
    fn element_edit_replaces_only_that_index() {
        let color = field("contour_color", json!([0, 255, 0]));
        let updated = color
            .apply(Some(&json!([1, 2, 3])), None, ParamEdit::Element(1, "9".into()))
            .unwrap();
        assert_eq!(updated, json!([1, 9, 3]));

        let err = color
            .apply(Some(&json!([1, 2, 3])), None, ParamEdit::Element(3, "9".into()))
            .unwrap_err();
        assert_eq!(
            err,
            EditError::IndexOutOfRange {
                param: "contour_color".into(),
                index: 3,
                len: 3
            }
        );
    }

    #[test]
    fn mismatched_edit_is_rejected() {
        let toggle = field("show_count", json!(true));
        assert!(matches!(
            toggle.apply(None, None, ParamEdit::Text("yes".into())),
            Err(EditError::KindMismatch { expected: "toggle", .. })
        ));
    }
}
