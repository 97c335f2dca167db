use crate::app::{InputKey, Message, PipelineChoice};
use iced::widget::{button, column, pick_list, row, text, text_input, toggler, Column, Row};
use iced::{Color, Element, Length};
use pathocore::settings::{FieldState, ParamEdit, ParamField, ParamKind, SettingsEditor};
use std::collections::{HashMap, HashSet};

const REJECTED: Color = Color::from_rgb(0.95, 0.35, 0.3);

/// Raw text of numeric inputs, kept while the operator types, plus the
/// inputs whose text the editor rejected.
#[derive(Debug, Default)]
pub struct FormInputs {
    raw: HashMap<InputKey, String>,
    rejected: HashSet<InputKey>,
}

impl FormInputs {
    pub fn record(&mut self, key: InputKey, raw: String, accepted: bool) {
        if accepted {
            self.rejected.remove(&key);
        } else {
            self.rejected.insert(key.clone());
        }
        self.raw.insert(key, raw);
    }

    pub fn clear(&mut self) {
        self.raw.clear();
        self.rejected.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Whether some input shows text the draft does not hold.
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }

    pub fn raw(&self, name: &str, index: Option<usize>) -> Option<&str> {
        self.raw
            .get(&(name.to_string(), index))
            .map(String::as_str)
    }

    fn shown(&self, name: &str, index: Option<usize>, stored: String) -> String {
        self.raw(name, index).map(str::to_string).unwrap_or(stored)
    }

    fn field_rejected(&self, name: &str) -> bool {
        self.rejected.iter().any(|(param, _)| param == name)
    }
}

/// Pipeline picker, one widget per parameter, and the Apply/Reset pair.
pub fn settings_form<'a>(
    editor: &'a SettingsEditor,
    inputs: &'a FormInputs,
    applying: bool,
) -> Element<'a, Message> {
    let choices: Vec<PipelineChoice> = editor
        .catalog()
        .pipelines
        .iter()
        .map(PipelineChoice::from)
        .collect();
    let selected = editor.descriptor().map(PipelineChoice::from);

    let mut form = column![
        text("Pipeline").size(16),
        pick_list(choices, selected, Message::PipelineSelected)
            .placeholder("Select a pipeline")
            .width(Length::Fill),
    ]
    .spacing(10);

    if let Some(descriptor) = editor.descriptor() {
        form = form.push(text(descriptor.description.as_str()).size(12));
    }

    form = editor
        .fields()
        .iter()
        .fold(form, |form, field| form.push(field_row(editor, inputs, field)));

    let apply_enabled = editor.can_submit(applying) && !inputs.has_rejections();
    let reset_enabled = can_reset(editor, inputs, applying);
    let apply_label = if applying { "Applying..." } else { "Apply" };
    form.push(
        row![
            button(apply_label)
                .on_press_maybe(apply_enabled.then_some(Message::Apply))
                .padding(10),
            button("Reset")
                .on_press_maybe(reset_enabled.then_some(Message::Reset))
                .padding(10),
        ]
        .spacing(10),
    )
    .into()
}

/// Reset also clears rejected text, even when the draft itself is clean.
pub fn can_reset(editor: &SettingsEditor, inputs: &FormInputs, applying: bool) -> bool {
    editor.can_submit(applying) || (!applying && inputs.has_rejections())
}

fn field_row<'a>(
    editor: &'a SettingsEditor,
    inputs: &'a FormInputs,
    field: &'a ParamField,
) -> Element<'a, Message> {
    let name = field.name.clone();
    let widget: Element<'a, Message> = match editor.field_state(field) {
        FieldState::Toggle(on) => toggler(on)
            .label(field.name.as_str())
            .on_toggle(move |value| Message::ParamEdited(name.clone(), ParamEdit::Toggle(value)))
            .into(),
        FieldState::Numeric(current) => {
            let shown = inputs.shown(&field.name, None, current);
            text_input("0", &shown)
                .on_input(move |value| Message::NumberInput(name.clone(), None, value))
                .padding(6)
                .into()
        }
        FieldState::Sequence(items) => items
            .into_iter()
            .enumerate()
            .fold(Row::new().spacing(6), |row, (index, current)| {
                let name = name.clone();
                let shown = inputs.shown(&field.name, Some(index), current);
                let input = text_input("0", &shown)
                    .on_input(move |value| Message::NumberInput(name.clone(), Some(index), value))
                    .padding(6)
                    .width(Length::Fixed(70.0));
                row.push(input)
            })
            .into(),
        FieldState::Text(current) => text_input("", &current)
            .on_input(move |value| Message::ParamEdited(name.clone(), ParamEdit::Text(value)))
            .padding(6)
            .into(),
    };

    let mut entry = Column::new().spacing(4);
    if field.kind != ParamKind::Toggle {
        entry = entry.push(text(field.name.as_str()).size(14));
    }
    entry = entry.push(widget);
    if inputs.field_rejected(&field.name) {
        entry = entry.push(
            text("Not a number; the last valid value is kept")
                .size(12)
                .color(REJECTED),
        );
    }
    if !field.help.is_empty() {
        entry = entry.push(text(field.help.as_str()).size(12));
    }
    entry.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_text_clears_rejection() {
        let mut inputs = FormInputs::default();
        inputs.record(("threshold".into(), None), "abc".into(), false);
        assert!(inputs.has_rejections());
        assert!(inputs.field_rejected("threshold"));
        assert_eq!(inputs.shown("threshold", None, "100".into()), "abc");

        inputs.record(("threshold".into(), None), "12".into(), true);
        assert!(!inputs.has_rejections());
        assert_eq!(inputs.raw("threshold", None), Some("12"));
        assert_eq!(inputs.shown("min_size", None, "50".into()), "50");
    }
}
