use crate::api::{ActiveSettings, PipelineDescriptor, PipelineList};
use crate::prelude::{EditError, EditResult};
use crate::settings::param::{FieldState, ParamEdit, ParamField};
use log::debug;

/// Working copy of the active settings with dirty tracking against the last
/// seeded baseline.
///
/// The editor never moves its own baseline: only [`SettingsEditor::seed`]
/// does, which the owner calls whenever the registry confirms new settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsEditor {
    catalog: PipelineList,
    baseline: ActiveSettings,
    draft: ActiveSettings,
    fields: Vec<ParamField>,
}

impl SettingsEditor {
    pub fn new(catalog: PipelineList) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    /// Replaces the catalog and re-resolves the fields of the current draft.
    pub fn set_catalog(&mut self, catalog: PipelineList) {
        self.catalog = catalog;
        self.resolve_fields();
    }

    /// Seeds draft and baseline from settings confirmed by the registry.
    pub fn seed(&mut self, active: ActiveSettings) {
        debug!("seeding editor with pipeline {}", active.name);
        self.baseline = active.clone();
        self.draft = active;
        self.resolve_fields();
    }

    /// Switches the draft to another pipeline, replacing every parameter with
    /// that pipeline's defaults.
    pub fn select_pipeline(&mut self, name: &str) -> EditResult<()> {
        let descriptor = self
            .catalog
            .find(name)
            .ok_or_else(|| EditError::UnknownPipeline(name.to_string()))?;
        self.draft =
            ActiveSettings::new(descriptor.name.clone(), descriptor.default_params.clone());
        self.fields = ParamField::from_descriptor(descriptor);
        Ok(())
    }

    /// Applies a single parameter edit to the draft. A rejected edit leaves
    /// the draft untouched.
    pub fn edit(&mut self, param: &str, edit: ParamEdit) -> EditResult<()> {
        if !self.has_selection() {
            return Err(EditError::NoPipelineSelected);
        }
        let field = self
            .fields
            .iter()
            .find(|field| field.name == param)
            .ok_or_else(|| EditError::UnknownParam(param.to_string()))?;
        let confirmed = if self.baseline.name == self.draft.name {
            self.baseline.params.get(param)
        } else {
            None
        };
        let value = field.apply(self.draft.params.get(param), confirmed, edit)?;
        self.draft.params.insert(param.to_string(), value);
        Ok(())
    }

    /// Restores the draft to the baseline.
    pub fn reset(&mut self) {
        self.draft = self.baseline.clone();
        self.resolve_fields();
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.baseline
    }

    pub fn has_selection(&self) -> bool {
        !self.draft.name.is_empty()
    }

    /// Whether Apply and Reset are enabled given an in-flight apply flag.
    pub fn can_submit(&self, applying: bool) -> bool {
        !applying && self.has_selection() && self.is_dirty()
    }

    /// The settings to post, when Apply is enabled.
    pub fn submission(&self, applying: bool) -> Option<ActiveSettings> {
        self.can_submit(applying).then(|| self.draft.clone())
    }

    pub fn draft(&self) -> &ActiveSettings {
        &self.draft
    }

    pub fn baseline(&self) -> &ActiveSettings {
        &self.baseline
    }

    pub fn catalog(&self) -> &PipelineList {
        &self.catalog
    }

    /// Descriptor of the pipeline the draft refers to, if the catalog has it.
    pub fn descriptor(&self) -> Option<&PipelineDescriptor> {
        self.catalog.find(&self.draft.name)
    }

    pub fn fields(&self) -> &[ParamField] {
        &self.fields
    }

    pub fn field_state(&self, field: &ParamField) -> FieldState {
        field.state(self.draft.params.get(&field.name))
    }

    fn resolve_fields(&mut self) {
        self.fields = self
            .catalog
            .find(&self.draft.name)
            .map(ParamField::from_descriptor)
            .unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::Params;
    use crate::settings::param::ParamKind;
    use serde_json::{json, Value};

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn catalog() -> PipelineList {
        serde_json::from_value(json!({
            "pipelines": [
                {
                    "name": "cell_count",
                    "display_name": "Cell Count Overlay",
                    "description": "Detects and counts cells",
                    "default_params": {"threshold": 128, "show_count": true},
                    "param_descriptions": {"threshold": "Binary threshold (0-255)"}
                },
                {
                    "name": "fluorescence",
                    "display_name": "Fluorescence Detection",
                    "description": "Measures fluorescence",
                    "default_params": {
                        "threshold": 50,
                        "alpha": 0.5,
                        "font_color": [255, 255, 255]
                    }
                }
            ]
        }))
        .unwrap()
    }

    fn seeded() -> SettingsEditor {
        let mut editor = SettingsEditor::new(catalog());
        editor.seed(ActiveSettings::new(
            "cell_count",
            params(json!({"threshold": 100, "show_count": false})),
        ));
        editor
    }

    #[test]
    fn seeded_editor_shows_active_values() {
        let editor = seeded();
        let fields = editor.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].kind, ParamKind::Numeric);
        assert_eq!(fields[0].help, "Binary threshold (0-255)");
        assert_eq!(fields[1].help, "");
        assert_eq!(editor.field_state(&fields[0]), FieldState::Numeric("100".into()));
        assert_eq!(editor.field_state(&fields[1]), FieldState::Toggle(false));
        assert!(!editor.is_dirty());
        assert!(!editor.can_submit(false));
    }

    #[test]
    fn toggle_then_apply_submits_draft() {
        let mut editor = seeded();
        editor.edit("show_count", ParamEdit::Toggle(true)).unwrap();
        let submitted = editor.submission(false).unwrap();
        assert_eq!(
            serde_json::to_value(&submitted).unwrap(),
            json!({"name": "cell_count", "params": {"threshold": 100, "show_count": true}})
        );
        assert_eq!(editor.baseline().params["show_count"], json!(false));
    }

    #[test]
    fn toggling_back_clears_dirty() {
        let mut editor = seeded();
        editor.edit("show_count", ParamEdit::Toggle(true)).unwrap();
        assert!(editor.is_dirty());
        editor.edit("show_count", ParamEdit::Toggle(false)).unwrap();
        assert!(!editor.is_dirty());
    }

    #[test]
    fn in_flight_apply_disables_submission() {
        let mut editor = seeded();
        editor.edit("threshold", ParamEdit::Number("90".into())).unwrap();
        assert!(editor.can_submit(false));
        assert!(!editor.can_submit(true));
        assert!(editor.submission(true).is_none());
    }

    #[test]
    fn invalid_number_keeps_prior_value() {
        let mut editor = seeded();
        assert!(editor.edit("threshold", ParamEdit::Number("12a".into())).is_err());
        assert_eq!(editor.draft().params["threshold"], json!(100));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn switching_pipeline_discards_edits() {
        let mut editor = seeded();
        editor.edit("threshold", ParamEdit::Number("3".into())).unwrap();
        editor.select_pipeline("fluorescence").unwrap();
        assert_eq!(editor.draft().name, "fluorescence");
        assert_eq!(
            editor.draft().params,
            params(json!({"threshold": 50, "alpha": 0.5, "font_color": [255, 255, 255]}))
        );
        assert_eq!(editor.fields()[2].kind, ParamKind::Sequence(3));
        assert!(editor.is_dirty());

        editor
            .edit("font_color", ParamEdit::Element(0, "10".into()))
            .unwrap();
        editor.select_pipeline("fluorescence").unwrap();
        assert_eq!(editor.draft().params["font_color"], json!([255, 255, 255]));
    }

    #[test]
    fn unknown_pipeline_selection_is_rejected() {
        let mut editor = seeded();
        assert_eq!(
            editor.select_pipeline("missing"),
            Err(EditError::UnknownPipeline("missing".into()))
        );
        assert_eq!(editor.draft().name, "cell_count");
    }

    #[test]
    fn reset_restores_baseline_and_descriptor() {
        let mut editor = seeded();
        editor.select_pipeline("fluorescence").unwrap();
        editor.edit("alpha", ParamEdit::Number("0.9".into())).unwrap();
        editor.reset();
        assert_eq!(editor.draft(), editor.baseline());
        assert_eq!(editor.descriptor().map(|d| d.name.as_str()), Some("cell_count"));
        assert_eq!(editor.fields().len(), 2);
        assert!(!editor.can_submit(false));
    }

    #[test]
    fn key_order_does_not_make_draft_dirty() {
        let mut editor = SettingsEditor::new(catalog());
        editor.seed(ActiveSettings::new(
            "cell_count",
            params(json!({"show_count": false, "threshold": 100})),
        ));
        editor.edit("threshold", ParamEdit::Number("101".into())).unwrap();
        editor.edit("threshold", ParamEdit::Number("100".into())).unwrap();
        let reordered = ActiveSettings::new(
            "cell_count",
            params(json!({"threshold": 100, "show_count": false})),
        );
        assert_eq!(editor.draft(), &reordered);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn unresolved_active_pipeline_has_no_fields() {
        let mut editor = SettingsEditor::new(catalog());
        editor.seed(ActiveSettings::new("retired", params(json!({"x": 1}))));
        assert!(editor.fields().is_empty());
        assert!(editor.descriptor().is_none());
        assert_eq!(
            editor.edit("x", ParamEdit::Number("2".into())),
            Err(EditError::UnknownParam("x".into()))
        );
    }

    #[test]
    fn catalog_arriving_after_settings_resolves_fields() {
        let mut editor = SettingsEditor::default();
        editor.seed(ActiveSettings::new(
            "cell_count",
            params(json!({"threshold": 100, "show_count": false})),
        ));
        assert!(editor.fields().is_empty());
        editor.set_catalog(catalog());
        assert_eq!(editor.fields().len(), 2);
    }

    #[test]
    fn retyping_confirmed_float_clears_dirty() {
        let mut editor = SettingsEditor::new(catalog());
        editor.seed(ActiveSettings::new(
            "fluorescence",
            params(json!({"threshold": 50, "alpha": 1.0, "font_color": [255, 255, 255]})),
        ));
        editor.edit("alpha", ParamEdit::Number("1.5".into())).unwrap();
        assert!(editor.is_dirty());
        editor.edit("alpha", ParamEdit::Number("1.0".into())).unwrap();
        assert!(!editor.is_dirty());
        editor.edit("alpha", ParamEdit::Number("1".into())).unwrap();
        assert!(!editor.is_dirty());

        editor.edit("threshold", ParamEdit::Number("50.0".into())).unwrap();
        assert!(!editor.is_dirty());
    }

    #[test]
    fn nothing_selected_disables_everything() {
        let mut editor = SettingsEditor::new(catalog());
        assert!(!editor.has_selection());
        assert!(!editor.can_submit(false));
        assert_eq!(
            editor.edit("threshold", ParamEdit::Number("1".into())),
            Err(EditError::NoPipelineSelected)
        );
    }
}
