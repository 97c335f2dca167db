pub mod editor;
pub mod param;

pub use editor::SettingsEditor;
pub use param::{FieldState, ParamEdit, ParamField, ParamKind};
