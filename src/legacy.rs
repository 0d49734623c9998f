use std::path::Path;

use log::{info, warn};

use crate::toolkit::EditableModel;

pub const LEGACY_NKE_PUMP_FILE: &str = "NKE_pump_orig.cellml";
pub const LEGACY_NKE_PUMP_MODEL: &str = "my_model";

/// The original NKE pump file initialises its time variable, which the
/// analyser rejects.
pub fn is_legacy_nke_pump(file_name: &str, model_name: &str) -> bool {
    file_name == LEGACY_NKE_PUMP_FILE && model_name == LEGACY_NKE_PUMP_MODEL
}

/// Applies the known fix-ups for legacy input files and returns whether one was applied.
pub fn apply_legacy_patches(input: &Path, model: &mut impl EditableModel) -> bool {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    if !is_legacy_nke_pump(&file_name, model.name()) {
        return false;
    }
    if !model.remove_initial_value("main", "t") {
        warn!(
            "{} looks like the legacy NKE pump model but has no variable 't' in component 'main'",
            input.display()
        );
        return false;
    }
    info!("removed the initial value of main/t from legacy model {}", input.display());
    true
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{apply_legacy_patches, is_legacy_nke_pump};
    use crate::model::{Component, Model, Variable};

    fn model(name: &str) -> Model {
        let mut model = Model::new(name);
        let mut main = Component::new("main");
        main.variables.push(Variable::new("t", "second").with_initial_value("0"));
        model.components.push(main);
        model
    }

    #[test]
    fn predicate() {
        assert!(is_legacy_nke_pump("NKE_pump_orig.cellml", "my_model"));
        assert!(!is_legacy_nke_pump("NKE_pump.cellml", "my_model"));
        assert!(!is_legacy_nke_pump("NKE_pump_orig.cellml", "NKE_pump"));
        assert!(!is_legacy_nke_pump("nke_pump_orig.cellml", "my_model"));
    }

    #[test]
    fn patch_uses_base_name() {
        let mut m = model("my_model");
        assert!(apply_legacy_patches(Path::new("/data/models/NKE_pump_orig.cellml"), &mut m));
        assert_eq!(m.components[0].variables[0].initial_value, None);

        let mut m = model("my_model");
        assert!(!apply_legacy_patches(Path::new("/data/NKE_pump_orig.cellml/other.cellml"), &mut m));
        assert_eq!(m.components[0].variables[0].initial_value.as_deref(), Some("0"));
    }

    #[test]
    fn missing_time_variable_is_not_fatal() {
        let mut m = Model::new("my_model");
        assert!(!apply_legacy_patches(Path::new("NKE_pump_orig.cellml"), &mut m));
    }
}
