use crate::analyser::{AnalysedModel, Analyser};
use crate::issues::Issues;
use crate::model::Model;
use crate::parser::Parser;
use crate::validator::Validator;

/// The few edits the converter makes to a parsed model.
pub trait EditableModel {
    fn name(&self) -> &str;

    /// Removes the initial value of `variable` in `component`, returns false
    /// if either does not exist.
    fn remove_initial_value(&mut self, component: &str, variable: &str) -> bool;
}

impl EditableModel for Model {
    fn name(&self) -> &str {
        &self.name
    }

    fn remove_initial_value(&mut self, component: &str, variable: &str) -> bool {
        self.component_mut(component)
            .and_then(|c| c.variable_mut(variable))
            .map(|v| {
                v.remove_initial_value();
            })
            .is_some()
    }
}

/// Parse, validate and analyse, the three services the conversion pipeline needs.
pub trait ModelToolkit {
    type Model: EditableModel;

    fn parse_model(&self, text: &str) -> (Self::Model, Issues);
    fn validate_model(&self, model: &Self::Model) -> Issues;
    fn analyse_model(&self, model: &Self::Model) -> Result<AnalysedModel, Issues>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CellmlToolkit;

impl ModelToolkit for CellmlToolkit {
    type Model = Model;

    fn parse_model(&self, text: &str) -> (Model, Issues) {
        let mut parser = Parser::new(false);
        let model = parser.parse_model(text);
        (model, parser.take_issues())
    }

    fn validate_model(&self, model: &Model) -> Issues {
        let mut validator = Validator::new();
        validator.validate_model(model);
        validator.take_issues()
    }

    fn analyse_model(&self, model: &Model) -> Result<AnalysedModel, Issues> {
        let mut analyser = Analyser::new();
        analyser.analyse_model(model);
        if analyser.error_count() > 0 {
            return Err(analyser.issues().clone());
        }
        Ok(analyser.model().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::EditableModel;
    use crate::model::{Component, Model, Variable};

    #[test]
    fn remove_initial_value() {
        let mut model = Model::new("my_model");
        let mut main = Component::new("main");
        main.variables.push(Variable::new("t", "second").with_initial_value("0"));
        model.components.push(main);

        assert_eq!(EditableModel::name(&model), "my_model");
        assert!(model.remove_initial_value("main", "t"));
        assert!(!model.components[0].variables[0].is_initialised());
        // already removed still counts as present
        assert!(model.remove_initial_value("main", "t"));
        assert!(!model.remove_initial_value("main", "x"));
        assert!(!model.remove_initial_value("other", "t"));
    }
}
