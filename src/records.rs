use std::fmt;

use crate::analyser::{AnalysedModel, VariableType};

/// How a kept variable is exposed to the assembly tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Variable,
    Constant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Variable => "variable",
            Role::Constant => "constant",
        }
    }

    pub fn for_type(kind: VariableType) -> Option<Self> {
        match kind {
            VariableType::Algebraic => Some(Role::Variable),
            VariableType::Constant => Some(Role::Constant),
            VariableType::VariableOfIntegration
            | VariableType::State
            | VariableType::ComputedConstant => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub name: String,
    pub units: String,
    pub role: Role,
    pub initial_value: String,
}

impl VariableRecord {
    pub fn new(name: &str, units: &str, role: Role, initial_value: &str) -> Self {
        Self {
            name: name.to_string(),
            units: units.to_string(),
            role,
            initial_value: initial_value.to_string(),
        }
    }
}

/// Algebraic variables and constants of `model`, in analysis order.
pub fn collect_records(model: &AnalysedModel) -> Vec<VariableRecord> {
    model
        .variables()
        .iter()
        .filter_map(|v| {
            let role = Role::for_type(v.kind())?;
            Some(VariableRecord::new(v.name(), v.units(), role, v.initial_value()))
        })
        .collect()
}
