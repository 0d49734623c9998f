use std::fmt;

use crate::ast::Ast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellmlVersion {
    V1_0,
    V1_1,
    V2_0,
}

impl CellmlVersion {
    pub fn from_namespace(ns: &str) -> Option<Self> {
        match ns {
            "http://www.cellml.org/cellml/1.0#" => Some(Self::V1_0),
            "http://www.cellml.org/cellml/1.1#" => Some(Self::V1_1),
            "http://www.cellml.org/cellml/2.0#" => Some(Self::V2_0),
            _ => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        !matches!(self, Self::V2_0)
    }
}

impl fmt::Display for CellmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::V1_0 => write!(f, "1.0"),
            Self::V1_1 => write!(f, "1.1"),
            Self::V2_0 => write!(f, "2.0"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interface {
    #[default]
    None,
    Public,
    Private,
    PublicAndPrivate,
}

impl Interface {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "none" => Some(Self::None),
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            "public_and_private" => Some(Self::PublicAndPrivate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Public => "public",
            Self::Private => "private",
            Self::PublicAndPrivate => "public_and_private",
        }
    }

    /// Whether a variable with this interface exposes `required` (`Public` or `Private`).
    pub fn allows(&self, required: Interface) -> bool {
        *self == required || *self == Self::PublicAndPrivate
    }

    // CellML 1.x splits the interface into two "in"/"out"/"none" attributes
    pub fn from_legacy(public: Option<&str>, private: Option<&str>) -> Self {
        let is_set = |s: Option<&str>| matches!(s, Some("in") | Some("out"));
        match (is_set(public), is_set(private)) {
            (true, true) => Self::PublicAndPrivate,
            (true, false) => Self::Public,
            (false, true) => Self::Private,
            (false, false) => Self::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub units: Option<String>,
    pub initial_value: Option<String>,
    pub interface: Interface,
}

impl Variable {
    pub fn new(name: &str, units: &str) -> Self {
        Self {
            name: name.to_string(),
            units: Some(units.to_string()),
            initial_value: None,
            interface: Interface::None,
        }
    }

    pub fn with_initial_value(mut self, value: &str) -> Self {
        self.initial_value = Some(value.to_string());
        self
    }

    pub fn units_name(&self) -> &str {
        self.units.as_deref().unwrap_or("")
    }

    pub fn is_initialised(&self) -> bool {
        self.initial_value.is_some()
    }

    pub fn remove_initial_value(&mut self) -> Option<String> {
        self.initial_value.take()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Component {
    pub name: String,
    pub variables: Vec<Variable>,
    pub math: Vec<Ast>,
    pub skipped_reactions: usize,
}

impl Component {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }
}

/// One `<unit>` child of a units definition, attributes kept as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Unit {
    pub reference: String,
    pub prefix: Option<String>,
    pub exponent: Option<String>,
    pub multiplier: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Units {
    pub name: String,
    pub is_base_unit: bool,
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Default)]
pub struct Connection {
    pub component_1: String,
    pub component_2: String,
    pub variables: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct Import {
    pub href: Option<String>,
    pub components: Vec<String>,
    pub units: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub version: CellmlVersion,
    pub units: Vec<Units>,
    pub components: Vec<Component>,
    pub connections: Vec<Connection>,
    pub imports: Vec<Import>,
    /// Encapsulation hierarchy as `(parent, child)` component names.
    pub encapsulation: Vec<(String, String)>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: CellmlVersion::V2_0,
            units: Vec::new(),
            components: Vec::new(),
            connections: Vec::new(),
            imports: Vec::new(),
            encapsulation: Vec::new(),
        }
    }
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn component_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.name == name)
    }

    pub fn component_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name == name)
    }

    pub fn units_named(&self, name: &str) -> Option<&Units> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn parent_of(&self, component: &str) -> Option<&str> {
        self.encapsulation
            .iter()
            .find(|(_, child)| child == component)
            .map(|(parent, _)| parent.as_str())
    }

    pub fn has_imports(&self) -> bool {
        !self.imports.is_empty()
    }

    pub fn variable_count(&self) -> usize {
        self.components.iter().map(|c| c.variables.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_interface_mapping() {
        assert_eq!(Interface::from_legacy(Some("out"), None), Interface::Public);
        assert_eq!(Interface::from_legacy(Some("none"), Some("in")), Interface::Private);
        assert_eq!(
            Interface::from_legacy(Some("in"), Some("out")),
            Interface::PublicAndPrivate
        );
        assert_eq!(Interface::from_legacy(None, None), Interface::None);
    }

    #[test]
    fn remove_initial_value() {
        let mut model = Model::new("m");
        let mut main = Component::new("main");
        main.variables.push(Variable::new("t", "second").with_initial_value("0"));
        model.components.push(main);

        let t = model.component_mut("main").unwrap().variable_mut("t").unwrap();
        assert_eq!(t.remove_initial_value().as_deref(), Some("0"));
        assert!(!model.component("main").unwrap().variable("t").unwrap().is_initialised());
    }
}
