pub mod mathml;
pub mod xml;

use log::debug;

use crate::issues::{Issue, Issues};
use crate::model::{CellmlVersion, Component, Connection, Import, Interface, Model, Unit, Units, Variable};

use self::mathml::{parse_math, MATHML_NS};
use self::xml::{parse_document, Element};

/// Reads CellML text into a [`Model`].
///
/// Problems never abort parsing; they are collected in [`Parser::issues`] and
/// the model holds whatever could be read. A non-strict parser accepts CellML
/// 1.0 and 1.1 documents and reads them as CellML 2.0.
#[derive(Debug, Default)]
pub struct Parser {
    strict: bool,
    issues: Issues,
}

impl Parser {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            issues: Issues::new(),
        }
    }

    pub fn issues(&self) -> &Issues {
        &self.issues
    }

    pub fn take_issues(&mut self) -> Issues {
        std::mem::take(&mut self.issues)
    }

    pub fn parse_model(&mut self, text: &str) -> Model {
        self.issues = Issues::new();
        let root = match parse_document(text) {
            Ok(root) => root,
            Err(e) => {
                debug!("xml error: {e}");
                self.issues.error(
                    "Could not get a valid XML root node from the provided input.".to_string(),
                );
                return Model::default();
            }
        };
        if root.name != "model" {
            self.issues.error(format!(
                "Model element is of invalid type '{}'. A valid CellML root node should be of type 'model'.",
                root.name
            ));
            return Model::default();
        }
        let version = match root.namespace.as_deref().and_then(CellmlVersion::from_namespace) {
            Some(version) => version,
            None => {
                self.issues.error(format!(
                    "Model element is in an invalid namespace '{}'.",
                    root.namespace.as_deref().unwrap_or("")
                ));
                if self.strict {
                    return Model::default();
                }
                CellmlVersion::V2_0
            }
        };
        if version.is_legacy() {
            if self.strict {
                self.issues.error(format!(
                    "Given model is a CellML {version} model, which a strict parser does not read."
                ));
                return Model::default();
            }
            self.issues.push(Issue::message(format!(
                "Given model is a CellML {version} model, the parser will try to represent this model in CellML 2.0."
            )));
        }

        let mut model = Model {
            name: root.attr("name").unwrap_or("").to_string(),
            version,
            ..Default::default()
        };
        let cellml_ns = root.namespace.clone();
        for child in root.elements() {
            if child.namespace != cellml_ns {
                // RDF, documentation and other foreign annotations
                continue;
            }
            match child.name.as_str() {
                "units" => model.units.push(self.parse_units(child)),
                "component" => {
                    let (component, local_units) = self.parse_component(child, version);
                    for units in local_units {
                        self.lift_units(&mut model, units);
                    }
                    model.components.push(component);
                }
                "connection" => model.connections.push(self.parse_connection(child, version)),
                "import" => model.imports.push(self.parse_import(child)),
                "encapsulation" => self.parse_component_refs(child, None, &mut model.encapsulation),
                "group" if version.is_legacy() => {
                    let is_encapsulation = child.elements().any(|e| {
                        e.name == "relationship_ref" && e.attr("relationship") == Some("encapsulation")
                    });
                    if is_encapsulation {
                        self.parse_component_refs(child, None, &mut model.encapsulation);
                    } else {
                        debug!("ignoring non-encapsulation group of model '{}'", model.name)
                    }
                }
                name => self.issues.error(format!(
                    "Model '{}' has an invalid child element '{name}'.",
                    model.name
                )),
            }
        }
        model
    }

    // CellML 1.x allows units inside components; CellML 2.0 only at model level.
    fn lift_units(&mut self, model: &mut Model, units: Units) {
        if model.units_named(&units.name).is_some() {
            self.issues.warning(format!(
                "Component-level units '{}' clash with model-level units of the same name and were dropped.",
                units.name
            ));
        } else {
            model.units.push(units);
        }
    }

    fn parse_units(&mut self, element: &Element) -> Units {
        let name = element.attr("name").unwrap_or("").to_string();
        let is_base_unit = element.attr("base_unit") == Some("yes");
        let mut units = Vec::new();
        for child in element.elements() {
            if child.name != "unit" {
                self.issues.error(format!(
                    "Units '{name}' has an invalid child element '{}'.",
                    child.name
                ));
                continue;
            }
            units.push(Unit {
                reference: child.attr("units").unwrap_or("").to_string(),
                prefix: child.attr("prefix").map(str::to_string),
                exponent: child.attr("exponent").map(str::to_string),
                multiplier: child.attr("multiplier").map(str::to_string),
            });
        }
        Units {
            name,
            is_base_unit,
            units,
        }
    }

    fn parse_component(&mut self, element: &Element, version: CellmlVersion) -> (Component, Vec<Units>) {
        let mut component = Component::new(element.attr("name").unwrap_or(""));
        let mut local_units = Vec::new();
        for child in element.elements() {
            if child.name != "math" && child.namespace != element.namespace {
                continue;
            }
            match child.name.as_str() {
                "variable" => component.variables.push(self.parse_variable(child, version)),
                "math" => {
                    if child.namespace.as_deref() != Some(MATHML_NS) {
                        self.issues.warning(format!(
                            "Math in component '{}' is not in the MathML namespace.",
                            component.name
                        ));
                    }
                    component.math.extend(parse_math(child));
                }
                "units" if version.is_legacy() => local_units.push(self.parse_units(child)),
                "reaction" if version.is_legacy() => {
                    component.skipped_reactions += 1;
                    self.issues.warning(format!(
                        "Component '{}' has a reaction element which is not supported and was skipped.",
                        component.name
                    ));
                }
                name => self.issues.error(format!(
                    "Component '{}' has an invalid child element '{name}'.",
                    component.name
                )),
            }
        }
        (component, local_units)
    }

    fn parse_variable(&mut self, element: &Element, version: CellmlVersion) -> Variable {
        let name = element.attr("name").unwrap_or("").to_string();
        let interface = if version.is_legacy() {
            Interface::from_legacy(element.attr("public_interface"), element.attr("private_interface"))
        } else {
            match element.attr("interface") {
                None => Interface::None,
                Some(text) => Interface::parse(text).unwrap_or_else(|| {
                    self.issues.error(format!(
                        "Variable '{name}' has an invalid interface attribute value '{text}'."
                    ));
                    Interface::None
                }),
            }
        };
        Variable {
            units: element.attr("units").map(str::to_string),
            initial_value: element.attr("initial_value").map(str::to_string),
            interface,
            name,
        }
    }

    fn parse_connection(&mut self, element: &Element, version: CellmlVersion) -> Connection {
        let mut connection = Connection {
            component_1: element.attr("component_1").unwrap_or("").to_string(),
            component_2: element.attr("component_2").unwrap_or("").to_string(),
            variables: Vec::new(),
        };
        for child in element.elements() {
            match child.name.as_str() {
                "map_components" if version.is_legacy() => {
                    connection.component_1 = child.attr("component_1").unwrap_or("").to_string();
                    connection.component_2 = child.attr("component_2").unwrap_or("").to_string();
                }
                "map_variables" => connection.variables.push((
                    child.attr("variable_1").unwrap_or("").to_string(),
                    child.attr("variable_2").unwrap_or("").to_string(),
                )),
                name => self.issues.error(format!(
                    "Connection has an invalid child element '{name}'."
                )),
            }
        }
        connection
    }

    // nested component_ref elements, each child encapsulated by its enclosing ref
    fn parse_component_refs(
        &mut self,
        element: &Element,
        parent: Option<&str>,
        hierarchy: &mut Vec<(String, String)>,
    ) {
        for child in element.elements() {
            match child.name.as_str() {
                "component_ref" => {
                    let Some(name) = child.attr("component") else {
                        self.issues
                            .error("Encapsulation component_ref does not have a component attribute.".to_string());
                        continue;
                    };
                    if let Some(parent) = parent {
                        hierarchy.push((parent.to_string(), name.to_string()));
                    }
                    self.parse_component_refs(child, Some(name), hierarchy);
                }
                "relationship_ref" if parent.is_none() => {}
                other => self.issues.error(format!(
                    "Encapsulation has an invalid child element '{other}'."
                )),
            }
        }
    }

    fn parse_import(&mut self, element: &Element) -> Import {
        let mut import = Import {
            href: element.attr("href").map(str::to_string),
            ..Default::default()
        };
        for child in element.elements() {
            let name = child.attr("name").unwrap_or("").to_string();
            match child.name.as_str() {
                "component" => import.components.push(name),
                "units" => import.units.push(name),
                other => self.issues.error(format!(
                    "Import has an invalid child element '{other}'."
                )),
            }
        }
        import
    }
}
