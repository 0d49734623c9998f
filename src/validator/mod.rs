use std::collections::{BTreeSet, HashSet};

use crate::ast::{Ast, OPERATORS};
use crate::issues::Issues;
use crate::model::{Component, Connection, Interface, Model, Units, Variable};
use crate::units::{is_standard_unit, is_valid_prefix, UnitsError, UnitsResolver};
use crate::utils::{identifier_problem, is_real_number};

/// Structural checks of a parsed model.
///
/// Every problem found is recorded as an error; the model is never modified.
#[derive(Debug, Default)]
pub struct Validator {
    issues: Issues,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issues(&self) -> &Issues {
        &self.issues
    }

    pub fn take_issues(&mut self) -> Issues {
        std::mem::take(&mut self.issues)
    }

    pub fn error_count(&self) -> usize {
        self.issues.error_count()
    }

    pub fn validate_model(&mut self, model: &Model) {
        self.issues = Issues::new();
        let mut resolver = UnitsResolver::new(model);

        if let Some(problem) = identifier_problem(&model.name) {
            self.issues.error(format!(
                "Model '{}' does not have a valid name attribute. {problem}",
                model.name
            ));
        }

        for name in duplicates(model.units.iter().map(|u| u.name.as_str())) {
            self.issues.error(format!(
                "Model '{}' contains multiple units with the name '{name}'. Valid units names must be unique to their model.",
                model.name
            ));
        }
        let mut cycles = BTreeSet::new();
        for units in &model.units {
            self.validate_units(units, &mut resolver, &mut cycles);
        }

        for name in duplicates(model.components.iter().map(|c| c.name.as_str())) {
            self.issues.error(format!(
                "Model '{}' contains multiple components with the name '{name}'. Valid component names must be unique to their model.",
                model.name
            ));
        }
        for component in &model.components {
            self.validate_component(model, component, &resolver);
        }

        for connection in &model.connections {
            self.validate_connection(model, connection, &mut resolver);
        }

        for import in &model.imports {
            if import.href.as_deref().map_or(true, |href| href.trim().is_empty()) {
                let what = import
                    .components
                    .iter()
                    .chain(import.units.iter())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("', '");
                self.issues.error(format!(
                    "Import of '{what}' does not have a valid locator xlink:href attribute."
                ));
            }
        }
    }

    fn validate_units(&mut self, units: &Units, resolver: &mut UnitsResolver, cycles: &mut BTreeSet<Vec<String>>) {
        let name = &units.name;
        if let Some(problem) = identifier_problem(name) {
            self.issues
                .error(format!("Units '{name}' does not have a valid name attribute. {problem}"));
        }
        if is_standard_unit(name) {
            self.issues
                .error(format!("Units is named '{name}' which is a protected standard unit name."));
        }
        if units.is_base_unit && !units.units.is_empty() {
            self.issues.error(format!(
                "Units '{name}' is a base unit and cannot also be defined by unit children."
            ));
        }
        for unit in &units.units {
            let reference = &unit.reference;
            if reference.is_empty() {
                self.issues
                    .error(format!("Unit in units '{name}' does not have a units reference."));
                continue;
            }
            if !resolver.is_defined(reference) {
                self.issues.error(format!(
                    "Units reference '{reference}' in units '{name}' is not a valid reference to a local units or a standard unit type."
                ));
            }
            if let Some(prefix) = &unit.prefix {
                if !is_valid_prefix(prefix) {
                    self.issues.error(format!(
                        "Prefix '{prefix}' of a unit referencing '{reference}' in units '{name}' is not a valid integer or an SI prefix."
                    ));
                }
            }
            if let Some(exponent) = &unit.exponent {
                if !is_real_number(exponent) {
                    self.issues.error(format!(
                        "Unit referencing '{reference}' in units '{name}' has an exponent with the value '{exponent}' that is not a representation of a CellML real valued number."
                    ));
                }
            }
            if let Some(multiplier) = &unit.multiplier {
                if !is_real_number(multiplier) {
                    self.issues.error(format!(
                        "Unit referencing '{reference}' in units '{name}' has a multiplier with the value '{multiplier}' that is not a representation of a CellML real valued number."
                    ));
                }
            }
        }
        if let Err(UnitsError::Cycle(cycle)) = resolver.resolve(name) {
            let mut members = cycle.clone();
            members.sort();
            members.dedup();
            if cycles.insert(members) {
                self.issues.error(format!(
                    "Cyclic units exist: '{}'.",
                    cycle.join("' -> '")
                ));
            }
        }
    }

    fn validate_component(&mut self, model: &Model, component: &Component, resolver: &UnitsResolver) {
        let c_name = &component.name;
        if let Some(problem) = identifier_problem(c_name) {
            self.issues.error(format!(
                "Component '{c_name}' does not have a valid name attribute. {problem}"
            ));
        }
        for name in duplicates(component.variables.iter().map(|v| v.name.as_str())) {
            self.issues.error(format!(
                "Component '{c_name}' contains multiple variables with the name '{name}'. Valid variable names must be unique to their component."
            ));
        }
        for variable in &component.variables {
            let v_name = &variable.name;
            if let Some(problem) = identifier_problem(v_name) {
                self.issues.error(format!(
                    "Variable '{v_name}' in component '{c_name}' does not have a valid name attribute. {problem}"
                ));
            }
            match variable.units.as_deref() {
                None | Some("") => self.issues.error(format!(
                    "Variable '{v_name}' in component '{c_name}' does not have any units specified."
                )),
                Some(units) if !resolver.is_defined(units) => self.issues.error(format!(
                    "Variable '{v_name}' in component '{c_name}' has a units reference '{units}' which is neither standard nor defined in the parent model."
                )),
                Some(_) => {}
            }
            if let Some(value) = &variable.initial_value {
                if !is_real_number(value) && component.variable(value).is_none() {
                    self.issues.error(format!(
                        "Variable '{v_name}' in component '{c_name}' has an invalid initial value '{value}'. Initial values must be a real number string or a variable reference."
                    ));
                }
            }
        }
        for expr in &component.math {
            self.validate_math(model, component, expr, resolver);
        }
    }

    fn validate_math(&mut self, model: &Model, component: &Component, expr: &Ast, resolver: &UnitsResolver) {
        let c_name = &component.name;
        let mut errors = Vec::new();
        expr.visit(&mut |node| match node {
            Ast::Ci(name) if component.variable(name).is_none() => errors.push(format!(
                "MathML ci element has the child text '{name}' which does not correspond with any variable names present in component '{c_name}'."
            )),
            Ast::Cn { value, units } => {
                match units.as_deref() {
                    None => errors.push(format!(
                        "Math cn element with the value '{value}' does not have a valid cellml:units attribute."
                    )),
                    Some(units) if !resolver.is_defined(units) => errors.push(format!(
                        "Math has a cn element with a cellml:units attribute '{units}' that is not a valid reference to units in the model '{}' or a standard unit.",
                        model.name
                    )),
                    Some(_) => {}
                }
                if !is_real_number(value) {
                    errors.push(format!(
                        "Math cn element in component '{c_name}' has the value '{value}' which is not a representation of a CellML real valued number."
                    ));
                }
            }
            Ast::Apply { op, .. } if !OPERATORS.contains(&op.as_str()) => errors.push(format!(
                "Math in component '{c_name}' has a '{op}' element that is not a supported MathML element."
            )),
            Ast::Unsupported(name) => errors.push(format!(
                "Math in component '{c_name}' has a '{name}' element that is not a supported MathML element."
            )),
            _ => {}
        });
        for error in errors {
            self.issues.error(error);
        }
    }

    fn validate_connection(&mut self, model: &Model, connection: &Connection, resolver: &mut UnitsResolver) {
        let c1_name = &connection.component_1;
        let c2_name = &connection.component_2;
        let c1 = model.component(c1_name);
        let c2 = model.component(c2_name);
        for (name, component) in [(c1_name, c1), (c2_name, c2)] {
            if component.is_none() {
                self.issues.error(format!(
                    "Connection in model '{}' references component '{name}' which does not exist.",
                    model.name
                ));
            }
        }
        if c1_name == c2_name {
            self.issues.error(format!(
                "Connection in model '{}' has the same component '{c1_name}' on both sides.",
                model.name
            ));
        }
        let (Some(c1), Some(c2)) = (c1, c2) else {
            return;
        };
        for (v1_name, v2_name) in &connection.variables {
            let v1 = c1.variable(v1_name);
            let v2 = c2.variable(v2_name);
            for (v_name, v, c) in [(v1_name, v1, c1_name), (v2_name, v2, c2_name)] {
                if v.is_none() {
                    self.issues.error(format!(
                        "Variable mapping in connection between '{c1_name}' and '{c2_name}' references variable '{v_name}' which is not in component '{c}'."
                    ));
                }
            }
            let (Some(v1), Some(v2)) = (v1, v2) else {
                continue;
            };
            match required_interfaces(model, c1_name, c2_name) {
                Some((i1, i2)) => {
                    self.check_interface(v1, c1_name, i1);
                    self.check_interface(v2, c2_name, i2);
                }
                None => self.issues.error(format!(
                    "Variable '{v1_name}' in component '{c1_name}' is equivalent to variable '{v2_name}' in component '{c2_name}', but the components are neither siblings nor in a parent/child relationship."
                )),
            }
            let (Some(u1), Some(u2)) = (v1.units.as_deref(), v2.units.as_deref()) else {
                continue;
            };
            if let (Ok(d1), Ok(d2)) = (resolver.resolve(u1), resolver.resolve(u2)) {
                if d1 != d2 {
                    self.issues.error(format!(
                        "Variable '{v1_name}' in component '{c1_name}' has units of '{u1}' and an equivalent variable '{v2_name}' in component '{c2_name}' with non-matching units of '{u2}'. The mismatch is: {d1} vs {d2}."
                    ));
                }
            }
        }
    }

    fn check_interface(&mut self, variable: &Variable, c_name: &str, required: Interface) {
        let v_name = &variable.name;
        let required_name = required.as_str();
        match variable.interface {
            interface if interface.allows(required) => {}
            Interface::None => self.issues.error(format!(
                "Variable '{v_name}' in component '{c_name}' has no interface type set. The interface type required is '{required_name}'."
            )),
            interface => self.issues.error(format!(
                "Variable '{v_name}' in component '{c_name}' has an interface type set to '{}' which is not the correct interface type for this variable. The interface type required is '{required_name}'.",
                interface.as_str()
            )),
        }
    }
}

/// Interfaces the mapped variables of `c1` and `c2` need, given the encapsulation hierarchy.
fn required_interfaces(model: &Model, c1: &str, c2: &str) -> Option<(Interface, Interface)> {
    let (p1, p2) = (model.parent_of(c1), model.parent_of(c2));
    if p1 == Some(c2) {
        Some((Interface::Public, Interface::Private))
    } else if p2 == Some(c1) {
        Some((Interface::Private, Interface::Public))
    } else if p1 == p2 {
        Some((Interface::Public, Interface::Public))
    } else {
        None
    }
}

fn duplicates<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    let mut reported = Vec::new();
    for name in names {
        if !seen.insert(name) && !reported.contains(&name) {
            reported.push(name);
        }
    }
    reported
}

pub fn validate_model(model: &Model) -> Issues {
    let mut validator = Validator::new();
    validator.validate_model(model);
    validator.take_issues()
}

#[cfg(test)]
mod tests {
    use super::validate_model;
    use crate::parser::Parser;

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<model xmlns="http://www.cellml.org/cellml/2.0#" xmlns:cellml="http://www.cellml.org/cellml/2.0#" name="pump">
{body}
</model>"#
        )
    }

    macro_rules! count {
        () => (0usize);
        ( $x:tt $($xs:tt)* ) => (1usize + count!($($xs)*));
    }

    macro_rules! validation_tests {
        ($($name:ident: $text:literal [$($error:literal,)*],)*) => {
        $(
            #[test]
            fn $name() {
                let text = wrap($text);
                let model = Parser::new(false).parse_model(&text);
                let issues = validate_model(&model);
                if count!($($error)*) == 0 {
                    assert!(!issues.has_errors(), "Should have succeeded: {}", issues);
                } else {
                    assert_eq!(issues.error_count(), count!($($error)*), "{}", issues);
                    $(
                        if !issues.has_error_contains($error) {
                            panic!("Expected error '{}' not found in '{}'", $error, issues);
                        }
                    )*
                }
            }
        )*
        }
    }

    validation_tests!(
        valid_model: r#"
            <units name="mM"><unit units="mole"/><unit units="litre" exponent="-1"/></units>
            <component name="main">
              <variable name="t" units="second"/>
              <variable name="Na_i" units="mM" initial_value="10"/>
              <variable name="Na_0" units="mM" initial_value="Na_i"/>
              <math xmlns="http://www.w3.org/1998/Math/MathML">
                <apply><eq/>
                  <apply><diff/><bvar><ci>t</ci></bvar><ci>Na_i</ci></apply>
                  <cn cellml:units="dimensionless">0</cn>
                </apply>
              </math>
            </component>
        "# [],
        empty_component: r#"<component name="c"/>"# [],
        duplicate_components: r#"<component name="c"/><component name="c"/>"# [
            "multiple components with the name 'c'",
        ],
        duplicate_variables: r#"
            <component name="c">
              <variable name="x" units="second"/>
              <variable name="x" units="second"/>
            </component>"# [
            "multiple variables with the name 'x'",
        ],
        missing_units: r#"
            <component name="c">
              <variable name="x"/>
              <variable name="y" units="furlong"/>
            </component>"# [
            "Variable 'x' in component 'c' does not have any units specified.",
            "units reference 'furlong' which is neither standard nor defined",
        ],
        bad_initial_value: r#"
            <component name="c">
              <variable name="x" units="second" initial_value="zero"/>
            </component>"# [
            "has an invalid initial value 'zero'",
        ],
        bad_units_definitions: r#"
            <units name="volt"><unit units="ampere"/></units>
            <units name="per_x"><unit units="x" prefix="mili" exponent="one"/></units>
            <units name="a"><unit units="b"/></units>
            <units name="b"><unit units="a"/></units>
        "# [
            "protected standard unit name",
            "Units reference 'x' in units 'per_x'",
            "Prefix 'mili'",
            "has an exponent with the value 'one'",
            "Cyclic units exist: 'a' -> 'b' -> 'a'.",
        ],
        math_references: r#"
            <component name="c">
              <variable name="x" units="second"/>
              <math xmlns="http://www.w3.org/1998/Math/MathML">
                <apply><eq/><ci>x</ci><apply><plus/><ci>y</ci><cn>1</cn></apply></apply>
                <apply><eq/><ci>x</ci><apply><csymbol/><cn cellml:units="second">2</cn></apply></apply>
              </math>
            </component>"# [
            "ci element has the child text 'y'",
            "cn element with the value '1' does not have a valid cellml:units attribute",
            "'csymbol' element that is not a supported MathML element",
        ],
        connections: r#"
            <component name="a"><variable name="v" units="volt" interface="public"/></component>
            <component name="b"><variable name="v" units="second" interface="public"/></component>
            <connection component_1="a" component_2="b">
              <map_variables variable_1="v" variable_2="v"/>
              <map_variables variable_1="v" variable_2="w"/>
            </connection>
            <connection component_1="a" component_2="missing"/>
            <connection component_1="a" component_2="a"/>
        "# [
            "non-matching units of 'second'",
            "references variable 'w' which is not in component 'b'",
            "references component 'missing' which does not exist",
            "has the same component 'a' on both sides",
        ],
        connection_without_interfaces: r#"
            <component name="a"><variable name="x" units="second" initial_value="1"/></component>
            <component name="b"><variable name="y" units="second"/></component>
            <connection component_1="a" component_2="b">
              <map_variables variable_1="x" variable_2="y"/>
            </connection>
        "# [
            "Variable 'x' in component 'a' has no interface type set. The interface type required is 'public'.",
            "Variable 'y' in component 'b' has no interface type set. The interface type required is 'public'.",
        ],
        encapsulated_connections: r#"
            <component name="cell"><variable name="V" units="volt" interface="private" initial_value="0"/></component>
            <component name="pump"><variable name="V" units="volt" interface="public"/></component>
            <component name="channel"><variable name="V" units="volt" interface="public_and_private"/></component>
            <encapsulation>
              <component_ref component="cell">
                <component_ref component="pump"/>
                <component_ref component="channel"/>
              </component_ref>
            </encapsulation>
            <connection component_1="cell" component_2="pump">
              <map_variables variable_1="V" variable_2="V"/>
            </connection>
            <connection component_1="channel" component_2="pump">
              <map_variables variable_1="V" variable_2="V"/>
            </connection>
        "# [],
        wrong_encapsulated_interfaces: r#"
            <component name="cell"><variable name="V" units="volt" interface="public" initial_value="0"/></component>
            <component name="pump"><variable name="V" units="volt" interface="public"/></component>
            <component name="other"><variable name="V" units="volt" interface="public"/></component>
            <encapsulation>
              <component_ref component="cell"><component_ref component="pump"/></component_ref>
            </encapsulation>
            <connection component_1="pump" component_2="cell">
              <map_variables variable_1="V" variable_2="V"/>
            </connection>
            <connection component_1="pump" component_2="other">
              <map_variables variable_1="V" variable_2="V"/>
            </connection>
        "# [
            "Variable 'V' in component 'cell' has an interface type set to 'public' which is not the correct interface type for this variable. The interface type required is 'private'.",
            "neither siblings nor in a parent/child relationship",
        ],
        import_without_href: r#"
            <import><component name="ext" component_ref="pump"/></import>
        "# [
            "Import of 'ext' does not have a valid locator",
        ],
    );

    #[test]
    fn unnamed_model() {
        let model = Parser::new(false).parse_model("<not xml");
        let issues = validate_model(&model);
        assert_eq!(issues.error_count(), 1);
        assert!(issues.has_error_contains("does not have a valid name attribute"));
    }
}
