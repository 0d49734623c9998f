pub mod equivalence;
pub mod units_check;

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use log::debug;

use crate::ast::Ast;
use crate::issues::Issues;
use crate::model::{Model, Variable};
use crate::units::UnitsResolver;

pub use equivalence::EquivalenceSets;
pub use units_check::UnitsChecker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    VariableOfIntegration,
    State,
    Constant,
    ComputedConstant,
    Algebraic,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::VariableOfIntegration => "variable_of_integration",
            VariableType::State => "state",
            VariableType::Constant => "constant",
            VariableType::ComputedConstant => "computed_constant",
            VariableType::Algebraic => "algebraic",
        }
    }

    /// Position of the type in the analysed variable list.
    fn rank(&self) -> u8 {
        match self {
            VariableType::VariableOfIntegration => 0,
            VariableType::State => 1,
            VariableType::Constant => 2,
            VariableType::ComputedConstant => 3,
            VariableType::Algebraic => 4,
        }
    }

    fn is_time_dependent(&self) -> bool {
        matches!(
            self,
            VariableType::VariableOfIntegration | VariableType::State | VariableType::Algebraic
        )
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One equivalence set of the analysed model, represented by one of its variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysedVariable {
    component: String,
    variable: Variable,
    kind: VariableType,
}

impl AnalysedVariable {
    pub fn new(component: &str, variable: Variable, kind: VariableType) -> Self {
        Self {
            component: component.to_string(),
            variable,
            kind,
        }
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn kind(&self) -> VariableType {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.variable.name
    }

    pub fn units(&self) -> &str {
        self.variable.units_name()
    }

    /// The initial value as written, or an empty string.
    pub fn initial_value(&self) -> &str {
        self.variable.initial_value.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalysedModel {
    voi: Option<AnalysedVariable>,
    states: Vec<AnalysedVariable>,
    variables: Vec<AnalysedVariable>,
    issues: Issues,
}

impl AnalysedModel {
    pub fn new(
        voi: Option<AnalysedVariable>,
        states: Vec<AnalysedVariable>,
        variables: Vec<AnalysedVariable>,
    ) -> Self {
        Self {
            voi,
            states,
            variables,
            issues: Issues::new(),
        }
    }

    pub fn voi(&self) -> Option<&AnalysedVariable> {
        self.voi.as_ref()
    }

    pub fn states(&self) -> &[AnalysedVariable] {
        &self.states
    }

    /// Constants, then computed constants, then algebraic variables, each in document order.
    pub fn variables(&self) -> &[AnalysedVariable] {
        &self.variables
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn variable(&self, index: usize) -> Option<&AnalysedVariable> {
        self.variables.get(index)
    }

    /// Warnings raised while analysing, such as inconsistent units.
    pub fn issues(&self) -> &Issues {
        &self.issues
    }
}

struct Equation<'m> {
    component: usize,
    expr: &'m Ast,
    sets: Vec<usize>,
    // state set whose derivative this equation defines
    ode_of: Option<usize>,
}

/// Semantic analysis of a validated model: finds the variable of
/// integration and the states, checks the system of equations can be
/// solved, and classifies every remaining variable.
#[derive(Debug, Default)]
pub struct Analyser {
    issues: Issues,
    model: AnalysedModel,
}

impl Analyser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issues(&self) -> &Issues {
        &self.issues
    }

    pub fn error_count(&self) -> usize {
        self.issues.error_count()
    }

    pub fn model(&self) -> &AnalysedModel {
        &self.model
    }

    pub fn analyse_model(&mut self, model: &Model) {
        let mut analysis = Analysis::new(model);
        analysis.run();
        self.issues = analysis.issues;
        self.model = analysis.result.unwrap_or_default();
        self.model.issues = self.issues.clone();
    }
}

struct Analysis<'m> {
    model: &'m Model,
    sets: EquivalenceSets,
    issues: Issues,
    result: Option<AnalysedModel>,
}

impl<'m> Analysis<'m> {
    fn new(model: &'m Model) -> Self {
        Self {
            model,
            sets: EquivalenceSets::new(model),
            issues: Issues::new(),
            result: None,
        }
    }

    fn describe(&self, set: usize) -> String {
        let (c, v) = self.representative(set, None);
        let component = &self.model.components[c];
        format!(
            "Variable '{}' in component '{}'",
            component.variables[v].name, component.name
        )
    }

    fn variable(&self, (c, v): (usize, usize)) -> &'m Variable {
        &self.model.components[c].variables[v]
    }

    /// The initialised member, else the first member in `component`, else the first member.
    fn representative(&self, set: usize, component: Option<usize>) -> (usize, usize) {
        self.initialised_member(set)
            .or_else(|| component.and_then(|c| self.sets.members(set).find(|&(mc, _)| mc == c)))
            .or_else(|| self.sets.members(set).next())
            .unwrap_or((0, 0))
    }

    fn initialised_member(&self, set: usize) -> Option<(usize, usize)> {
        self.sets.members(set).find(|&m| self.variable(m).is_initialised())
    }

    fn collect_equations(&mut self) -> Vec<Equation<'m>> {
        let model = self.model;
        let mut equations = Vec::new();
        for (ci, component) in model.components.iter().enumerate() {
            for expr in &component.math {
                let args = match expr.as_apply() {
                    Some(("eq", args)) if args.len() == 2 => args,
                    _ => {
                        self.issues.error(format!(
                            "Math in component '{}' has a top-level expression '{expr}' which is not an equation.",
                            component.name
                        ));
                        continue;
                    }
                };
                let mut sets = Vec::new();
                let mut resolved = true;
                for name in expr.ci_names() {
                    match component.variable_index(name) {
                        Some(vi) => sets.push(self.sets.set_of(ci, vi)),
                        None => {
                            self.issues.error(format!(
                                "Equation '{expr}' in component '{}' references '{name}' which is not a variable of the component.",
                                component.name
                            ));
                            resolved = false;
                        }
                    }
                }
                if !resolved {
                    continue;
                }
                let ode_of = args
                    .iter()
                    .find_map(|side| side.as_derivative())
                    .and_then(|(state, _)| component.variable_index(state))
                    .map(|vi| self.sets.set_of(ci, vi));
                equations.push(Equation {
                    component: ci,
                    expr,
                    sets: sets.into_iter().unique().collect(),
                    ode_of,
                });
            }
        }
        equations
    }

    fn run(&mut self) {
        let model = self.model;
        if model.has_imports() {
            self.issues.error(format!(
                "Model '{}' has imports which must be resolved and flattened before it can be analysed.",
                model.name
            ));
            return;
        }

        for set in 0..self.sets.len() {
            let initialised: Vec<_> = self
                .sets
                .members(set)
                .filter(|&m| self.variable(m).is_initialised())
                .collect();
            if let [first, second, ..] = initialised.as_slice() {
                let (c1, c2) = (&model.components[first.0], &model.components[second.0]);
                self.issues.error(format!(
                    "Variable '{}' in component '{}' and variable '{}' in component '{}' are equivalent and cannot therefore both be initialised.",
                    self.variable(*first).name, c1.name, self.variable(*second).name, c2.name
                ));
            }
        }

        let equations = self.collect_equations();
        let mut kinds: Vec<Option<VariableType>> = vec![None; self.sets.len()];

        // variable of integration and states
        let mut voi: Option<usize> = None;
        let mut states = BTreeSet::new();
        for eq in &equations {
            let component = &model.components[eq.component];
            for (state, bvar) in eq.expr.derivatives() {
                let (Some(s), Some(t)) = (component.variable_index(state), component.variable_index(bvar)) else {
                    continue;
                };
                let (s, t) = (self.sets.set_of(eq.component, s), self.sets.set_of(eq.component, t));
                match voi {
                    Some(existing) if existing != t => {
                        let message = format!(
                            "{} and {} cannot both be the variable of integration.",
                            self.describe(existing),
                            self.describe(t).replacen("Variable", "variable", 1)
                        );
                        if !self.issues.has_error_contains(&message) {
                            self.issues.error(message);
                        }
                    }
                    Some(_) => {}
                    None => voi = Some(t),
                }
                states.insert(s);
            }
        }
        if let Some(t) = voi {
            if let Some(member) = self.initialised_member(t) {
                let component = &model.components[member.0];
                self.issues.error(format!(
                    "Variable '{}' in component '{}' cannot be both a variable of integration and initialised.",
                    self.variable(member).name, component.name
                ));
            }
            if states.contains(&t) {
                self.issues.error(format!(
                    "{} cannot be both a variable of integration and a state.",
                    self.describe(t)
                ));
            }
            kinds[t] = Some(VariableType::VariableOfIntegration);
        }
        let mut odes = vec![None; self.sets.len()];
        for (i, eq) in equations.iter().enumerate() {
            if let Some(s) = eq.ode_of {
                if odes[s].is_some() {
                    self.issues.error(format!("{} is computed more than once.", self.describe(s)));
                }
                odes[s] = Some(i);
            }
        }
        for &s in &states {
            if self.initialised_member(s).is_none() {
                self.issues
                    .error(format!("{} is used in an ODE, but it is not initialised.", self.describe(s)));
            }
            if odes[s].is_none() {
                self.issues.error(format!(
                    "{} is used in an ODE, but its differential equation is not defined.",
                    self.describe(s)
                ));
            }
            kinds[s].get_or_insert(VariableType::State);
        }
        for set in 0..self.sets.len() {
            if kinds[set].is_none() && self.initialised_member(set).is_some() {
                kinds[set] = Some(VariableType::Constant);
            }
        }

        // algebraic equations, solved one unknown at a time
        let mut computed_in: Vec<Option<usize>> = vec![None; self.sets.len()];
        let mut pending: Vec<usize> = (0..equations.len())
            .filter(|&i| equations[i].ode_of.is_none())
            .collect();
        let mut flagged = vec![false; self.sets.len()];
        loop {
            let mut progress = false;
            let mut still_pending = Vec::new();
            for &i in &pending {
                let eq = &equations[i];
                let unknowns: Vec<usize> = eq.sets.iter().copied().filter(|&s| kinds[s].is_none()).collect();
                match unknowns.as_slice() {
                    [] => {
                        let target = eq
                            .expr
                            .as_apply()
                            .and_then(|(_, args)| args.first())
                            .and_then(|lhs| lhs.as_ci())
                            .and_then(|name| model.components[eq.component].variable_index(name))
                            .map(|vi| self.sets.set_of(eq.component, vi))
                            .or_else(|| eq.sets.first().copied());
                        match target {
                            Some(target) if !flagged[target] => {
                                flagged[target] = true;
                                self.issues
                                    .error(format!("{} is computed more than once.", self.describe(target)));
                            }
                            Some(_) => {}
                            None => self.issues.error(format!(
                                "Equation '{}' in component '{}' does not reference any variable.",
                                eq.expr, model.components[eq.component].name
                            )),
                        }
                    }
                    [unknown] => {
                        let time_dependent = eq
                            .sets
                            .iter()
                            .filter(|&&s| s != *unknown)
                            .any(|&s| kinds[s].is_some_and(|k| k.is_time_dependent()));
                        kinds[*unknown] = Some(if time_dependent {
                            VariableType::Algebraic
                        } else {
                            VariableType::ComputedConstant
                        });
                        computed_in[*unknown] = Some(eq.component);
                        progress = true;
                    }
                    _ => still_pending.push(i),
                }
            }
            pending = still_pending;
            if !progress || pending.is_empty() {
                break;
            }
        }

        if !pending.is_empty() {
            let unknowns: Vec<usize> = pending
                .iter()
                .flat_map(|&i| equations[i].sets.iter().copied())
                .filter(|&s| kinds[s].is_none())
                .unique()
                .collect();
            if unknowns.len() == pending.len() {
                // a non-linear system, solved as a whole
                debug!(
                    "solving {} equations together for {}",
                    pending.len(),
                    unknowns.iter().map(|&s| self.describe(s)).join(", ")
                );
                let time_dependent = pending
                    .iter()
                    .flat_map(|&i| equations[i].sets.iter())
                    .any(|&s| kinds[s].is_some_and(|k| k.is_time_dependent()));
                for &s in &unknowns {
                    kinds[s] = Some(if time_dependent {
                        VariableType::Algebraic
                    } else {
                        VariableType::ComputedConstant
                    });
                    let component = pending
                        .iter()
                        .map(|&i| &equations[i])
                        .find(|eq| eq.sets.contains(&s))
                        .map(|eq| eq.component);
                    computed_in[s] = component;
                }
            } else {
                let status = if unknowns.len() > pending.len() {
                    "underconstrained"
                } else {
                    "overconstrained"
                };
                for &s in &unknowns {
                    flagged[s] = true;
                    self.issues.error(format!("{} is {status}.", self.describe(s)));
                }
            }
        }

        for set in 0..self.sets.len() {
            if kinds[set].is_none() && !flagged[set] {
                self.issues.error(format!("{} is not computed.", self.describe(set)));
            }
        }

        if self.issues.has_errors() {
            return;
        }
        self.result = Some(self.build_result(&kinds, &computed_in));
        self.check_units();
    }

    fn build_result(&self, kinds: &[Option<VariableType>], computed_in: &[Option<usize>]) -> AnalysedModel {
        let mut voi = None;
        let mut states = Vec::new();
        let mut variables = Vec::new();
        for (set, kind) in kinds.iter().enumerate() {
            let Some(kind) = *kind else {
                continue;
            };
            let (c, v) = self.representative(set, computed_in[set]);
            let analysed = AnalysedVariable::new(
                &self.model.components[c].name,
                self.variable((c, v)).clone(),
                kind,
            );
            match kind {
                VariableType::VariableOfIntegration => voi = Some(analysed),
                VariableType::State => states.push(analysed),
                _ => variables.push(analysed),
            }
        }
        // stable, so document order is kept within each type
        variables.sort_by_key(|v| v.kind().rank());
        AnalysedModel::new(voi, states, variables)
    }

    fn check_units(&mut self) {
        let mut resolver = UnitsResolver::new(self.model);
        let mut warnings = Vec::new();
        for component in &self.model.components {
            for expr in &component.math {
                warnings.extend(UnitsChecker::new(component, &mut resolver).check(expr));
            }
        }
        for warning in warnings {
            self.issues.warning(warning);
        }
    }
}
