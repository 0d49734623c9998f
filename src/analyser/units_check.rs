use crate::ast::Ast;
use crate::model::Component;
use crate::units::{Dimension, UnitsResolver};
use crate::utils::parse_real;

const DIMENSIONLESS_FUNCTIONS: &[&str] = &[
    "exp", "ln", "log", "sin", "cos", "tan", "sec", "csc", "cot", "sinh", "cosh", "tanh", "sech",
    "csch", "coth", "arcsin", "arccos", "arctan", "arcsec", "arccsc", "arccot", "arcsinh",
    "arccosh", "arctanh", "arcsech", "arccsch", "arccoth",
];

const RELATIONS: &[&str] = &["eq", "neq", "lt", "leq", "gt", "geq"];

/// Propagates base dimensions through the equations of one component and
/// records every place where they disagree.
pub struct UnitsChecker<'a, 'm> {
    component: &'a Component,
    resolver: &'a mut UnitsResolver<'m>,
    warnings: Vec<String>,
}

impl<'a, 'm> UnitsChecker<'a, 'm> {
    pub fn new(component: &'a Component, resolver: &'a mut UnitsResolver<'m>) -> Self {
        Self {
            component,
            resolver,
            warnings: Vec::new(),
        }
    }

    pub fn check(mut self, expr: &Ast) -> Vec<String> {
        self.dimension_of(expr);
        self.warnings
    }

    fn mismatch(&mut self, expr: &Ast, d1: &Dimension, d2: &Dimension) {
        self.warnings.push(format!(
            "The units in '{expr}' in component '{}' are not equivalent: '{d1}' and '{d2}'.",
            self.component.name
        ));
    }

    fn check_same(&mut self, expr: &Ast, dims: &[Option<Dimension>]) -> Option<Dimension> {
        let mut known = dims.iter().flatten();
        let first = known.next()?.clone();
        let mut mismatches = Vec::new();
        for other in known {
            if *other != first {
                mismatches.push(other.clone());
            }
        }
        for other in mismatches {
            self.mismatch(expr, &first, &other);
        }
        Some(first)
    }

    fn check_dimensionless(&mut self, expr: &Ast, dims: &[Option<Dimension>]) {
        let dimensionless = Dimension::dimensionless();
        for dim in dims.iter().flatten() {
            if !dim.is_dimensionless() {
                self.mismatch(expr, dim, &dimensionless);
            }
        }
    }

    fn dimension_of(&mut self, expr: &Ast) -> Option<Dimension> {
        match expr {
            Ast::Ci(name) => {
                let units = self.component.variable(name)?.units.as_deref()?;
                self.resolver.resolve(units).ok()
            }
            Ast::Cn { units, .. } => self.resolver.resolve(units.as_deref()?).ok(),
            Ast::Constant(name) => match name.as_str() {
                "true" | "false" => None,
                _ => Some(Dimension::dimensionless()),
            },
            Ast::Piecewise { pieces, otherwise } => {
                let mut dims = Vec::new();
                for (value, condition) in pieces {
                    dims.push(self.dimension_of(value));
                    self.dimension_of(condition);
                }
                if let Some(otherwise) = otherwise {
                    dims.push(self.dimension_of(otherwise));
                }
                self.check_same(expr, &dims)
            }
            Ast::Apply { op, args } => self.apply_dimension(expr, op, args),
            Ast::Bvar(_) | Ast::Degree(_) | Ast::LogBase(_) | Ast::Unsupported(_) => None,
        }
    }

    fn apply_dimension(&mut self, expr: &Ast, op: &str, args: &[Ast]) -> Option<Dimension> {
        if op == "diff" {
            let (state, voi) = expr.as_derivative()?;
            let state = self.dimension_of(&Ast::new_ci(state))?;
            let voi = self.dimension_of(&Ast::new_ci(voi))?;
            return Some(state.div(&voi));
        }
        let degree = args.iter().find_map(|a| match a {
            Ast::Degree(d) => Some(d.as_ref()),
            _ => None,
        });
        let operands: Vec<&Ast> = args
            .iter()
            .filter(|a| !matches!(a, Ast::Degree(_) | Ast::LogBase(_)))
            .collect();
        let dims: Vec<Option<Dimension>> = operands.iter().map(|a| self.dimension_of(a)).collect();
        match op {
            _ if RELATIONS.contains(&op) => {
                self.check_same(expr, &dims);
                None
            }
            "plus" | "minus" | "min" | "max" | "rem" => self.check_same(expr, &dims),
            "abs" | "floor" | "ceiling" => dims.first().cloned().flatten(),
            "times" => dims
                .iter()
                .try_fold(Dimension::dimensionless(), |acc, d| d.as_ref().map(|d| acc.mul(d))),
            "divide" => match dims.as_slice() {
                [Some(a), Some(b)] => Some(a.div(b)),
                _ => None,
            },
            "power" => {
                let base = dims.first().cloned().flatten()?;
                match operands.get(1).and_then(|e| constant_value(e)) {
                    Some(exponent) => Some(base.powf(exponent)),
                    None if base.is_dimensionless() => Some(base),
                    None => {
                        self.mismatch(expr, &base, &Dimension::dimensionless());
                        None
                    }
                }
            }
            "root" => {
                let base = dims.first().cloned().flatten()?;
                let degree = match degree {
                    Some(d) => constant_value(d)?,
                    None => 2.0,
                };
                Some(base.powf(1.0 / degree))
            }
            _ if DIMENSIONLESS_FUNCTIONS.contains(&op) => {
                self.check_dimensionless(expr, &dims);
                Some(Dimension::dimensionless())
            }
            // and, or, xor, not and anything unknown
            _ => None,
        }
    }
}

fn constant_value(expr: &Ast) -> Option<f64> {
    match expr {
        Ast::Cn { value, .. } => parse_real(value),
        Ast::Apply { op, args } if op == "minus" && args.len() == 1 => {
            constant_value(&args[0]).map(|v| -v)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::UnitsChecker;
    use crate::ast::Ast;
    use crate::model::{Component, Model, Unit, Units, Variable};
    use crate::units::UnitsResolver;

    fn model() -> Model {
        let mut model = Model::new("m");
        model.units.push(Units {
            name: "mV".to_string(),
            units: vec![Unit {
                reference: "volt".to_string(),
                prefix: Some("milli".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        });
        let mut main = Component::new("main");
        main.variables.push(Variable::new("t", "second"));
        main.variables.push(Variable::new("V", "mV"));
        main.variables.push(Variable::new("E", "volt"));
        main.variables.push(Variable::new("tau", "second"));
        model.components.push(main);
        model
    }

    fn check(model: &Model, expr: &Ast) -> Vec<String> {
        let mut resolver = UnitsResolver::new(model);
        UnitsChecker::new(&model.components[0], &mut resolver).check(expr)
    }

    #[test]
    fn consistent_ode() {
        let model = model();
        // dV/dt = (E - V) / tau
        let expr = Ast::new_apply(
            "eq",
            vec![
                Ast::new_apply(
                    "diff",
                    vec![Ast::Bvar(Box::new(Ast::new_ci("t"))), Ast::new_ci("V")],
                ),
                Ast::new_apply(
                    "divide",
                    vec![
                        Ast::new_apply("minus", vec![Ast::new_ci("E"), Ast::new_ci("V")]),
                        Ast::new_ci("tau"),
                    ],
                ),
            ],
        );
        assert_eq!(check(&model, &expr), Vec::<String>::new());
    }

    #[test]
    fn inconsistent_sum_and_exponential() {
        let model = model();
        // V = t + exp(tau)
        let expr = Ast::new_apply(
            "eq",
            vec![
                Ast::new_ci("V"),
                Ast::new_apply(
                    "plus",
                    vec![
                        Ast::new_ci("t"),
                        Ast::new_apply("exp", vec![Ast::new_ci("tau")]),
                    ],
                ),
            ],
        );
        let warnings = check(&model, &expr);
        // t + exp(tau): second vs dimensionless, exp(second), then V vs second
        assert_eq!(warnings.len(), 3, "{warnings:?}");
        assert!(warnings.iter().all(|w| w.contains("component 'main'")));
    }

    #[test]
    fn power_with_constant_exponent() {
        let model = model();
        // E = root(power(E, 2))
        let expr = Ast::new_apply(
            "eq",
            vec![
                Ast::new_ci("E"),
                Ast::new_apply(
                    "root",
                    vec![Ast::new_apply(
                        "power",
                        vec![Ast::new_ci("E"), Ast::new_cn("2", "dimensionless")],
                    )],
                ),
            ],
        );
        assert!(check(&model, &expr).is_empty());
    }
}
