use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::model::Model;
use crate::utils::parse_real;

const AMPERE: &str = "ampere";
const CANDELA: &str = "candela";
const KELVIN: &str = "kelvin";
const KILOGRAM: &str = "kilogram";
const METRE: &str = "metre";
const MOLE: &str = "mole";
const SECOND: &str = "second";

// name, [(base, exponent)]
const STANDARD_UNITS: &[(&str, &[(&str, f64)])] = &[
    ("ampere", &[(AMPERE, 1.0)]),
    ("becquerel", &[(SECOND, -1.0)]),
    ("candela", &[(CANDELA, 1.0)]),
    ("celsius", &[(KELVIN, 1.0)]),
    ("coulomb", &[(AMPERE, 1.0), (SECOND, 1.0)]),
    ("dimensionless", &[]),
    ("farad", &[(AMPERE, 2.0), (KILOGRAM, -1.0), (METRE, -2.0), (SECOND, 4.0)]),
    ("gram", &[(KILOGRAM, 1.0)]),
    ("gray", &[(METRE, 2.0), (SECOND, -2.0)]),
    ("henry", &[(AMPERE, -2.0), (KILOGRAM, 1.0), (METRE, 2.0), (SECOND, -2.0)]),
    ("hertz", &[(SECOND, -1.0)]),
    ("joule", &[(KILOGRAM, 1.0), (METRE, 2.0), (SECOND, -2.0)]),
    ("katal", &[(MOLE, 1.0), (SECOND, -1.0)]),
    ("kelvin", &[(KELVIN, 1.0)]),
    ("kilogram", &[(KILOGRAM, 1.0)]),
    ("liter", &[(METRE, 3.0)]),
    ("litre", &[(METRE, 3.0)]),
    ("lumen", &[(CANDELA, 1.0)]),
    ("lux", &[(CANDELA, 1.0), (METRE, -2.0)]),
    ("meter", &[(METRE, 1.0)]),
    ("metre", &[(METRE, 1.0)]),
    ("mole", &[(MOLE, 1.0)]),
    ("newton", &[(KILOGRAM, 1.0), (METRE, 1.0), (SECOND, -2.0)]),
    ("ohm", &[(AMPERE, -2.0), (KILOGRAM, 1.0), (METRE, 2.0), (SECOND, -3.0)]),
    ("pascal", &[(KILOGRAM, 1.0), (METRE, -1.0), (SECOND, -2.0)]),
    ("radian", &[]),
    ("second", &[(SECOND, 1.0)]),
    ("siemens", &[(AMPERE, 2.0), (KILOGRAM, -1.0), (METRE, -2.0), (SECOND, 3.0)]),
    ("sievert", &[(METRE, 2.0), (SECOND, -2.0)]),
    ("steradian", &[]),
    ("tesla", &[(AMPERE, -1.0), (KILOGRAM, 1.0), (SECOND, -2.0)]),
    ("volt", &[(AMPERE, -1.0), (KILOGRAM, 1.0), (METRE, 2.0), (SECOND, -3.0)]),
    ("watt", &[(KILOGRAM, 1.0), (METRE, 2.0), (SECOND, -3.0)]),
    ("weber", &[(AMPERE, -1.0), (KILOGRAM, 1.0), (METRE, 2.0), (SECOND, -2.0)]),
];

const SI_PREFIXES: &[&str] = &[
    "yotta", "zetta", "exa", "peta", "tera", "giga", "mega", "kilo", "hecto", "deca", "deci",
    "centi", "milli", "micro", "nano", "pico", "femto", "atto", "zepto", "yocto",
];

pub fn is_standard_unit(name: &str) -> bool {
    STANDARD_UNITS.iter().any(|(n, _)| *n == name)
}

pub fn is_valid_prefix(prefix: &str) -> bool {
    SI_PREFIXES.contains(&prefix) || prefix.trim().parse::<i32>().is_ok()
}

fn standard_dimension(name: &str) -> Option<Dimension> {
    STANDARD_UNITS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, bases)| {
            let mut dim = Dimension::dimensionless();
            for (base, exponent) in bases.iter() {
                dim.exponents.insert(base.to_string(), *exponent);
            }
            dim
        })
}

/// Exponents of base units. Scale factors (prefixes, multipliers) are not tracked.
#[derive(Debug, Clone, Default)]
pub struct Dimension {
    exponents: BTreeMap<String, f64>,
}

impl Dimension {
    pub fn dimensionless() -> Self {
        Self::default()
    }

    pub fn base(name: &str) -> Self {
        Self {
            exponents: BTreeMap::from([(name.to_string(), 1.0)]),
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exponents.values().all(|e| e.abs() < 1e-12)
    }

    pub fn mul(&self, other: &Dimension) -> Dimension {
        let mut ret = self.clone();
        for (base, exponent) in &other.exponents {
            *ret.exponents.entry(base.clone()).or_insert(0.0) += exponent;
        }
        ret.exponents.retain(|_, e| e.abs() >= 1e-12);
        ret
    }

    pub fn div(&self, other: &Dimension) -> Dimension {
        self.mul(&other.powf(-1.0))
    }

    pub fn powf(&self, power: f64) -> Dimension {
        let mut ret = self.clone();
        ret.exponents.values_mut().for_each(|e| *e *= power);
        ret.exponents.retain(|_, e| e.abs() >= 1e-12);
        ret
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        self.div(other).is_dimensionless()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "dimensionless");
        }
        let parts: Vec<String> = self
            .exponents
            .iter()
            .map(|(base, e)| {
                if *e == 1.0 {
                    base.clone()
                } else {
                    format!("{base}^{e}")
                }
            })
            .collect();
        write!(f, "{}", parts.join("*"))
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum UnitsError {
    #[error("'{0}' is neither a standard unit nor defined in the model")]
    Unknown(String),
    #[error("cyclic units definition: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    #[error("units '{units}' has an invalid exponent '{value}'")]
    InvalidExponent { units: String, value: String },
}

/// Resolves units names of one model to base dimensions, caching results.
pub struct UnitsResolver<'m> {
    model: &'m Model,
    cache: HashMap<String, Dimension>,
}

impl<'m> UnitsResolver<'m> {
    pub fn new(model: &'m Model) -> Self {
        Self {
            model,
            cache: HashMap::new(),
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.model.units_named(name).is_some() || is_standard_unit(name)
    }

    pub fn resolve(&mut self, name: &str) -> Result<Dimension, UnitsError> {
        let mut stack = Vec::new();
        self.resolve_inner(name, &mut stack)
    }

    fn resolve_inner(&mut self, name: &str, stack: &mut Vec<String>) -> Result<Dimension, UnitsError> {
        if let Some(dim) = self.cache.get(name) {
            return Ok(dim.clone());
        }
        let Some(units) = self.model.units_named(name) else {
            return standard_dimension(name).ok_or_else(|| UnitsError::Unknown(name.to_string()));
        };
        if stack.iter().any(|s| s == name) {
            let mut cycle = stack.clone();
            cycle.push(name.to_string());
            return Err(UnitsError::Cycle(cycle));
        }
        stack.push(name.to_string());
        let dim = if units.is_base_unit {
            Dimension::base(name)
        } else {
            let mut dim = Dimension::dimensionless();
            for unit in &units.units {
                let exponent = match &unit.exponent {
                    None => 1.0,
                    Some(value) => parse_real(value).ok_or_else(|| UnitsError::InvalidExponent {
                        units: name.to_string(),
                        value: value.clone(),
                    })?,
                };
                dim = dim.mul(&self.resolve_inner(&unit.reference, stack)?.powf(exponent));
            }
            dim
        };
        stack.pop();
        self.cache.insert(name.to_string(), dim.clone());
        Ok(dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Unit, Units};

    fn units(name: &str, parts: &[(&str, Option<&str>)]) -> Units {
        Units {
            name: name.to_string(),
            is_base_unit: false,
            units: parts
                .iter()
                .map(|(reference, exponent)| Unit {
                    reference: reference.to_string(),
                    exponent: exponent.map(str::to_string),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn standard_units() {
        assert!(is_standard_unit("volt"));
        assert!(!is_standard_unit("mV"));
        assert!(is_valid_prefix("milli"));
        assert!(is_valid_prefix("-3"));
        assert!(!is_valid_prefix("mili"));
        let volt = standard_dimension("volt").unwrap();
        let watt = standard_dimension("watt").unwrap();
        let ampere = standard_dimension("ampere").unwrap();
        assert_eq!(volt.mul(&ampere), watt);
        assert!(standard_dimension("radian").unwrap().is_dimensionless());
    }

    #[test]
    fn resolve_model_units() {
        let mut model = Model::new("m");
        model.units.push(units("mM", &[("mole", None), ("litre", Some("-1"))]));
        model.units.push(units("mM_per_s", &[("mM", None), ("second", Some("-1"))]));
        let mut resolver = UnitsResolver::new(&model);
        let rate = resolver.resolve("mM_per_s").unwrap();
        let expected = standard_dimension("mole")
            .unwrap()
            .div(&standard_dimension("litre").unwrap())
            .div(&standard_dimension("second").unwrap());
        assert_eq!(rate, expected);
        assert_eq!(rate.to_string(), "metre^-3*mole*second^-1");
        assert_eq!(
            resolver.resolve("furlong"),
            Err(UnitsError::Unknown("furlong".to_string()))
        );
    }

    #[test]
    fn cycles_and_base_units() {
        let mut model = Model::new("m");
        model.units.push(units("a", &[("b", None)]));
        model.units.push(units("b", &[("a", Some("2"))]));
        model.units.push(Units {
            name: "cell".to_string(),
            is_base_unit: true,
            units: Vec::new(),
        });
        let mut resolver = UnitsResolver::new(&model);
        assert!(matches!(resolver.resolve("a"), Err(UnitsError::Cycle(c)) if c == ["a", "b", "a"]));
        assert_eq!(resolver.resolve("cell").unwrap(), Dimension::base("cell"));
    }
}
