use crate::ast::{Ast, CONSTANTS};

use super::xml::{Element, Node};

pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// Top-level expressions of a `<math>` element.
pub fn parse_math(math: &Element) -> Vec<Ast> {
    math.elements().map(parse_node).collect()
}

pub fn parse_node(element: &Element) -> Ast {
    match element.name.as_str() {
        "apply" => parse_apply(element),
        "ci" => Ast::Ci(element.text()),
        "cn" => Ast::Cn {
            value: parse_cn_value(element),
            units: element.attr("units").map(str::to_string),
        },
        "bvar" => parse_qualifier(element, Ast::Bvar),
        "degree" => parse_qualifier(element, Ast::Degree),
        "logbase" => parse_qualifier(element, Ast::LogBase),
        "piecewise" => parse_piecewise(element),
        name if CONSTANTS.contains(&name) => Ast::Constant(name.to_string()),
        name => Ast::Unsupported(name.to_string()),
    }
}

fn parse_apply(element: &Element) -> Ast {
    let mut children = element.elements();
    match children.next() {
        Some(op) => Ast::Apply {
            op: op.name.clone(),
            args: children.map(parse_node).collect(),
        },
        None => Ast::Unsupported("apply".to_string()),
    }
}

fn parse_qualifier(element: &Element, wrap: fn(Box<Ast>) -> Ast) -> Ast {
    match element.first_element() {
        Some(child) => wrap(Box::new(parse_node(child))),
        None => Ast::Unsupported(element.name.clone()),
    }
}

// `<cn type="e-notation">1.2<sep/>3</cn>` is 1.2e3
fn parse_cn_value(element: &Element) -> String {
    if element.attr("type") != Some("e-notation") {
        return element.text();
    }
    let mut mantissa = String::new();
    let mut exponent = String::new();
    let mut seen_sep = false;
    for child in &element.children {
        match child {
            Node::Element(e) if e.name == "sep" => seen_sep = true,
            Node::Text(t) if seen_sep => exponent.push_str(t.trim()),
            Node::Text(t) => mantissa.push_str(t.trim()),
            Node::Element(_) => {}
        }
    }
    format!("{mantissa}e{exponent}")
}

fn parse_piecewise(element: &Element) -> Ast {
    let mut pieces = Vec::new();
    let mut otherwise = None;
    for child in element.elements() {
        match child.name.as_str() {
            "piece" => {
                let mut parts = child.elements().map(parse_node);
                match (parts.next(), parts.next()) {
                    (Some(value), Some(condition)) => pieces.push((value, condition)),
                    _ => return Ast::Unsupported("piece".to_string()),
                }
            }
            "otherwise" => {
                otherwise = child.first_element().map(|e| Box::new(parse_node(e)));
            }
            name => return Ast::Unsupported(name.to_string()),
        }
    }
    Ast::Piecewise { pieces, otherwise }
}
