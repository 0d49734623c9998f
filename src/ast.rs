use std::fmt;

/// A MathML content expression as stored inside a component.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Apply {
        op: String,
        args: Vec<Ast>,
    },
    Ci(String),
    Cn {
        value: String,
        units: Option<String>,
    },
    // pi, exponentiale, true, false, infinity, notanumber
    Constant(String),
    Bvar(Box<Ast>),
    Degree(Box<Ast>),
    LogBase(Box<Ast>),
    Piecewise {
        pieces: Vec<(Ast, Ast)>,
        otherwise: Option<Box<Ast>>,
    },
    Unsupported(String),
}

pub const CONSTANTS: &[&str] = &[
    "pi",
    "exponentiale",
    "true",
    "false",
    "infinity",
    "notanumber",
];

pub const OPERATORS: &[&str] = &[
    // relations
    "eq", "neq", "lt", "leq", "gt", "geq", "and", "or", "xor", "not",
    // arithmetic
    "plus", "minus", "times", "divide", "power", "root", "abs", "exp", "ln", "log",
    "floor", "ceiling", "min", "max", "rem", "diff",
    // trigonometry
    "sin", "cos", "tan", "sec", "csc", "cot", "sinh", "cosh", "tanh", "sech", "csch", "coth",
    "arcsin", "arccos", "arctan", "arcsec", "arccsc", "arccot", "arcsinh", "arccosh",
    "arctanh", "arcsech", "arccsch", "arccoth",
];

impl Ast {
    pub fn new_apply(op: &str, args: Vec<Ast>) -> Self {
        Ast::Apply {
            op: op.to_string(),
            args,
        }
    }

    pub fn new_ci(name: &str) -> Self {
        Ast::Ci(name.to_string())
    }

    pub fn new_cn(value: &str, units: &str) -> Self {
        Ast::Cn {
            value: value.to_string(),
            units: Some(units.to_string()),
        }
    }

    pub fn as_apply(&self) -> Option<(&str, &[Ast])> {
        match self {
            Ast::Apply { op, args } => Some((op.as_str(), args.as_slice())),
            _ => None,
        }
    }

    pub fn as_ci(&self) -> Option<&str> {
        match self {
            Ast::Ci(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// For `diff(bvar(t), x)` returns `(x, t)`.
    pub fn as_derivative(&self) -> Option<(&str, &str)> {
        let (op, args) = self.as_apply()?;
        if op != "diff" {
            return None;
        }
        let mut voi = None;
        let mut state = None;
        for arg in args {
            match arg {
                Ast::Bvar(inner) => voi = inner.as_ci(),
                Ast::Ci(name) => state = Some(name.as_str()),
                _ => return None,
            }
        }
        Some((state?, voi?))
    }

    /// Calls `f` on every node, parents before children.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Ast)) {
        f(self);
        match self {
            Ast::Apply { args, .. } => args.iter().for_each(|a| a.visit(f)),
            Ast::Bvar(child) | Ast::Degree(child) | Ast::LogBase(child) => child.visit(f),
            Ast::Piecewise { pieces, otherwise } => {
                for (value, condition) in pieces {
                    value.visit(f);
                    condition.visit(f);
                }
                if let Some(otherwise) = otherwise {
                    otherwise.visit(f);
                }
            }
            Ast::Ci(_) | Ast::Cn { .. } | Ast::Constant(_) | Ast::Unsupported(_) => {}
        }
    }

    /// Variable names referenced anywhere in the expression, in first-seen order.
    pub fn ci_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.visit(&mut |node| {
            if let Ast::Ci(name) = node {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        });
        names
    }

    /// Variables appearing as the differentiated argument of a `diff`.
    pub fn derivatives(&self) -> Vec<(&str, &str)> {
        let mut derivatives = Vec::new();
        self.visit(&mut |node| {
            if let Some(d) = node.as_derivative() {
                derivatives.push(d);
            }
        });
        derivatives
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ast::Apply { op, args } => {
                let infix = match op.as_str() {
                    "eq" => Some("="),
                    "plus" => Some("+"),
                    "minus" if args.len() == 2 => Some("-"),
                    "times" => Some("*"),
                    "divide" => Some("/"),
                    "power" => Some("^"),
                    "lt" => Some("<"),
                    "gt" => Some(">"),
                    "leq" => Some("<="),
                    "geq" => Some(">="),
                    _ => None,
                };
                if let Some((state, voi)) = self.as_derivative() {
                    return write!(f, "d{state}/d{voi}");
                }
                match infix {
                    Some(symbol) => {
                        let parts: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                        if op == "eq" {
                            write!(f, "{}", parts.join(" = "))
                        } else {
                            write!(f, "({})", parts.join(&format!(" {symbol} ")))
                        }
                    }
                    None => {
                        let parts: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                        write!(f, "{}({})", op, parts.join(", "))
                    }
                }
            }
            Ast::Ci(name) => write!(f, "{name}"),
            Ast::Cn { value, units } => match units {
                Some(units) => write!(f, "{value}[{units}]"),
                None => write!(f, "{value}"),
            },
            Ast::Constant(name) => write!(f, "{name}"),
            Ast::Bvar(child) => write!(f, "bvar({child})"),
            Ast::Degree(child) => write!(f, "degree({child})"),
            Ast::LogBase(child) => write!(f, "logbase({child})"),
            Ast::Piecewise { pieces, otherwise } => {
                write!(f, "piecewise(")?;
                for (value, condition) in pieces {
                    write!(f, "{value} if {condition}; ")?;
                }
                if let Some(otherwise) = otherwise {
                    write!(f, "otherwise {otherwise}")?;
                }
                write!(f, ")")
            }
            Ast::Unsupported(name) => write!(f, "<{name}>"),
        }
    }
}
