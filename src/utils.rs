/// Parses a CellML real number string: optional sign, digits with an optional
/// decimal point, optional exponent. Words such as "inf" or "NaN" are rejected.
pub fn parse_real(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty()
        || !text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    text.parse::<f64>().ok()
}

pub fn is_real_number(text: &str) -> bool {
    parse_real(text).is_some()
}

/// Returns why `name` is not a valid CellML identifier, if it is not.
pub fn identifier_problem(name: &str) -> Option<&'static str> {
    let mut chars = name.chars();
    match chars.next() {
        None => Some("CellML identifiers must contain one or more basic Latin alphabetic characters."),
        Some(c) if c.is_ascii_digit() => {
            Some("CellML identifiers must not begin with a European numeric character [0-9].")
        }
        Some(_) if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => Some(
            "CellML identifiers must not contain any characters other than [a-zA-Z0-9_].",
        ),
        Some(_) if !name.chars().any(|c| c.is_ascii_alphabetic()) => {
            Some("CellML identifiers must contain one or more basic Latin alphabetic characters.")
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{identifier_problem, is_real_number, parse_real};

    #[test]
    fn real_numbers() {
        assert_eq!(parse_real("5"), Some(5.0));
        assert_eq!(parse_real(" -1.5e-3 "), Some(-1.5e-3));
        assert!(is_real_number(".5"));
        assert!(!is_real_number("inf"));
        assert!(!is_real_number("NaN"));
        assert!(!is_real_number("V_init"));
        assert!(!is_real_number(""));
        assert!(!is_real_number("1.2.3"));
    }

    #[test]
    fn identifiers() {
        assert_eq!(identifier_problem("Na_i"), None);
        assert_eq!(identifier_problem("_x1"), None);
        assert!(identifier_problem("").is_some());
        assert!(identifier_problem("1abc").unwrap().contains("numeric"));
        assert!(identifier_problem("a-b").unwrap().contains("[a-zA-Z0-9_]"));
        assert!(identifier_problem("__").unwrap().contains("alphabetic"));
    }
}
