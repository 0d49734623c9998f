use std::fmt;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Message,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Level::Error => write!(f, "Error"),
            Level::Warning => write!(f, "Warning"),
            Level::Message => write!(f, "Message"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    description: String,
    level: Level,
}

impl Issue {
    pub fn new(description: String, level: Level) -> Self {
        Self { description, level }
    }

    pub fn error(description: String) -> Self {
        Self::new(description, Level::Error)
    }

    pub fn warning(description: String) -> Self {
        Self::new(description, Level::Warning)
    }

    pub fn message(description: String) -> Self {
        Self::new(description, Level::Message)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.description)
    }
}

/// Issues raised by one parse, validation or analysis pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Issues {
    issues: Vec<Issue>,
}

impl Issues {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn push(&mut self, new: Issue) {
        self.issues.push(new);
    }

    pub fn error(&mut self, description: String) {
        self.push(Issue::error(description));
    }

    pub fn warning(&mut self, description: String) {
        self.push(Issue::warning(description));
    }

    pub fn extend(&mut self, new: Issues) {
        self.issues.extend(new.issues)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.level == Level::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_error_contains(&self, text: &str) -> bool {
        self.errors().any(|err| err.description.contains(text))
    }

    /// The numbered console listing printed when a model is rejected.
    ///
    /// The count line keeps the two spaces downstream scripts have always
    /// seen after "Total errors:".
    pub fn report(&self) -> String {
        let mut buf = String::new();
        // writing to a String cannot fail
        let _ = writeln!(buf, "Total errors:  {}", self.error_count());
        for (i, err) in self.errors().enumerate() {
            let _ = writeln!(buf, "{}: {}", i + 1, err.description);
        }
        buf
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.issues
            .iter()
            .try_for_each(|issue| writeln!(f, "{issue}"))
    }
}

impl IntoIterator for Issues {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Issue, Issues};

    #[test]
    fn report_lists_errors_only() {
        let mut issues = Issues::new();
        issues.error("Variable 'x' in component 'main' is not computed.".to_string());
        issues.push(Issue::warning("units mismatch".to_string()));
        issues.error("Variable 'y' in component 'main' is not computed.".to_string());
        assert_eq!(issues.len(), 3);
        assert_eq!(issues.error_count(), 2);
        assert_eq!(
            issues.report(),
            "Total errors:  2\n\
             1: Variable 'x' in component 'main' is not computed.\n\
             2: Variable 'y' in component 'main' is not computed.\n"
        );
    }

    #[test]
    fn warnings_are_not_errors() {
        let mut issues = Issues::new();
        issues.warning("units mismatch".to_string());
        assert!(!issues.has_errors());
        assert_eq!(issues.warnings().count(), 1);
        assert!(!issues.has_error_contains("units"));
    }
}
