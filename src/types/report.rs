use std::fmt;
use std::time::Duration;

use super::result::ValidationResult;
use crate::Error;

/// Per-field results of one [`Validator::validate_all()`](crate::Validator::validate_all) run,
/// in the order the fields were validated (wildcards expanded).
#[derive(Debug, Clone)]
#[must_use]
pub struct ValidationReport {
    entries: Vec<(String, Result<ValidationResult, Error>)>,
    stopped_early: bool,
    duration: Duration,
}

impl ValidationReport {
    pub(crate) fn new(
        entries: Vec<(String, Result<ValidationResult, Error>)>,
        stopped_early: bool,
        duration: Duration,
    ) -> Self {
        Self {
            entries,
            stopped_early,
            duration,
        }
    }

    /// The result recorded for `path`, if that field was validated.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Result<ValidationResult, Error>> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<ValidationResult, Error>)> {
        self.entries.iter().map(|(p, r)| (p.as_str(), r))
    }

    /// Whether every validated field produced a passing verdict.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, r)| r.as_ref().is_ok_and(ValidationResult::is_valid))
    }

    /// Paths whose verdict was `false` or whose validation errored.
    #[must_use]
    pub fn failures(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, r)| !r.as_ref().is_ok_and(ValidationResult::is_valid))
            .map(|(p, _)| p.as_str())
            .collect()
    }

    /// Whether fail-fast ended the run before every field was validated.
    #[must_use]
    pub fn stopped_early(&self) -> bool {
        self.stopped_early
    }

    /// Wall-clock duration of the run.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a (String, Result<ValidationResult, Error>);
    type IntoIter = std::slice::Iter<'a, (String, Result<ValidationResult, Error>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fields, {} failed",
            self.entries.len(),
            self.failures().len()
        )?;
        if self.stopped_early {
            write!(f, " (stopped early)")?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{Behavior, Metadata};

    fn result(valid: bool) -> ValidationResult {
        ValidationResult::new(
            json!(1),
            valid,
            vec![],
            Metadata::new("x", Behavior::Normal, vec![], String::from("1")),
        )
    }

    fn sample() -> ValidationReport {
        ValidationReport::new(
            vec![
                ("name".into(), Ok(result(true))),
                ("age".into(), Ok(result(false))),
                (
                    "email".into(),
                    Err(Error::RuleExecutionFailed {
                        rule: "email".into(),
                        message: "boom".into(),
                    }),
                ),
            ],
            false,
            Duration::from_micros(3),
        )
    }

    #[test]
    fn report_accessors() {
        let report = sample();
        assert_eq!(report.len(), 3);
        assert!(!report.passed());
        assert_eq!(report.failures(), ["age", "email"]);
        assert!(report.get("name").unwrap().is_ok());
        assert!(report.get("missing").is_none());
        assert_eq!(
            report.iter().map(|(p, _)| p).collect::<Vec<_>>(),
            ["name", "age", "email"]
        );
    }

    #[test]
    fn report_display() {
        let s = sample().to_string();
        assert!(s.contains("3 fields, 2 failed"));
        assert!(!s.contains("stopped early"));
    }

    #[test]
    fn empty_report_passes() {
        let report = ValidationReport::new(vec![], true, Duration::ZERO);
        assert!(report.passed());
        assert!(report.is_empty());
        assert!(report.to_string().contains("stopped early"));
    }
}
