use thiserror::Error;

/// Error when parsing an enumeration from its wire string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} '{invalid}'. Valid values: {valid}")]
pub struct ParseEnumError {
    kind: &'static str,
    invalid: String,
    valid: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, invalid: &str, valid: &[&str]) -> Self {
        Self {
            kind,
            invalid: invalid.to_string(),
            valid: valid.join(", "),
        }
    }

    pub fn invalid(&self) -> &str {
        &self.invalid
    }
}
