use thiserror::Error;

/// Errors raised while laying out a work's content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("malformed layout cell `{token}`: {reason}")]
    MalformedCell { token: String, reason: String },

    #[error("malformed layout row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("not enough {what} to satisfy layout `{layout}`: the work has only {available}")]
    NotEnough {
        what: &'static str,
        layout: String,
        available: usize,
    },
}

impl LayoutError {
    pub fn malformed_cell(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCell {
            token: token.into(),
            reason: reason.into(),
        }
    }
}
