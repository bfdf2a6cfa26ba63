use thiserror::Error;

/// Errors raised while compiling or evaluating a dynamic expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("invalid expression `{text}`: {reason}")]
    Invalid { text: String, reason: String },

    #[error("evaluation of `{text}` failed: {reason}")]
    Evaluation { text: String, reason: String },
}

impl ExprError {
    pub fn invalid(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            text: text.into(),
            reason: reason.into(),
        }
    }

    pub fn evaluation(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Evaluation {
            text: text.into(),
            reason: reason.into(),
        }
    }
}
