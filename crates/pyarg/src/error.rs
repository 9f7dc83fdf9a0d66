use thiserror::Error;

pub type ArgResult<T, E = ArgError> = Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("invalid argument - {0}")]
    InvalidArgument(String),
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),
    #[error("{}", format_foreign(.category.as_deref(), .message))]
    ForeignFailure {
        category: Option<String>,
        message: String,
    },
    #[error("failed to load python runtime - {0}")]
    Library(String),
}

impl ArgError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn foreign(category: Option<String>, message: impl Into<String>) -> Self {
        Self::ForeignFailure {
            category,
            message: message.into(),
        }
    }

    /**
        Returns `true` if this error was raised by the native
        engine, and not by the marshaling layer itself.
    */
    #[must_use]
    pub fn is_foreign(&self) -> bool {
        matches!(self, Self::ForeignFailure { .. })
    }
}

fn format_foreign(category: Option<&str>, message: &str) -> String {
    match category {
        Some(category) => format!("{category}: {message}"),
        None => message.to_string(),
    }
}
