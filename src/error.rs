use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing, resolving, invoking or loading functions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The call expression does not match `name(arg, ...)`
    #[error("Malformed call expression '{expression}': {reason}")]
    MalformedExpression { expression: String, reason: String },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    /// Resolved argument count does not match any declared overload
    #[error("{name} expects {} arguments, got {actual}", join_counts(.expected))]
    ArityMismatch {
        name: String,
        expected: Vec<usize>,
        actual: usize,
    },

    /// The function exists but the request is not allowed to call it
    #[error("Function {name} is not allowed: {reason}")]
    FunctionNotAllowed { name: String, reason: String },

    #[error("{name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("Function {name} has no demo; demo must be a non-null JSON object string")]
    MissingDemo { name: String },

    #[error("Function {name} has an invalid demo: {reason}")]
    InvalidDemo { name: String, reason: String },

    #[error("Invalid function descriptor: {0}")]
    InvalidDescriptor(String),

    /// A demo ran but the pipeline reported failure
    #[error("Demo of function {name} failed: {message}")]
    ValidationFailed { name: String, message: String },

    #[error("No remote functions available")]
    NoFunctionsAvailable,

    #[error("Function store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),
}

fn join_counts(counts: &[usize]) -> String {
    counts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

impl Error {
    pub fn malformed<E: Into<String>, R: Into<String>>(expression: E, reason: R) -> Self {
        Error::MalformedExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_argument<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Error::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Status code reported by the pipeline for this error
    pub fn code(&self) -> u16 {
        match self {
            Error::MalformedExpression { .. }
            | Error::ArityMismatch { .. }
            | Error::InvalidArgument { .. } => 400,
            Error::AccessDenied(_) | Error::FunctionNotAllowed { .. } => 403,
            Error::UnknownFunction { .. } => 404,
            Error::MissingDemo { .. }
            | Error::InvalidDemo { .. }
            | Error::InvalidDescriptor(_)
            | Error::ValidationFailed { .. }
            | Error::NoFunctionsAvailable
            | Error::StoreUnavailable(_) => 500,
        }
    }
}
