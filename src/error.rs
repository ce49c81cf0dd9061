use thiserror::Error;

use crate::validate::ValidationFailure;

/// Error type carried through the `Client` channel: whatever the backend
/// driver produced, boxed but otherwise untouched.
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for typed-sql operations.
///
/// The first two variants are construction-time misuse of the template API
/// and fail fast during compilation. The two validation variants are raised
/// per call and are recoverable by the caller. `Client` carries database
/// driver failures through unchanged; their taxonomy belongs to the driver.
#[derive(Debug, Error)]
pub enum TypedSqlError {
    #[error("Duplicate SQL parameter name: \"{0}\".")]
    DuplicateParameterName(String),

    #[error("Invalid template argument passed at index {0}.")]
    InvalidTemplateArgument(usize),

    #[error("Query input validation failed: {0}")]
    InputValidation(ValidationFailure),

    #[error("Query output validation failed: {0}")]
    OutputValidation(ValidationFailure),

    #[error("{0}")]
    Client(ClientError),
}

/// Result type alias for typed-sql operations.
pub type Result<T> = std::result::Result<T, TypedSqlError>;

impl TypedSqlError {
    /// Box a driver error into the `Client` channel.
    pub fn client(error: impl Into<ClientError>) -> Self {
        Self::Client(error.into())
    }

    pub fn is_duplicate_parameter_name(&self) -> bool {
        matches!(self, Self::DuplicateParameterName(_))
    }

    pub fn is_invalid_template_argument(&self) -> bool {
        matches!(self, Self::InvalidTemplateArgument(_))
    }

    pub fn is_input_validation(&self) -> bool {
        matches!(self, Self::InputValidation(_))
    }

    pub fn is_output_validation(&self) -> bool {
        matches!(self, Self::OutputValidation(_))
    }

    /// True for either validation kind (input or output).
    pub fn is_validation(&self) -> bool {
        self.is_input_validation() || self.is_output_validation()
    }

    /// The structured issues of a validation error, if this is one.
    pub fn validation_failure(&self) -> Option<&ValidationFailure> {
        match self {
            Self::InputValidation(failure) | Self::OutputValidation(failure) => Some(failure),
            _ => None,
        }
    }
}
