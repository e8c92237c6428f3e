use std::fmt;

/**
 * Represents the type of error that can occur within the application.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    /**
     * Startup failed, e.g. unreadable configuration, keys or seed data.
     */
    Initialization,
    /**
     * Missing or invalid bearer token.
     */
    JwtAuthorization,
    /**
     * The document store could not be read.
     */
    DatabaseError,
    /**
     * Request parameters out of range.
     */
    Validation,
}

/**
 * Represents an error that occurs within the application.
 */
#[derive(Debug, Clone)]
pub struct ApplicationError {
    /**
     * Error type.
     */
    pub error_type: ErrorType,
    /**
     * Error message describing problem.
     */
    pub message: String,
}

impl ApplicationError {
    /**
     * Creates a new ApplicationError.
     *
     * #Arguments
     * `error_type`: The type of error.
     * `message`: A description of the error.
     */
    pub fn new(error_type: ErrorType, message: String) -> Self {
        ApplicationError { error_type, message }
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.error_type, self.message)
    }
}

impl std::error::Error for ApplicationError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_contains_type_and_message() {
        let error = ApplicationError::new(ErrorType::DatabaseError, "Failed to list cars".to_string());
        assert_eq!(error.to_string(), "DatabaseError: Failed to list cars");
    }
}
