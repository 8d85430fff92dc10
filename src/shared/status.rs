//! Integer status codes reported across the host boundary

use std::fmt;

use crate::error::ScannerError;

/// Status code plus the engine's human-readable message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

impl Status {
    pub const OK: i32 = 0;

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            code: Self::OK,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Self::OK
    }
}

impl From<ScannerError> for Status {
    fn from(error: ScannerError) -> Self {
        let code = error.code();
        let message = match error {
            ScannerError::Settings { message, .. } => message,
            other => other.to_string(),
        };
        Self { code, message }
    }
}

impl<T> From<crate::error::Result<T>> for Status {
    fn from(result: crate::error::Result<T>) -> Self {
        match result {
            Ok(_) => Status::ok("Successful."),
            Err(e) => e.into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_result() {
        assert!(Status::from(Ok::<(), ScannerError>(())).is_ok());

        let status = Status::from(Err::<(), _>(ScannerError::Settings {
            code: -10031,
            message: "Template 'locr' not found".to_string(),
        }));
        assert_eq!(status.code, -10031);
        assert_eq!(status.message, "Template 'locr' not found");
        assert_eq!(status.to_string(), "-10031: Template 'locr' not found");
    }
}
