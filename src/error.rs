use thiserror::Error;

/// Broad failure category.
///
/// The category decides the process exit code so scripts driving the batch
/// commands can tell "bad input" from "bad numbers" without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing file, missing object, unreadable container, mismatched binning.
    Input,
    /// Configuration or range that cannot be honoured (misaligned edges,
    /// uneven rebin groups). Raised before any mutation happens.
    Consistency,
    /// Fit/interpolation failure, zero normalization, non-finite weights.
    Numerical,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Input => 2,
            ErrorKind::Consistency => 3,
            ErrorKind::Numerical => 4,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Input, message)
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Consistency, message)
    }

    pub fn numerical(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Numerical, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    /// Prefix the message with where the failure happened (tune, slice, path).
    pub fn context(self, what: impl std::fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{what}: {}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_kinds() {
        assert_eq!(AppError::input("x").exit_code(), 2);
        assert_eq!(AppError::consistency("x").exit_code(), 3);
        assert_eq!(AppError::numerical("x").exit_code(), 4);
    }

    #[test]
    fn context_keeps_kind() {
        let err = AppError::numerical("singular system").context("tune CP5BL");
        assert_eq!(err.kind(), ErrorKind::Numerical);
        assert_eq!(err.to_string(), "tune CP5BL: singular system");
    }
}
