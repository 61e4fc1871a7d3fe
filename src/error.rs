use thiserror::Error;

/// Failures of the numeric core (aggregation and forecasting).
///
/// These never carry I/O context; the binary converts them into an
/// [`AppError`] with an exit code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("{context}: dataset is empty")]
    EmptyDataset { context: String },

    #[error("{context}: insufficient data (need at least {needed} points, found {found})")]
    InsufficientData {
        context: String,
        needed: usize,
        found: usize,
    },

    #[error("{context}: zero denominator")]
    ZeroDenominator { context: String },

    #[error("{context}: values are too large or not finite")]
    NonFinite { context: String },
}

impl AnalysisError {
    pub fn empty(context: impl Into<String>) -> Self {
        Self::EmptyDataset {
            context: context.into(),
        }
    }

    pub fn insufficient(context: impl Into<String>, needed: usize, found: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            needed,
            found,
        }
    }

    pub fn zero_denominator(context: impl Into<String>) -> Self {
        Self::ZeroDenominator {
            context: context.into(),
        }
    }

    pub fn non_finite(context: impl Into<String>) -> Self {
        Self::NonFinite {
            context: context.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let exit_code = match err {
            AnalysisError::EmptyDataset { .. } => 3,
            AnalysisError::InsufficientData { .. }
            | AnalysisError::ZeroDenominator { .. }
            | AnalysisError::NonFinite { .. } => 4,
        };
        Self::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_errors_map_to_exit_codes() {
        let empty: AppError = AnalysisError::empty("kpis").into();
        assert_eq!(empty.exit_code(), 3);

        let short: AppError = AnalysisError::insufficient("forecast", 2, 1).into();
        assert_eq!(short.exit_code(), 4);
        assert_eq!(
            short.to_string(),
            "forecast: insufficient data (need at least 2 points, found 1)"
        );

        let overflow: AppError = AnalysisError::non_finite("forecast").into();
        assert_eq!(overflow.exit_code(), 4);
    }
}
