use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Missing environment variables: {}", missing.join(", "))]
    Configuration { missing: Vec<String> },

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Invalid fiscal year start month {0}: must be between 1 and 12")]
    InvalidFiscalStartMonth(u32),

    #[error("Ledger query failed: {0}")]
    QueryFailure(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ReportError {
    pub fn query(details: impl Into<String>) -> Self {
        Self::QueryFailure(details.into())
    }

    /// Text shown to a dashboard user when a whole report fails.
    ///
    /// Missing connection parameters are reported on their own so the operator
    /// sees every absent variable at once; everything else is wrapped in the
    /// generic failure banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { .. } => self.to_string(),
            other => format!("An error occurred: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
