use shared::models::VehicleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("JSON data format error: {0}")]
    JsonDataFormatError(String),

    #[error("Vehicle '{vehicle_id}' not found for company '{company_id}'")]
    VehicleNotFound {
        company_id: String,
        vehicle_id: String,
    },

    #[error("Invalid vehicle transition: {0}")]
    InvalidTransition(#[from] VehicleError),
}

impl EngineError {
    pub fn vehicle_not_found(company_id: &str, vehicle_id: &str) -> Self {
        EngineError::VehicleNotFound {
            company_id: company_id.to_string(),
            vehicle_id: vehicle_id.to_string(),
        }
    }

    /// Process exit code for the report binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::ConfigError(_) => 78,
            EngineError::CsvSystemError { .. }
            | EngineError::CsvDataFormatError(_)
            | EngineError::JsonError(_)
            | EngineError::JsonDataFormatError(_) => 65,
            EngineError::IoError { .. } => 74,
            EngineError::VehicleNotFound { .. } | EngineError::InvalidTransition(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EngineError::vehicle_not_found("c1", "v9");
        assert_eq!(err.to_string(), "Vehicle 'v9' not found for company 'c1'");

        let err: EngineError = VehicleError::AlreadySold("v1".into()).into();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
        assert_eq!(err.exit_code(), 1);

        let err = EngineError::ConfigError("top_sales_limit must be positive".into());
        assert_eq!(err.to_string(), "Configuration error: top_sales_limit must be positive");
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: EngineError = io.into();
        assert!(err.to_string().starts_with("I/O error:"));
        assert_eq!(err.exit_code(), 74);
    }
}
