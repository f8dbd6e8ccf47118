use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAxis {
    Gender,
    AgeRange,
}

impl FilterAxis {
    pub const fn as_str(self) -> &'static str {
        match self {
            FilterAxis::Gender => "gender",
            FilterAxis::AgeRange => "ageRange",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid {} value {value:?}", .axis.as_str())]
    InvalidFilterValue { axis: FilterAxis, value: String },
    #[error("fact source unavailable: {0}")]
    DataSourceUnavailable(String),
    #[error("{report} report failed: {message}")]
    ReportFailed {
        report: &'static str,
        message: String,
    },
}

impl EngineError {
    pub fn source_unavailable(context: &str, err: impl std::fmt::Display) -> Self {
        EngineError::DataSourceUnavailable(format!("{context}: {err}"))
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidFilterValue { .. } => "InvalidFilterValue",
            EngineError::DataSourceUnavailable(_) => "DataSourceUnavailable",
            EngineError::ReportFailed { .. } => "ReportFailed",
        }
    }

    pub const fn is_client_error(&self) -> bool {
        matches!(self, EngineError::InvalidFilterValue { .. })
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_a_client_error() {
        let err = EngineError::InvalidFilterValue {
            axis: FilterAxis::AgeRange,
            value: "18-25".to_string(),
        };
        assert!(err.is_client_error());
        assert_eq!(err.kind(), "InvalidFilterValue");
        assert_eq!(err.to_string(), "invalid ageRange value \"18-25\"");
    }

    #[test]
    fn source_failure_serializes_kind_and_message() {
        let err = EngineError::source_unavailable("reading fact table", "connection refused");
        assert!(!err.is_client_error());
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["kind"], "DataSourceUnavailable");
        assert_eq!(
            json["message"],
            "fact source unavailable: reading fact table: connection refused"
        );
    }
}
