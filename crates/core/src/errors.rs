use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RulesError {
    #[error("no price observations to aggregate")]
    EmptyInput,
    #[error("invalid {field}: {value} (must be greater than zero)")]
    InvalidPrice { field: &'static str, value: Decimal },
    #[error("invalid stock quantity: {value} (must not be negative)")]
    InvalidStock { value: i64 },
    #[error("invalid demand level `{value}` (expected low|medium|high)")]
    InvalidDemand { value: String },
    #[error("invalid negotiation margin: {value} (must lie strictly between 0 and 1)")]
    InvalidMargin { value: Decimal },
    #[error("supplier `{supplier}` has no price observation for this item")]
    UnknownSupplier { supplier: String },
    #[error("{operation} exceeds the representable decimal range")]
    Overflow { operation: &'static str },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error("item `{0}` was not found in the dataset")]
    NotFound(String),
    #[error("data failure: {0}")]
    Data(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("data unavailable: {message}")]
    DataUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "The requested item does not exist in the dataset.",
            Self::DataUnavailable { .. } => {
                "The procurement dataset could not be read. Check the data file and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::NotFound { .. } => "not_found",
            Self::DataUnavailable { .. } => "data_unavailable",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::NotFound { message, .. }
            | Self::DataUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::DataUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::DataUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Rules(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::NotFound(item) => {
                Self::NotFound { message: format!("unknown item `{item}`"), correlation_id }
            }
            ApplicationError::Data(message) => Self::DataUnavailable { message, correlation_id },
        }
    }
}
