use thiserror::Error;

/// Domain-level error type
#[derive(Error, Debug)]
pub enum DomainError {
    /// Webhook or provider payload could not be decoded
    #[error("Bad payload: {0}")]
    BadPayload(String),

    /// Order is unknown to the order store
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Provider reported a status we don't know how to handle
    #[error("Unexpected order status received ({status}) for order {order_id}")]
    UnexpectedStatus { order_id: String, status: String },

    /// Transport failure, timeout, non-200 or empty body from the provider
    #[error("Unable to communicate with PayByBank: {0}")]
    CommunicationFailure(String),

    /// The provider answered but refused the request
    #[error("PayByBank error: {message} (error code: {code})")]
    ProviderError { code: String, message: String },

    /// A ledger row already exists for the order
    #[error("Ledger entry already exists for order {0}")]
    DuplicateOrder(String),

    /// No ledger row for the order
    #[error("Ledger entry not found for order {0}")]
    NotFound(String),

    /// Order status changed underneath a transition
    #[error("Order {order_id} status changed concurrently (expected {expected})")]
    StatusConflict { order_id: String, expected: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Short machine-readable code, echoed back to the provider on webhook failures
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::BadPayload(_) => "bad_payload",
            DomainError::OrderNotFound(_) => "order_not_found",
            DomainError::UnexpectedStatus { .. } => "unexpected_order_status",
            DomainError::CommunicationFailure(_) => "communication_api_error",
            DomainError::ProviderError { .. } => "api_error",
            DomainError::DuplicateOrder(_) => "duplicate_order",
            DomainError::NotFound(_) => "ledger_entry_not_found",
            DomainError::StatusConflict { .. } => "status_conflict",
            DomainError::ValidationError(_) => "validation_error",
            DomainError::DatabaseError(_) => "database_error",
            DomainError::ConfigurationError(_) => "configuration_error",
            DomainError::InternalError(_) => "internal_error",
        }
    }
}

// Timeouts and connection errors must never read as success.
impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DomainError::CommunicationFailure(format!("request timed out: {}", e))
        } else if e.is_decode() {
            DomainError::BadPayload(format!("undecodable provider response: {}", e))
        } else {
            DomainError::CommunicationFailure(e.to_string())
        }
    }
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
