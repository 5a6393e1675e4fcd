use crate::application::dto::{CreatePaymentRequest, ErrorResponse};
use crate::application::{PaymentService, WebhookService};
use crate::domain::errors::DomainError;
use crate::domain::OrderId;
use crate::ports::{LedgerPort, OrderStorePort, PayByBankPort};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Application state
pub struct AppState<P: PayByBankPort, L: LedgerPort, O: OrderStorePort> {
    pub payment_service: Arc<PaymentService<P, L, O>>,
    pub webhook_service: Arc<WebhookService<L, O>>,
}

impl<P: PayByBankPort, L: LedgerPort, O: OrderStorePort> Clone for AppState<P, L, O> {
    fn clone(&self) -> Self {
        Self {
            payment_service: self.payment_service.clone(),
            webhook_service: self.webhook_service.clone(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::BadPayload(_) | DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
        DomainError::OrderNotFound(_) | DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::DuplicateOrder(_) | DomainError::StatusConflict { .. } => StatusCode::CONFLICT,
        DomainError::UnexpectedStatus { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::CommunicationFailure(_) | DomainError::ProviderError { .. } => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(e: DomainError) -> ApiError {
    (status_for(&e), Json(ErrorResponse::from(&e)))
}

/// Create a payment reference code
pub async fn create_payment<P: PayByBankPort, L: LedgerPort, O: OrderStorePort>(
    State(state): State<AppState<P, L, O>>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Received payment reference request: {}", request.order_id);

    let order_id = OrderId::new(request.order_id.trim());
    if order_id.as_str().is_empty() {
        return Err(api_error(DomainError::ValidationError(
            "order_id is required".to_string(),
        )));
    }

    state
        .payment_service
        .create_payment_reference(&order_id)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)))
        .map_err(|e| {
            error!("Payment reference error for order {}: {}", order_id, e);
            api_error(e)
        })
}

/// Ledger status of an order
pub async fn payment_status<P: PayByBankPort, L: LedgerPort, O: OrderStorePort>(
    State(state): State<AppState<P, L, O>>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .payment_service
        .payment_status(&OrderId::new(order_id))
        .await
        .map(Json)
        .map_err(|e| {
            error!("Payment status error: {}", e);
            api_error(e)
        })
}

/// Manual status refresh, applied inline
pub async fn refresh_payment<P: PayByBankPort, L: LedgerPort, O: OrderStorePort>(
    State(state): State<AppState<P, L, O>>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id = OrderId::new(order_id);

    state
        .payment_service
        .refresh_order(&order_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Status refresh error for order {}: {}", order_id, e);
            api_error(e)
        })
}

/// PayByBank webhook; the body of the reply is `OK` or an error code
pub async fn paybybank_webhook<P: PayByBankPort, L: LedgerPort, O: OrderStorePort>(
    State(state): State<AppState<P, L, O>>,
    body: String,
) -> impl IntoResponse {
    let span = info_span!("paybybank_webhook", delivery_id = %Uuid::new_v4());

    async move {
        info!("Received PayByBank webhook");

        match state.webhook_service.handle_webhook(&body).await {
            Ok(_) => (StatusCode::OK, "OK"),
            Err(e) => {
                match &e {
                    DomainError::UnexpectedStatus { .. } => warn!("{}", e),
                    _ => error!("Webhook handling error: {}", e),
                }
                (status_for(&e), e.code())
            }
        }
    }
    .instrument(span)
    .await
}

/// Health check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
