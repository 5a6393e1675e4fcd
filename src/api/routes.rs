use super::handlers::*;
use crate::ports::{LedgerPort, OrderStorePort, PayByBankPort};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn create_router<P, L, O>(state: AppState<P, L, O>) -> Router
where
    P: PayByBankPort + 'static,
    L: LedgerPort + 'static,
    O: OrderStorePort + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/payments", post(create_payment::<P, L, O>))
        .route("/api/payments/:order_id", get(payment_status::<P, L, O>))
        .route("/api/payments/:order_id/refresh", post(refresh_payment::<P, L, O>))
        .route("/api/webhooks/paybybank", post(paybybank_webhook::<P, L, O>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{ScriptedPayByBank, order};
    use crate::application::{OrderStatuses, OrderTransitionEngine, PaymentService, WebhookService};
    use crate::infrastructure::adapters::in_memory::{InMemoryLedger, InMemoryOrderStore};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Fixture {
        provider: Arc<ScriptedPayByBank>,
        store: Arc<InMemoryOrderStore>,
        router: Router,
    }

    async fn fixture() -> Fixture {
        let provider = Arc::new(ScriptedPayByBank::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let store = Arc::new(InMemoryOrderStore::new());
        store.insert(order("42", "pending")).await;

        let engine = Arc::new(OrderTransitionEngine::new(store.clone(), OrderStatuses::default()));
        let state = AppState {
            payment_service: Arc::new(PaymentService::new(
                provider.clone(),
                ledger.clone(),
                store.clone(),
                engine.clone(),
                720,
            )),
            webhook_service: Arc::new(WebhookService::new(ledger, store.clone(), engine)),
        };

        Fixture {
            provider,
            store,
            router: create_router(state),
        }
    }

    async fn send(router: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn webhook_body(status: &str) -> String {
        serde_json::json!({
            "id": 991,
            "merchantOrderId": "42",
            "omtTransactionBank": {"merchantOrderStatus": status, "txn_id": "tx-1"}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let f = fixture().await;

        let (status, body) = send(&f.router, "GET", "/health", "").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn test_create_then_status() {
        let f = fixture().await;

        let (status, body) = send(&f.router, "POST", "/api/payments", r#"{"order_id": "42"}"#).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.contains("RF00000042"));

        let (status, body) = send(&f.router, "GET", "/api/payments/42", "").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["label"], "Pending");
        assert_eq!(json["can_request_update"], true);

        let (status, body) = send(&f.router, "POST", "/api/payments", r#"{"order_id": "42"}"#).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains("duplicate_order"));
    }

    #[tokio::test]
    async fn test_webhook_replies_ok_then_codes() {
        let f = fixture().await;
        send(&f.router, "POST", "/api/payments", r#"{"order_id": "42"}"#).await;

        let (status, body) =
            send(&f.router, "POST", "/api/webhooks/paybybank", &webhook_body("PAID")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
        assert_eq!(f.store.order("42").await.unwrap().status, "paybybank-paid");

        let (status, body) =
            send(&f.router, "POST", "/api/webhooks/paybybank", &webhook_body("FROZEN")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, "unexpected_order_status");

        let (status, body) = send(&f.router, "POST", "/api/webhooks/paybybank", "{").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "bad_payload");
    }

    #[tokio::test]
    async fn test_webhook_unknown_order() {
        let f = fixture().await;
        let body = r#"{"merchantOrderId": "404", "omtTransactionBank": {"merchantOrderStatus": "PAID"}}"#;

        let (status, reply) = send(&f.router, "POST", "/api/webhooks/paybybank", body).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(reply, "order_not_found");
    }

    #[tokio::test]
    async fn test_refresh_endpoint() {
        let f = fixture().await;
        send(&f.router, "POST", "/api/payments", r#"{"order_id": "42"}"#).await;

        let (status, body) = send(&f.router, "POST", "/api/payments/42/refresh", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("The payment is still PENDING"));

        f.provider.set_status("42", "CANCELLED", "pbb-42");
        let (status, body) = send(&f.router, "POST", "/api/payments/42/refresh", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("The payment status is: CANCELLED"));
        assert_eq!(f.store.order("42").await.unwrap().status, "failed");
    }

    #[tokio::test]
    async fn test_refresh_provider_down() {
        let f = fixture().await;
        f.provider.fail_on_query_call(1);

        let (status, body) = send(&f.router, "POST", "/api/payments/42/refresh", "").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("communication_api_error"));
    }
}
