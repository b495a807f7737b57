//! Finance REST API
//!
//! HTTP API over one session's [`Workspace`](crate::views::Workspace),
//! built with Axum.
//!
//! # Endpoints
//!
//! ## Pages
//! - `GET /api/v1/dashboard` - Totals, charts and recent transactions
//! - `GET /api/v1/accounts` - Accounts grouped by type
//! - `GET /api/v1/transactions?type=&search=` - Filtered transactions
//! - `GET /api/v1/categories?type=` - Categories
//! - `GET /api/v1/cards` - Credit card portfolio
//! - `GET /api/v1/cards/:id` - Card details
//! - `GET /api/v1/profile` - Profile and statistics
//!
//! ## Writes
//! - `POST /api/v1/accounts`, `POST /api/v1/transactions` - Create
//! - `PUT|DELETE /api/v1/accounts/:id?confirm=true` - Edit or delete
//! - `PUT|DELETE /api/v1/transactions/:id?confirm=true` - Edit or delete
//! - `PUT /api/v1/profile` - Update the profile
//! - `POST /api/v1/cards/:id/pay` - Validate a card payment
//!
//! Edits and deletes without `confirm=true` answer
//! `428 Precondition Required` carrying the confirmation prompt.
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Table change notifications

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        // Account routes
        .route(
            "/accounts",
            get(routes::accounts::list_accounts).post(routes::accounts::create_account),
        )
        .route(
            "/accounts/:id",
            get(routes::accounts::get_account)
                .put(routes::accounts::update_account)
                .delete(routes::accounts::delete_account),
        )
        // Transaction routes
        .route(
            "/transactions",
            get(routes::transactions::list_transactions)
                .post(routes::transactions::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(routes::transactions::get_transaction)
                .put(routes::transactions::update_transaction)
                .delete(routes::transactions::delete_transaction),
        )
        .route("/categories", get(routes::categories::list_categories))
        // Card routes
        .route("/cards", get(routes::cards::list_cards))
        .route("/cards/:id", get(routes::cards::get_card))
        .route("/cards/:id/pay", post(routes::cards::pay_card))
        // Profile routes
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Finance API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Finance API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, MemoryBackend};
    use crate::notify::{CollectingNotifier, Notifier};
    use crate::session::Session;
    use crate::views::Workspace;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::util::ServiceExt;
    use uuid::Uuid;

    async fn create_test_app() -> Router {
        let session = Session::new(Uuid::new_v4()).email("demo@example.com");
        let store = MemoryBackend::seeded().await;
        store
            .ensure_profile(session.user_id, "demo@example.com")
            .await
            .unwrap();
        let backend: Arc<dyn Backend> = Arc::new(store.as_user(session.user_id));
        let notifier: Arc<dyn Notifier> = Arc::new(CollectingNotifier::new());

        let workspace = Workspace::mount(Arc::clone(&backend), Some(session), notifier, "PHP").await;
        build_router(AppState::new(workspace, backend, ApiConfig::default()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_bank(app: &Router) -> String {
        let response = send(
            app,
            "POST",
            "/api/v1/accounts",
            Some(r#"{"name": "BPI", "type": "bank", "balance": "10,000"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json(response).await["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app().await;
        let response = send(&app, "GET", "/health/live", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app().await;
        let response = send(&app, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend_kind"], "memory");
        assert_eq!(body["signed_in"], true);
    }

    #[tokio::test]
    async fn test_create_account_missing_fields() {
        let app = create_test_app().await;
        let response = send(&app, "POST", "/api/v1/accounts", Some(r#"{"name": "BPI"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Please fill in all required fields");
    }

    #[tokio::test]
    async fn test_edit_requires_confirmation() {
        let app = create_test_app().await;
        let id = create_bank(&app).await;
        let edit = r#"{"name": "BPI Savings", "type": "bank", "balance": "9000"}"#;

        let response = send(&app, "PUT", &format!("/api/v1/accounts/{}", id), Some(edit)).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);
        let body = json(response).await;
        assert_eq!(body["error"]["confirmation"]["title"], "Save changes?");

        let unchanged = json(send(&app, "GET", &format!("/api/v1/accounts/{}", id), None).await).await;
        assert_eq!(unchanged["name"], "BPI");

        let response = send(
            &app,
            "PUT",
            &format!("/api/v1/accounts/{}?confirm=true", id),
            Some(edit),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["name"], "BPI Savings");
    }

    #[tokio::test]
    async fn test_delete_account() {
        let app = create_test_app().await;
        let id = create_bank(&app).await;

        let response = send(&app, "DELETE", &format!("/api/v1/accounts/{}", id), None).await;
        assert_eq!(response.status(), StatusCode::PRECONDITION_REQUIRED);

        let response = send(
            &app,
            "DELETE",
            &format!("/api/v1/accounts/{}?confirm=true", id),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "GET", &format!("/api/v1/accounts/{}", id), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transactions_flow() {
        let app = create_test_app().await;
        let account_id = create_bank(&app).await;

        let categories =
            json(send(&app, "GET", "/api/v1/categories?type=expense", None).await).await;
        let groceries = categories["categories"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == "Groceries")
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();

        let body = format!(
            r#"{{"amount": 1500, "type": "expense", "category_id": "{}", "account_id": "{}", "description": "Weekly groceries"}}"#,
            groceries, account_id
        );
        let response = send(&app, "POST", "/api/v1/transactions", Some(&body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let list = json(send(&app, "GET", "/api/v1/transactions?search=WEEKLY", None).await).await;
        assert_eq!(list["rows"].as_array().unwrap().len(), 1);

        let list = json(send(&app, "GET", "/api/v1/transactions?type=income", None).await).await;
        assert!(list["rows"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_category_type() {
        let app = create_test_app().await;
        let response = send(&app, "GET", "/api/v1/categories?type=transfer", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pay_card() {
        let app = create_test_app().await;
        let bank = create_bank(&app).await;

        let response = send(
            &app,
            "POST",
            "/api/v1/accounts",
            Some(
                r#"{"name": "Visa", "type": "credit", "balance": "2500", "credit_limit": "10000",
                    "statement_date": "2024-06-05", "payment_due_date": "2024-06-25"}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let card = json(response).await["id"].as_str().unwrap().to_string();

        let details = json(send(&app, "GET", &format!("/api/v1/cards/{}", card), None).await).await;
        assert_eq!(details["statement_date"], "June 5, 2024");

        let response = send(
            &app,
            "POST",
            &format!("/api/v1/cards/{}/pay", card),
            Some(&format!(r#"{{"from_account_id": "{}"}}"#, bank)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "GET", &format!("/api/v1/cards/{}", bank), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pay_card_from_card_or_unknown_account() {
        let app = create_test_app().await;
        create_bank(&app).await;

        let response = send(
            &app,
            "POST",
            "/api/v1/accounts",
            Some(
                r#"{"name": "Visa", "type": "credit", "balance": "1000", "credit_limit": "10000",
                    "statement_date": "2024-06-05", "payment_due_date": "2024-06-25"}"#,
            ),
        )
        .await;
        let card = json(response).await["id"].as_str().unwrap().to_string();

        for source in [card.clone(), Uuid::new_v4().to_string()] {
            let response = send(
                &app,
                "POST",
                &format!("/api/v1/cards/{}/pay", card),
                Some(&format!(r#"{{"from_account_id": "{}"}}"#, source)),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json(response).await["error"]["title"], "Invalid Selection");
        }
    }

    #[tokio::test]
    async fn test_update_profile() {
        let app = create_test_app().await;
        let response = send(
            &app,
            "PUT",
            "/api/v1/profile",
            Some(r#"{"first_name": "Carlo", "last_name": "Reyes"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let view = json(send(&app, "GET", "/api/v1/profile", None).await).await;
        assert_eq!(view["stats"]["initials"], "CR");
    }
}
