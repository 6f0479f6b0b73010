use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use shared::{
    CreateRegistrationRequest, ErrorResponse, HealthResponse, MutationResponse, OverviewResponse,
    PatchRegistrationRequest, RegisterResponse, RegistrationResponse, RegistrationSummary,
    UpdateRegistrationRequest,
};

use crate::domain::{stats_service, RegistrationService, StoreError};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registration_service: RegistrationService,
}

impl AppState {
    pub fn new(registration_service: RegistrationService) -> Self {
        Self {
            registration_service,
        }
    }
}

/// Build the application router: the /api routes plus a permissive CORS
/// layer, since the browser client is served from a different origin.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(put_user).patch(patch_user).delete(delete_user),
        );

    Router::new().nest("/api", api_routes).layer(cors).with_state(state)
}

/// Map a store error onto the HTTP status space
fn error_response(error: StoreError) -> Response {
    let (status, message) = match &error {
        StoreError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
        StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "Registration not found".to_string()),
        StoreError::Persistence(source) => {
            tracing::error!("Persistence failure: {:#}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };

    (
        status,
        Json(ErrorResponse {
            success: false,
            message,
        }),
    )
        .into_response()
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Server is running".to_string(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CreateRegistrationRequest>,
) -> Response {
    info!("POST /api/register");

    match state.registration_service.create_registration(request).await {
        Ok(registration) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                success: true,
                message: "Registration successful! See you at the party!".to_string(),
                registration: RegistrationSummary::from(&registration),
            }),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub async fn list_users(State(state): State<AppState>) -> Response {
    info!("GET /api/users");

    match state.registration_service.list_registrations().await {
        Ok(registrations) => {
            let stats = stats_service::compute_stats(&registrations);
            (
                StatusCode::OK,
                Json(OverviewResponse {
                    success: true,
                    count: stats.count,
                    total_adults: stats.total_adults,
                    total_kids: stats.total_kids,
                    registrations,
                }),
            )
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    info!("GET /api/users/{}", id);

    match state.registration_service.get_registration(&id).await {
        Ok(registration) => (
            StatusCode::OK,
            Json(RegistrationResponse {
                success: true,
                registration,
            }),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub async fn put_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRegistrationRequest>,
) -> Response {
    info!("PUT /api/users/{}", id);

    match state
        .registration_service
        .update_registration(&id, request)
        .await
    {
        Ok(registration) => (
            StatusCode::OK,
            Json(MutationResponse {
                success: true,
                message: "Registration updated successfully".to_string(),
                registration,
            }),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub async fn patch_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PatchRegistrationRequest>,
) -> Response {
    info!("PATCH /api/users/{}", id);

    match state
        .registration_service
        .patch_registration(&id, request)
        .await
    {
        Ok(registration) => (
            StatusCode::OK,
            Json(MutationResponse {
                success: true,
                message: "Registration updated successfully".to_string(),
                registration,
            }),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    info!("DELETE /api/users/{}", id);

    match state.registration_service.delete_registration(&id).await {
        Ok(registration) => (
            StatusCode::OK,
            Json(MutationResponse {
                success: true,
                message: "Registration deleted successfully".to_string(),
                registration,
            }),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}
