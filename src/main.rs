use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::Json,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use laudo_api::auth::{self, AuthError};
use laudo_api::{
    CreateReportReq, CreateReportRes, ErrorRes, HealthRes, HealthService, IntakeError, IssueRes,
    ListTemplatesRes, ReportIntake,
};
use laudo_core::{CoreConfig, TemplateRegistry};

/// Application state shared across REST API handlers
///
/// Contains the report intake service and the API token resolved at startup.
#[derive(Clone)]
struct AppState {
    intake: ReportIntake,
    api_token: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_templates, create_report),
    components(schemas(
        HealthRes,
        ListTemplatesRes,
        CreateReportReq,
        CreateReportRes,
        ErrorRes,
        IssueRes
    ))
)]
struct ApiDoc;

/// Main entry point for the Laudo report intake server
///
/// Starts the REST server with OpenAPI/Swagger documentation. Draft
/// persistence stays on the client; this server only receives finished
/// submissions, so the browser editor keeps working while it is down.
///
/// # Environment Variables
/// - `LAUDO_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `LAUDO_DATA_DIR`: Directory for stored reports (default: "/laudo_data")
/// - `LAUDO_DRAFT_DIR`: Directory for server-side draft tooling (default: "<data>/drafts")
/// - `LAUDO_API_TOKEN`: Bearer token required on report submission
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("laudo=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("LAUDO_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let config = Arc::new(CoreConfig::from_env_values(
        std::env::var("LAUDO_DATA_DIR").ok(),
        std::env::var("LAUDO_DRAFT_DIR").ok(),
    )?);
    let api_token = std::env::var("LAUDO_API_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty());
    if api_token.is_none() {
        tracing::warn!("LAUDO_API_TOKEN is not set; report submissions will be refused");
    }

    tracing::info!("++ Starting Laudo REST on {}", addr);
    tracing::info!("++ Reports directory: {}", config.reports_dir().display());

    let intake = ReportIntake::new(config, Arc::new(TemplateRegistry::builtin()));

    let app = Router::new()
        .route("/health", get(health))
        .route("/templates", get(list_templates))
        .route("/reports", post(create_report))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { intake, api_token });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the Laudo service.
/// This endpoint is used for monitoring and load balancer health checks.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/templates",
    responses(
        (status = 200, description = "Registered study templates", body = ListTemplatesRes)
    )
)]
/// List the study templates a client may author against
///
/// Keys are returned in registration order; a client submits its drafts
/// under one of these keys.
async fn list_templates(State(state): State<AppState>) -> Json<ListTemplatesRes> {
    Json(ListTemplatesRes {
        templates: state.intake.templates(),
    })
}

#[utoipa::path(
    post,
    path = "/reports",
    request_body = CreateReportReq,
    responses(
        (status = 201, description = "Report stored", body = CreateReportRes),
        (status = 400, description = "Unknown template or incomplete record", body = ErrorRes),
        (status = 401, description = "Invalid token or missing user identity", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Accept one report submission
///
/// The submitted draft goes through the full schema pass; a rejection
/// carries every field-level issue so the client can mark up its form in
/// one round trip.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the template key is not registered, or
/// - the record is incomplete after defaults are applied.
async fn create_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateReportReq>,
) -> Result<(StatusCode, Json<CreateReportRes>), (StatusCode, Json<ErrorRes>)> {
    let submitted_by = authenticate(&state, &headers)?;

    match state.intake.submit(&req.template, req.record, &submitted_by) {
        Ok(stored) => Ok((StatusCode::CREATED, Json(CreateReportRes { id: stored.id }))),
        Err(IntakeError::UnknownTemplate(e)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorRes::message(e.to_string())),
        )),
        Err(IntakeError::Invalid(errors)) => {
            Err((StatusCode::BAD_REQUEST, Json(ErrorRes::rejection(&errors))))
        }
        Err(IntakeError::Storage(e)) => {
            tracing::error!("Store report error: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorRes::message("Internal error")),
            ))
        }
    }
}

/// Checks the bearer token and resolves the submitting user.
fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<String, (StatusCode, Json<ErrorRes>)> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if let Err(e) = auth::validate_token(state.api_token.as_deref(), authorization) {
        return Err(match e {
            AuthError::TokenNotConfigured => {
                tracing::error!("Refusing submission: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorRes::message("Internal error")),
                )
            }
            _ => (StatusCode::UNAUTHORIZED, Json(ErrorRes::message(e.to_string()))),
        });
    }

    let user = headers
        .get(auth::USER_HEADER)
        .and_then(|value| value.to_str().ok());
    match auth::user_identity(user) {
        Ok(user) => Ok(user.to_owned()),
        Err(e) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorRes::message(e.to_string())),
        )),
    }
}
