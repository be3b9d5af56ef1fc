use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::trace::TraceLayer;

use crate::dashboard::{self, Operation};
use crate::db::Database;
use crate::models::{Employer, JobInput};
use crate::pages::{self, EmployerListState, JobListState, PageOutcome};
use crate::view::{DashboardQuery, RequestContext};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, Database>, Response> {
        self.db.lock().map_err(|_| {
            tracing::error!("database lock poisoned");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Database unavailable." })),
            )
                .into_response()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerDetailsQuery {
    #[serde(alias = "EmployerId")]
    employer_id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/dashboard/employer-details", get(employer_details_handler))
        .route("/jobs", post(create_job_handler))
        .route("/jobs/:id", get(edit_job_form_handler).post(update_job_handler))
        .route(
            "/jobs/:id/delete",
            get(delete_job_form_handler).post(delete_job_handler),
        )
        .route("/employers", post(create_employer_handler))
        .route(
            "/employers/:name",
            get(edit_employer_form_handler).post(update_employer_handler),
        )
        .route(
            "/employers/:name/delete",
            get(delete_employer_form_handler).post(delete_employer_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(db: Database, addr: &str) -> Result<()> {
    let app = router(AppState::new(db));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("Serving dashboard on http://{}/dashboard", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn outcome_response<T: Serialize>(outcome: PageOutcome<T>) -> Response {
    match outcome {
        PageOutcome::Redirect(redirect) => {
            let location = redirect.location();
            (
                StatusCode::SEE_OTHER,
                [(header::LOCATION, location)],
                Json(redirect),
            )
                .into_response()
        }
        PageOutcome::NotFound { message } => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
        }
        render @ PageOutcome::Render { .. } => {
            tracing::debug!(errors = render.errors().len(), "form re-rendered");
            (StatusCode::UNPROCESSABLE_ENTITY, Json(render)).into_response()
        }
        show @ PageOutcome::Show { .. } => (StatusCode::OK, Json(show)).into_response(),
    }
}

async fn dashboard_handler(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let ctx = RequestContext::from_query(&query);
    let op = Operation::from_query(&query);
    let db = match state.store() {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match dashboard::dispatch(&*db, &ctx, op) {
        dashboard::Response::Page(model) => Json(model).into_response(),
        dashboard::Response::Json(reply) => json_reply(reply),
    }
}

async fn employer_details_handler(
    State(state): State<AppState>,
    Query(query): Query<EmployerDetailsQuery>,
) -> Response {
    let db = match state.store() {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    json_reply(dashboard::employer_details(&*db, query.employer_id.as_deref()))
}

fn json_reply(reply: dashboard::JsonReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply.body)).into_response()
}

async fn create_job_handler(
    State(state): State<AppState>,
    Query(list): Query<JobListState>,
    Json(input): Json<JobInput>,
) -> Response {
    match state.store() {
        Ok(db) => outcome_response(pages::create_job(&*db, input, &list)),
        Err(resp) => resp,
    }
}

async fn edit_job_form_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store() {
        Ok(db) => outcome_response(pages::edit_job_form(&*db, Some(&id))),
        Err(resp) => resp,
    }
}

async fn update_job_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(list): Query<JobListState>,
    Json(mut input): Json<JobInput>,
) -> Response {
    input.id = Some(id);
    match state.store() {
        Ok(db) => outcome_response(pages::update_job(&*db, input, &list)),
        Err(resp) => resp,
    }
}

async fn delete_job_form_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.store() {
        Ok(db) => outcome_response(pages::delete_job_form(&*db, Some(&id))),
        Err(resp) => resp,
    }
}

async fn delete_job_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(list): Query<JobListState>,
) -> Response {
    match state.store() {
        Ok(db) => outcome_response(pages::delete_job(&*db, Some(&id), &list)),
        Err(resp) => resp,
    }
}

async fn create_employer_handler(
    State(state): State<AppState>,
    Json(employer): Json<Employer>,
) -> Response {
    match state.store() {
        Ok(db) => outcome_response(pages::create_employer(&*db, employer)),
        Err(resp) => resp,
    }
}

async fn edit_employer_form_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.store() {
        Ok(db) => outcome_response(pages::edit_employer_form(&*db, Some(&name))),
        Err(resp) => resp,
    }
}

async fn update_employer_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(list): Query<EmployerListState>,
    Json(mut employer): Json<Employer>,
) -> Response {
    employer.name = Some(name);
    match state.store() {
        Ok(db) => outcome_response(pages::update_employer(&*db, employer, &list)),
        Err(resp) => resp,
    }
}

async fn delete_employer_form_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.store() {
        Ok(db) => outcome_response(pages::delete_employer_form(&*db, Some(&name))),
        Err(resp) => resp,
    }
}

async fn delete_employer_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(list): Query<EmployerListState>,
) -> Response {
    match state.store() {
        Ok(db) => outcome_response(pages::delete_employer(&*db, Some(&name), &list)),
        Err(resp) => resp,
    }
}
