//! Handlers de documentación de vehículos

use axum::{
    extract::{Extension, Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateDocumentRequest, DocumentResponse, ExpiringDocumentsQuery, UpdateDocumentRequest},
    middleware::auth::AuthenticatedUser,
    models::DocumentFilters,
    state::AppState,
    utils::errors::AppResult,
};

pub fn create_document_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents).post(create_document))
        .route("/expiring", get(expiring_documents))
        .route("/:id", get(get_document).put(update_document))
}

async fn create_document(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(request): Json<CreateDocumentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<DocumentResponse>>)> {
    request.validate()?;
    let document = state.documents.create(&user, request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            DocumentResponse::new(document, Utc::now().date_naive()),
            "Document registered",
        )),
    ))
}

async fn list_documents(
    State(state): State<AppState>,
    Query(filters): Query<DocumentFilters>,
) -> AppResult<Json<ApiResponse<Vec<DocumentResponse>>>> {
    let today = Utc::now().date_naive();
    let documents = state.documents.list(&filters).await?;
    Ok(Json(ApiResponse::success(
        documents.into_iter().map(|d| DocumentResponse::new(d, today)).collect(),
    )))
}

async fn expiring_documents(
    State(state): State<AppState>,
    Query(query): Query<ExpiringDocumentsQuery>,
) -> AppResult<Json<ApiResponse<Vec<DocumentResponse>>>> {
    query.validate()?;
    let today = Utc::now().date_naive();
    let documents = state.documents.expiring(today, query.days).await?;
    Ok(Json(ApiResponse::success(
        documents.into_iter().map(|d| DocumentResponse::new(d, today)).collect(),
    )))
}

async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DocumentResponse>>> {
    let document = state.documents.get(id).await?;
    Ok(Json(ApiResponse::success(DocumentResponse::new(document, Utc::now().date_naive()))))
}

async fn update_document(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDocumentRequest>,
) -> AppResult<Json<ApiResponse<DocumentResponse>>> {
    request.validate()?;
    let document = state.documents.update(&user, id, request.into()).await?;
    Ok(Json(ApiResponse::success(DocumentResponse::new(document, Utc::now().date_naive()))))
}
