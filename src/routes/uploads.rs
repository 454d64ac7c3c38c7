use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{delete, post},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    audit::log_audit,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::ApiResponse,
    state::AppState,
    storage,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub file_name: String,
    pub url: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image))
        .route("/{file_name}", delete(delete_image))
}

#[utoipa::path(
    post,
    path = "/api/uploads",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Store an image and return its public URL", body = ApiResponse<UploadResponse>),
        (status = 400, description = "Missing file part, wrong content type, or file too large"),
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadResponse>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field.content_type().unwrap_or("").to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let stored =
            storage::store_object(&state.config, &original_name, &content_type, &bytes).await?;

        if let Err(err) = log_audit(
            &state.pool,
            Some(user.user_id),
            "upload",
            Some("uploads"),
            Some(serde_json::json!({ "file_name": stored.file_name })),
        )
        .await
        {
            tracing::warn!(error = %err, "failed to write audit log");
        }

        let data = UploadResponse {
            url: stored.public_url,
            file_name: stored.file_name,
        };
        return Ok(Json(ApiResponse::success("File uploaded", data, None)));
    }

    Err(AppError::BadRequest("missing 'file' field".into()))
}

#[utoipa::path(
    delete,
    path = "/api/uploads/{file_name}",
    params(
        ("file_name" = String, Path, description = "Stored object name")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Object not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthUser,
    Path(file_name): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;
    storage::delete_object(&state.config, &file_name).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "upload_delete",
        Some("uploads"),
        Some(serde_json::json!({ "file_name": file_name })),
    )
    .await
    {
        tracing::warn!(error = %err, "failed to write audit log");
    }

    Ok(Json(ApiResponse::success(
        "File deleted",
        serde_json::json!({}),
        None,
    )))
}
