//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderName, StatusCode},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::adapters::diary_llm::detect_mime_type;
use crate::error::ApiError;
use crate::web::state::AppState;
use pet_diary_core::domain::{normalize_optional, DiaryRecord};
use pet_diary_core::prompt::build_prompt;

/// Stored as the diary text when the LLM call fails: the record is still
/// created and the owner can edit the text afterwards.
pub const PLACEHOLDER_CONTENT: &str = "AIが自動生成する";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_diaries_handler,
        create_diary_handler,
        get_diary_handler,
        update_diary_handler,
        delete_diary_handler,
        upload_image_handler,
    ),
    components(
        schemas(
            DiaryRecordResponse,
            CreateDiaryRequest,
            UpdateDiaryRequest,
            UploadRequest,
            UploadResponse
        )
    ),
    tags(
        (name = "Pet Diary API", description = "API endpoints for the pet photo diary.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// One diary record as serialized to clients.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiaryRecordResponse {
    id: Uuid,
    author: String,
    pet_name: String,
    image_url: String,
    created_at: DateTime<Utc>,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pet_characteristics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_person_pronoun: Option<String>,
}

impl From<DiaryRecord> for DiaryRecordResponse {
    fn from(record: DiaryRecord) -> Self {
        Self {
            id: record.id,
            author: record.author,
            pet_name: record.pet_name,
            image_url: record.image_url,
            created_at: record.created_at,
            content: record.content,
            pet_characteristics: record.pet_characteristics,
            first_person_pronoun: record.first_person_pronoun,
        }
    }
}

/// The payload for creating a diary entry. `author` and `imageUrl` are
/// required; everything else parameterizes generation.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiaryRequest {
    author: String,
    image_url: String,
    pet_name: Option<String>,
    memo: Option<String>,
    pet_characteristics: Option<String>,
    first_person_pronoun: Option<String>,
}

/// A partial update. Absent fields retain their stored values; `author`,
/// `id` and `createdAt` are never accepted for modification.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiaryRequest {
    pet_name: Option<String>,
    image_url: Option<String>,
    content: Option<String>,
    pet_characteristics: Option<String>,
    first_person_pronoun: Option<String>,
}

/// A base64-encoded image upload.
#[derive(Deserialize, ToSchema)]
pub struct UploadRequest {
    image: String,
    filename: Option<String>,
}

/// The response payload sent after successfully storing an image.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    success: bool,
    image_url: String,
    id: Uuid,
}

/// An id that is not even a UUID cannot match any stored record.
fn parse_diary_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List every diary record.
#[utoipa::path(
    get,
    path = "/diaries",
    responses(
        (status = 200, description = "The full diary collection", body = [DiaryRecordResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_diaries_handler(
    State(state): State<Arc<AppState>>,
) -> Result<([(HeaderName, &'static str); 1], Json<Vec<DiaryRecordResponse>>), ApiError> {
    let records = state.store.read_all().await?;
    let body = records.into_iter().map(DiaryRecordResponse::from).collect();

    // The collection can change between requests; clients must not cache it.
    Ok(([(header::CACHE_CONTROL, "no-store")], Json(body)))
}

/// Create a diary record, generating its text from the uploaded photo.
#[utoipa::path(
    post,
    path = "/diaries",
    request_body = CreateDiaryRequest,
    responses(
        (status = 201, description = "Diary created successfully", body = DiaryRecordResponse),
        (status = 400, description = "Missing or type-invalid required fields"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_diary_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateDiaryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DiaryRecordResponse>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let pet_name = payload
        .pet_name
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_string();
    let characteristics = normalize_optional(payload.pet_characteristics);
    let pronoun = normalize_optional(payload.first_person_pronoun);
    let memo = normalize_optional(payload.memo);

    let prompt = build_prompt(
        &pet_name,
        characteristics.as_deref(),
        memo.as_deref(),
        pronoun.as_deref(),
    );

    // A photo that cannot be read back (external URL, missing file) drops
    // the request to the text-only generation variant.
    let image = match state.images.load(&payload.image_url).await {
        Ok(image) => image,
        Err(e) => {
            warn!("could not load stored image {}: {}", payload.image_url, e);
            None
        }
    };

    let generated = match &image {
        Some(bytes) => {
            let mime_type = detect_mime_type(bytes);
            state
                .generator
                .generate_with_image(&prompt, bytes, mime_type)
                .await
        }
        None => state.generator.generate(&prompt).await,
    };

    // Creation still succeeds when generation fails: the record carries the
    // placeholder text and the failure stays in the logs.
    let content = match generated {
        Ok(text) => text,
        Err(e) => {
            error!("diary generation failed, storing placeholder content: {}", e);
            PLACEHOLDER_CONTENT.to_string()
        }
    };

    let record = DiaryRecord {
        id: Uuid::new_v4(),
        author: payload.author,
        pet_name,
        image_url: payload.image_url,
        created_at: Utc::now(),
        content,
        pet_characteristics: characteristics,
        first_person_pronoun: pronoun,
    };

    let _guard = state.store_write_lock.lock().await;
    let mut records = state.store.read_all().await?;
    records.push(record.clone());
    state.store.write_all(&records).await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Fetch one diary record by id.
#[utoipa::path(
    get,
    path = "/diaries/{id}",
    params(("id" = String, Path, description = "The diary record id")),
    responses(
        (status = 200, description = "The matching record", body = DiaryRecordResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn get_diary_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DiaryRecordResponse>, ApiError> {
    let id = parse_diary_id(&id)?;
    let records = state.store.read_all().await?;
    let record = records
        .into_iter()
        .find(|r| r.id == id)
        .ok_or(ApiError::NotFound)?;

    Ok(Json(record.into()))
}

/// Update fields of one diary record. Never re-invokes generation.
#[utoipa::path(
    put,
    path = "/diaries/{id}",
    params(("id" = String, Path, description = "The diary record id")),
    request_body = UpdateDiaryRequest,
    responses(
        (status = 200, description = "The updated record", body = DiaryRecordResponse),
        (status = 400, description = "Type-invalid fields"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn update_diary_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDiaryRequest>, JsonRejection>,
) -> Result<Json<DiaryRecordResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let id = parse_diary_id(&id)?;

    let _guard = state.store_write_lock.lock().await;
    let mut records = state.store.read_all().await?;
    let record = records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or(ApiError::NotFound)?;

    if let Some(pet_name) = payload.pet_name {
        record.pet_name = pet_name.trim().to_string();
    }
    if let Some(image_url) = payload.image_url {
        record.image_url = image_url;
    }
    if let Some(content) = payload.content {
        record.content = content;
    }
    if let Some(characteristics) = payload.pet_characteristics {
        record.pet_characteristics = normalize_optional(Some(characteristics));
    }
    if let Some(pronoun) = payload.first_person_pronoun {
        record.first_person_pronoun = normalize_optional(Some(pronoun));
    }

    let updated = record.clone();
    state.store.write_all(&records).await?;

    Ok(Json(updated.into()))
}

/// Delete one diary record by id.
#[utoipa::path(
    delete,
    path = "/diaries/{id}",
    params(("id" = String, Path, description = "The diary record id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn delete_diary_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_diary_id(&id)?;

    let _guard = state.store_write_lock.lock().await;
    let mut records = state.store.read_all().await?;
    let before = records.len();
    records.retain(|r| r.id != id);
    if records.len() == before {
        return Err(ApiError::NotFound);
    }
    state.store.write_all(&records).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Store an uploaded image and return its public path.
#[utoipa::path(
    post,
    path = "/upload",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing or invalid image payload"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_image_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let encoded = payload.image.trim();
    if encoded.is_empty() {
        return Err(ApiError::BadRequest("image payload is required".to_string()));
    }
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| ApiError::BadRequest(format!("image is not valid base64: {}", e)))?;

    let stored = state.images.store(&bytes, payload.filename.as_deref()).await?;

    Ok(Json(UploadResponse {
        success: true,
        image_url: stored.public_url,
        id: stored.id,
    }))
}
