use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};

use crate::error::{AppError, Result};
use crate::models::{Archive, CreateArchiveRequest, UploadedFile};
use crate::services::ArchiveService;
use crate::AppState;

/// Maximum accepted payload size
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "pdf", "doc", "docx", "xls", "xlsx",
];

fn extension_allowed(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Upload a file with its metadata
/// POST /archives/upload
pub async fn upload_archive(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Archive>)> {
    let mut file: Option<UploadedFile> = None;
    let mut req = CreateArchiveRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to process multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file: {}", e))
                })?;

                file = Some(UploadedFile {
                    data,
                    file_name,
                    content_type,
                });
            }
            "title" => req.title = field.text().await.unwrap_or_default(),
            "author" => req.author = field.text().await.unwrap_or_default(),
            "description" => {
                let text = field.text().await.unwrap_or_default();
                if !text.is_empty() {
                    req.description = Some(text);
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("File is required".to_string()))?;

    if !extension_allowed(&file.file_name) {
        return Err(AppError::Validation(
            "Only jpg, jpeg, png, gif, pdf, doc, docx, xls, xlsx files are allowed".to_string(),
        ));
    }
    if file.data.len() > MAX_FILE_SIZE {
        return Err(AppError::Validation(
            "File exceeds the 5 MiB size limit".to_string(),
        ));
    }

    let archive = ArchiveService::upload(&state.db, state.store.as_ref(), file, req).await?;
    Ok((StatusCode::CREATED, Json(archive)))
}

/// Download the stored bytes
/// GET /archives/download/:id
pub async fn download_archive(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response> {
    let (data, storage_key, content_type) =
        ArchiveService::download(&state.db, state.store.as_ref(), id).await?;

    let fallback_name = storage_key.replace(['"', '\\'], "_");
    let encoded_name = urlencoding::encode(&storage_key);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                fallback_name, encoded_name
            ),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// List all archives
/// GET /archives
pub async fn list_archives(State(state): State<AppState>) -> Result<Json<Vec<Archive>>> {
    let archives = ArchiveService::list(&state.db).await?;
    Ok(Json(archives))
}

/// Get one archive
/// GET /archives/:id
pub async fn get_archive(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Archive>> {
    let archive = ArchiveService::get_one(&state.db, id).await?;
    Ok(Json(archive))
}

/// Delete an archive and, best-effort, its blob
/// DELETE /archives/:id
pub async fn delete_archive(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    ArchiveService::delete(&state.db, state.store.as_ref(), id).await?;
    Ok(Json(serde_json::json!({ "message": "Archive deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(extension_allowed("report.pdf"));
        assert!(extension_allowed("PHOTO.JPG"));
        assert!(extension_allowed("sheet.xlsx"));
        assert!(!extension_allowed("script.sh"));
        assert!(!extension_allowed("archive.tar.gz"));
        assert!(!extension_allowed("no_extension"));
    }
}
