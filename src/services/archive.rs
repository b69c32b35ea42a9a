use bytes::Bytes;
use chrono::Utc;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Archive, CreateArchiveRequest, UploadedFile};
use crate::storage::BlobStore;

/// Archive service: orchestrates blob storage and metadata persistence.
/// This is the single place raw adapter and database failures are
/// classified; handlers only map error kinds to status codes.
pub struct ArchiveService;

impl ArchiveService {
    /// Store the payload, then persist its metadata record.
    ///
    /// Preconditions are checked in order and fail fast: payload non-empty,
    /// title non-empty, author non-empty. If the blob write fails no record
    /// is created. If the insert fails after a successful write, the
    /// orphaned blob is accepted.
    pub async fn upload(
        db: &Database,
        store: &dyn BlobStore,
        file: UploadedFile,
        req: CreateArchiveRequest,
    ) -> Result<Archive> {
        if file.data.is_empty() {
            return Err(AppError::Validation("File is empty".to_string()));
        }
        if req.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if req.author.trim().is_empty() {
            return Err(AppError::Validation("Author is required".to_string()));
        }

        let stored = store
            .put(file.data, &file.file_name, &file.content_type)
            .await?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO archives (title, description, author, storage_key, location_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.author)
        .bind(&stored.storage_key)
        .bind(&stored.location_url)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await?;

        Self::get_one(db, result.last_insert_rowid()).await
    }

    /// Fetch the blob behind a record. A missing record and a missing blob
    /// are indistinguishable to the caller: both are NotFound.
    pub async fn download(
        db: &Database,
        store: &dyn BlobStore,
        id: i64,
    ) -> Result<(Bytes, String, String)> {
        let archive = Self::get_one(db, id).await?;

        let (data, content_type) =
            store.get(&archive.storage_key).await.map_err(|e| {
                tracing::warn!("Blob fetch failed for archive {}: {}", id, e);
                AppError::NotFound("File not found in storage".to_string())
            })?;

        Ok((data, archive.storage_key, content_type))
    }

    /// All records, oldest first
    pub async fn list(db: &Database) -> Result<Vec<Archive>> {
        let archives: Vec<Archive> = sqlx::query_as("SELECT * FROM archives ORDER BY id ASC")
            .fetch_all(db.pool())
            .await?;

        Ok(archives)
    }

    /// Get one record by id
    pub async fn get_one(db: &Database, id: i64) -> Result<Archive> {
        let archive: Archive = sqlx::query_as("SELECT * FROM archives WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Archive {} not found", id)))?;

        Ok(archive)
    }

    /// Delete a record and, best-effort, its blob. The blob delete is
    /// allowed to fail silently; the record is removed regardless.
    pub async fn delete(db: &Database, store: &dyn BlobStore, id: i64) -> Result<()> {
        let archive = Self::get_one(db, id).await?;

        store.delete(&archive.storage_key).await;

        sqlx::query("DELETE FROM archives WHERE id = ?")
            .bind(id)
            .execute(db.pool())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalStoreConfig;
    use crate::storage::LocalStore;

    async fn setup(dir: &tempfile::TempDir) -> (Database, LocalStore) {
        let db_path = dir.path().join("test.db");
        let db = Database::new(&db_path.to_string_lossy()).await.unwrap();
        db.run_migrations().await.unwrap();
        let store = LocalStore::new(LocalStoreConfig {
            base_path: dir.path().join("blobs").to_string_lossy().into_owned(),
        });
        (db, store)
    }

    fn upload(name: &str, data: &'static [u8]) -> UploadedFile {
        UploadedFile {
            data: Bytes::from_static(data),
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
        }
    }

    fn meta(title: &str, author: &str) -> CreateArchiveRequest {
        CreateArchiveRequest {
            title: title.to_string(),
            author: author.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn upload_persists_record_after_blob_write() {
        let dir = tempfile::tempdir().unwrap();
        let (db, store) = setup(&dir).await;

        let archive = ArchiveService::upload(
            &db,
            &store,
            upload("report.pdf", b"0123456789"),
            meta("Q1 Report", "Alice"),
        )
        .await
        .unwrap();

        assert_eq!(archive.title, "Q1 Report");
        assert_eq!(archive.author, "Alice");
        assert!(archive.storage_key.ends_with("report.pdf"));
        assert!(!archive.location_url.is_empty());
    }

    #[tokio::test]
    async fn validation_failures_leave_no_record_and_no_blob() {
        let dir = tempfile::tempdir().unwrap();
        let (db, store) = setup(&dir).await;

        let cases = [
            (upload("a.pdf", b""), meta("T", "A"), "File is empty"),
            (upload("a.pdf", b"x"), meta("", "A"), "Title is required"),
            (upload("a.pdf", b"x"), meta("T", "  "), "Author is required"),
        ];

        for (file, req, expected) in cases {
            let err = ArchiveService::upload(&db, &store, file, req)
                .await
                .unwrap_err();
            match err {
                AppError::Validation(msg) => assert_eq!(msg, expected),
                other => panic!("expected validation error, got {:?}", other),
            }
        }

        assert!(ArchiveService::list(&db).await.unwrap().is_empty());
        // Blob directory was never touched
        assert!(!dir.path().join("blobs").exists());
    }

    #[tokio::test]
    async fn download_round_trips_uploaded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let (db, store) = setup(&dir).await;

        let archive = ArchiveService::upload(
            &db,
            &store,
            upload("doc.pdf", b"payload bytes"),
            meta("Doc", "Bob"),
        )
        .await
        .unwrap();

        let (data, key, content_type) =
            ArchiveService::download(&db, &store, archive.id).await.unwrap();
        assert_eq!(&data[..], b"payload bytes");
        assert_eq!(key, archive.storage_key);
        assert_eq!(content_type, "application/pdf");
    }

    #[tokio::test]
    async fn download_of_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (db, store) = setup(&dir).await;

        let err = ArchiveService::download(&db, &store, 999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn download_with_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (db, store) = setup(&dir).await;

        let archive =
            ArchiveService::upload(&db, &store, upload("gone.pdf", b"x"), meta("G", "A"))
                .await
                .unwrap();

        // Remove the blob behind the record's back
        std::fs::remove_file(dir.path().join("blobs").join(&archive.storage_key)).unwrap();

        let err = ArchiveService::download(&db, &store, archive.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn storage_keys_stay_unique_across_identical_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let (db, store) = setup(&dir).await;

        let mut keys = std::collections::HashSet::new();
        for _ in 0..5 {
            let archive =
                ArchiveService::upload(&db, &store, upload("same.pdf", b"x"), meta("T", "A"))
                    .await
                    .unwrap();
            assert!(keys.insert(archive.storage_key));
        }

        let listed = ArchiveService::list(&db).await.unwrap();
        assert_eq!(listed.len(), 5);
        for archive in listed {
            let fetched = ArchiveService::get_one(&db, archive.id).await.unwrap();
            assert_eq!(fetched.id, archive.id);
        }
    }

    #[tokio::test]
    async fn delete_removes_record_even_when_blob_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let (db, store) = setup(&dir).await;

        let archive =
            ArchiveService::upload(&db, &store, upload("del.pdf", b"x"), meta("D", "A"))
                .await
                .unwrap();
        std::fs::remove_file(dir.path().join("blobs").join(&archive.storage_key)).unwrap();

        ArchiveService::delete(&db, &store, archive.id).await.unwrap();

        let err = ArchiveService::get_one(&db, archive.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
