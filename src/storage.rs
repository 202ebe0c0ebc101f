use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;

/// Presigned upload URLs stay valid for ten minutes.
const PRESIGN_TTL: Duration = Duration::from_secs(600);

/// StorageService
///
/// Object storage for product and brand images. Handlers only ever hand out
/// presigned PUT URLs; the browser uploads straight to the bucket.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if it is missing. Only called in `Env::Local` against MinIO.
    async fn ensure_bucket_exists(&self);

    /// Signed URL allowing a single PUT of `content_type` to `key`.
    async fn presigned_upload_url(&self, key: &str, content_type: &str)
    -> Result<String, AppError>;
}

/// S3StorageClient
///
/// aws-sdk-s3 client pointed at MinIO locally or Supabase Storage in production.
/// Both need path-style addressing.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        match self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            Ok(_) => tracing::info!(bucket = %self.bucket_name, "created storage bucket"),
            // Already-exists lands here too.
            Err(e) => tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped"),
        }
    }

    async fn presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, AppError> {
        let presigning = PresigningConfig::expires_in(PRESIGN_TTL)
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(sanitize_key(key))
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

/// Drops empty, `.` and `..` segments so a key can never escape its folder.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// Deterministic storage for tests. `should_fail` simulates an unreachable bucket.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, AppError> {
        if self.should_fail {
            return Err(AppError::Storage("mock storage unavailable".to_string()));
        }
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}

/// StorageState
///
/// Shared storage handle stored in `AppState`.
pub type StorageState = Arc<dyn StorageService>;
