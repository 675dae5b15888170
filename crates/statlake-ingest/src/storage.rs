//! Durable sink: S3-compatible object store
//!
//! The pipeline only needs `put_file` with overwrite semantics, expressed as
//! the [`ObjectSink`] trait so tests can run against a local directory. The
//! production implementation targets any S3-compatible store (AWS, MinIO)
//! and also carries the one-shot provisioning helpers: bucket creation and
//! partition-layout placeholders.

use crate::config::StorageConfig;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration, StorageClass},
    Client,
};
use std::path::Path;
use tracing::{debug, info};

/// Upload seam between the orchestrator and the durable store
#[async_trait]
pub trait ObjectSink: Send + Sync {
    /// Upload a local file to the logical key, overwriting any existing
    /// object at that key.
    async fn put_file(&self, local_path: &Path, key: &str) -> Result<()>;
}

/// S3-compatible object store client
#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    location: String,
    storage_class: StorageClass,
}

impl Storage {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        debug!(bucket = %config.bucket, region = %config.region, "Initializing storage client");

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "statlake-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(bucket = %config.bucket, "Storage client initialized");

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            location: config
                .location
                .clone()
                .unwrap_or_else(|| config.region.clone()),
            storage_class: StorageClass::from(config.storage_class.as_str()),
        })
    }

    /// Create the bucket if it does not exist yet; a no-op when it does.
    pub async fn ensure_bucket(&self) -> Result<()> {
        match self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
        {
            Ok(_) => {
                info!(bucket = %self.bucket, "Bucket already exists");
                return Ok(());
            },
            Err(e) => {
                let message = e.to_string();
                if !message.contains("NotFound") && !message.contains("404") {
                    return Err(IngestError::Storage(format!(
                        "failed to check bucket '{}': {}",
                        self.bucket, message
                    )));
                }
            },
        }

        let mut request = self.client.create_bucket().bucket(&self.bucket);

        // us-east-1 is the default location and must not be sent as an
        // explicit constraint.
        if self.location != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.location.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(|e| {
            IngestError::Storage(format!("failed to create bucket '{}': {}", self.bucket, e))
        })?;

        info!(
            bucket = %self.bucket,
            location = %self.location,
            storage_class = %self.storage_class.as_str(),
            "Bucket created"
        );

        Ok(())
    }

    /// Create a zero-byte marker object so the prefix shows up as a folder.
    pub async fn put_placeholder(&self, prefix: &str) -> Result<()> {
        let key = format!("{}/", prefix.trim_end_matches('/'));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from_static(b""))
            .send()
            .await
            .map_err(|e| {
                IngestError::Storage(format!("failed to create placeholder '{}': {}", key, e))
            })?;

        debug!(key = %key, "Created placeholder prefix");
        Ok(())
    }
}

#[async_trait]
impl ObjectSink for Storage {
    async fn put_file(&self, local_path: &Path, key: &str) -> Result<()> {
        debug!(
            path = %local_path.display(),
            bucket = %self.bucket,
            key = %key,
            "Uploading file"
        );

        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            IngestError::UploadFailed {
                key: key.to_string(),
                reason: format!("failed to read {}: {}", local_path.display(), e),
            }
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .storage_class(self.storage_class.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| IngestError::UploadFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        info!(bucket = %self.bucket, key = %key, "Uploaded");
        Ok(())
    }
}
