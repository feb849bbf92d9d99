use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use thiserror::Error;
use url::Url;

use crate::domain::ports::ObjectStorage;

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage is disabled")]
    Disabled,
    #[error("invalid object url for {bucket}/{key}")]
    Url { bucket: String, key: String },
    #[error("upload failed: {0}")]
    Upload(String),
}

/// Virtual-hosted style URL of a public S3 object.
pub fn public_url(bucket: &str, region: &str, key: &str) -> Result<String, StorageError> {
    let invalid = || StorageError::Url {
        bucket: bucket.to_owned(),
        key: key.to_owned(),
    };
    let mut url =
        Url::parse(&format!("https://{bucket}.s3.{region}.amazonaws.com/")).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|()| invalid())?
        .pop_if_empty()
        .extend(key.split('/'));
    Ok(url.into())
}

/// Public-read uploads into one S3 bucket.
pub struct S3ObjectStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
}

impl S3ObjectStorage {
    #[must_use]
    pub fn new(sdk: &SdkConfig, bucket: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk),
            bucket: bucket.into(),
            region: sdk
                .region()
                .map_or_else(|| DEFAULT_REGION.to_owned(), ToString::to_string),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put_public(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> anyhow::Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| StorageError::Upload(DisplayErrorContext(&e).to_string()))?;
        Ok(public_url(&self.bucket, &self.region, key)?)
    }
}

pub struct DisabledStorage;

#[async_trait]
impl ObjectStorage for DisabledStorage {
    async fn put_public(
        &self,
        _key: &str,
        _body: Vec<u8>,
        _content_type: &str,
    ) -> anyhow::Result<String> {
        Err(StorageError::Disabled.into())
    }
}
