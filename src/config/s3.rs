use crate::config::IngestConfig;
use crate::core::{ObjectStore, StorageKey};
use crate::utils::error::{EtlError, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Builds a client from the ambient AWS credential chain plus the
    /// region and endpoint overrides in `config`.
    pub async fn connect(config: &IngestConfig) -> Result<Self> {
        let bucket = config.bucket_name()?;
        let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(region) = &config.region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::debug!("Using S3 bucket {}", bucket);
        Ok(Self::new(S3Client::from_conf(builder.build()), bucket))
    }
}

impl ObjectStore for S3Storage {
    async fn exists(&self, key: &StorageKey) -> Result<bool> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => match err.into_service_error() {
                HeadObjectError::NotFound(_) => Ok(false),
                err => Err(EtlError::storage(key.as_str(), err)),
            },
        }
    }

    async fn put(&self, key: &StorageKey, data: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| EtlError::storage(key.as_str(), e.into_service_error()))?;
        Ok(())
    }

    fn uri(&self, key: &StorageKey) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}
