//! S3 bucket configuration.

use std::fmt;

#[cfg(feature = "config")]
use clap::Args;
use object_store::aws::AmazonS3Builder;
use serde::{Deserialize, Serialize};

use crate::{ObjectError, ObjectResult, ObjectStoreClient, TRACING_TARGET_CONNECTION};

/// Location and credentials of the bucket archive entries are read from.
///
/// Credentials left unset are resolved by the AWS default provider chain
/// (instance profile, web identity and so on).
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct S3Config {
    /// Bucket holding the archived objects
    #[cfg_attr(feature = "config", arg(long = "aws-bucket", env = "AWS_BUCKET"))]
    pub aws_bucket: String,

    /// Region of the bucket
    #[cfg_attr(
        feature = "config",
        arg(long = "aws-region", env = "AWS_REGION", default_value = "us-east-1")
    )]
    #[serde(default = "default_region")]
    pub aws_region: String,

    /// Custom endpoint for S3-compatible services (e.g. `http://localhost:9000`)
    #[cfg_attr(feature = "config", arg(long = "aws-endpoint", env = "AWS_ENDPOINT"))]
    #[serde(default)]
    pub aws_endpoint: Option<String>,

    /// Static access key id
    #[cfg_attr(
        feature = "config",
        arg(long = "aws-access-key-id", env = "AWS_ACCESS_KEY_ID")
    )]
    #[serde(default)]
    pub aws_access_key_id: Option<String>,

    /// Static secret access key
    #[cfg_attr(
        feature = "config",
        arg(long = "aws-secret-access-key", env = "AWS_SECRET_ACCESS_KEY")
    )]
    #[serde(default)]
    pub aws_secret_access_key: Option<String>,

    /// Session token for temporary credentials
    #[cfg_attr(
        feature = "config",
        arg(long = "aws-session-token", env = "AWS_SESSION_TOKEN")
    )]
    #[serde(default)]
    pub aws_session_token: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_owned()
}

impl S3Config {
    /// Creates a configuration for `bucket` in the default region.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            aws_bucket: bucket.into(),
            aws_region: default_region(),
            aws_endpoint: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
        }
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.aws_region = region.into();
        self
    }

    /// Sets a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.aws_endpoint = Some(endpoint.into());
        self
    }

    /// Sets static credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.aws_access_key_id = Some(access_key_id.into());
        self.aws_secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Returns whether the endpoint is plain HTTP.
    #[inline]
    pub fn allows_http(&self) -> bool {
        self.aws_endpoint
            .as_deref()
            .is_some_and(|endpoint| endpoint.starts_with("http://"))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ObjectResult<()> {
        if self.aws_bucket.is_empty() {
            return Err(ObjectError::Config("bucket cannot be empty".to_owned()));
        }

        if self.aws_region.is_empty() {
            return Err(ObjectError::Config("region cannot be empty".to_owned()));
        }

        if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
            return Err(ObjectError::Config(
                "access key id and secret access key must be set together".to_owned(),
            ));
        }

        Ok(())
    }

    /// Builds a client for the configured bucket.
    ///
    /// No request is issued; use [`ObjectStoreClient::verify_reachable`] to
    /// check the bucket.
    #[tracing::instrument(skip(self), target = TRACING_TARGET_CONNECTION)]
    pub fn connect(&self) -> ObjectResult<ObjectStoreClient> {
        self.validate()?;

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&self.aws_bucket)
            .with_region(&self.aws_region);

        if let Some(endpoint) = &self.aws_endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(self.allows_http());
        }

        if let Some(access_key_id) = &self.aws_access_key_id {
            builder = builder.with_access_key_id(access_key_id);
        }

        if let Some(secret_access_key) = &self.aws_secret_access_key {
            builder = builder.with_secret_access_key(secret_access_key);
        }

        if let Some(token) = &self.aws_session_token {
            builder = builder.with_token(token);
        }

        let store = builder.build().map_err(ObjectError::Build)?;

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            bucket = %self.aws_bucket,
            region = %self.aws_region,
            endpoint = ?self.aws_endpoint,
            "Object store client created"
        );

        Ok(ObjectStoreClient::new(store))
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |secret: &Option<String>| secret.as_ref().map(|_| "***");
        f.debug_struct("S3Config")
            .field("aws_bucket", &self.aws_bucket)
            .field("aws_region", &self.aws_region)
            .field("aws_endpoint", &self.aws_endpoint)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &mask(&self.aws_secret_access_key))
            .field("aws_session_token", &mask(&self.aws_session_token))
            .finish()
    }
}
