//! Configuration for the upload workflow.
//!
//! Every endpoint and protocol knob lives in [`UploadConfig`], built via
//! [`UploadConfigBuilder`] or read from the environment with
//! [`UploadConfig::from_env`]. The three endpoints have no sensible default:
//! a session that cannot reach the STS or the bucket cannot do its job, so
//! their absence is reported up front rather than on the first upload.

use crate::error::WordPasteError;
use serde::{Deserialize, Serialize};

/// Environment variable holding the multipart POST endpoint.
pub const ENV_UPLOAD_URL: &str = "OSS_UPLOAD_URL";
/// Environment variable holding the public base URL for uploaded objects.
pub const ENV_BASE_URL: &str = "OSS_BASE_URL";
/// Environment variable holding the STS credential endpoint.
pub const ENV_STS_URL: &str = "STS_URL";

/// Configuration for credential fetch, signing and upload.
///
/// # Example
/// ```rust
/// use wordpaste::UploadConfig;
///
/// let config = UploadConfig::builder()
///     .upload_endpoint("https://bucket.oss.example.com")
///     .base_url("https://cdn.example.com")
///     .sts_endpoint("https://api.example.com/sts")
///     .build()
///     .unwrap();
/// assert_eq!(config.credential_timeout_secs, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Endpoint receiving the signed multipart POST.
    pub upload_endpoint: String,

    /// Public base URL; the remote URL of an object is `base_url + "/" + key`.
    pub base_url: String,

    /// Endpoint issuing short-lived credentials.
    pub sts_endpoint: String,

    /// Object key prefix. Default: `pc/course/dev`.
    pub key_prefix: String,

    /// Timeout for the credential GET in seconds. Default: 10.
    pub credential_timeout_secs: u64,

    /// Timeout for the multipart POST in seconds. Default: 30.
    pub upload_timeout_secs: u64,

    /// Lifetime of the signed policy document in seconds. Default: 3600.
    pub policy_ttl_secs: i64,

    /// Upper bound of the `content-length-range` policy condition. Default: 1 GiB.
    pub max_content_length: u64,

    /// Value sent as `success_action_status`. Default: `"200"`.
    pub success_action_status: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_endpoint: String::new(),
            base_url: String::new(),
            sts_endpoint: String::new(),
            key_prefix: "pc/course/dev".to_string(),
            credential_timeout_secs: 10,
            upload_timeout_secs: 30,
            policy_ttl_secs: 3600,
            max_content_length: 1024 * 1024 * 1024,
            success_action_status: "200".to_string(),
        }
    }
}

impl UploadConfig {
    /// Create a new builder for `UploadConfig`.
    pub fn builder() -> UploadConfigBuilder {
        UploadConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read the three endpoints from `OSS_UPLOAD_URL`, `OSS_BASE_URL` and
    /// `STS_URL`. Any of them missing or empty is a fatal error.
    pub fn from_env() -> Result<Self, WordPasteError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`UploadConfig::from_env`], but reads through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WordPasteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |var: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| WordPasteError::MissingConfig {
                    var: var.to_string(),
                })
        };

        Self::builder()
            .upload_endpoint(require(ENV_UPLOAD_URL)?)
            .base_url(require(ENV_BASE_URL)?)
            .sts_endpoint(require(ENV_STS_URL)?)
            .build()
    }

    /// Public URL of an uploaded object.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

/// Builder for [`UploadConfig`].
#[derive(Debug)]
pub struct UploadConfigBuilder {
    config: UploadConfig,
}

impl UploadConfigBuilder {
    pub fn upload_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.upload_endpoint = url.into().trim().to_string();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn sts_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.sts_endpoint = url.into().trim().to_string();
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    pub fn credential_timeout_secs(mut self, secs: u64) -> Self {
        self.config.credential_timeout_secs = secs.max(1);
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs.max(1);
        self
    }

    pub fn policy_ttl_secs(mut self, secs: i64) -> Self {
        self.config.policy_ttl_secs = secs;
        self
    }

    pub fn max_content_length(mut self, bytes: u64) -> Self {
        self.config.max_content_length = bytes;
        self
    }

    pub fn success_action_status(mut self, status: impl Into<String>) -> Self {
        self.config.success_action_status = status.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<UploadConfig, WordPasteError> {
        let c = &self.config;
        for (name, value) in [
            ("upload endpoint", &c.upload_endpoint),
            ("base URL", &c.base_url),
            ("STS endpoint", &c.sts_endpoint),
        ] {
            if value.is_empty() {
                return Err(WordPasteError::InvalidConfig(format!("{name} must not be empty")));
            }
        }
        if c.policy_ttl_secs <= 0 {
            return Err(WordPasteError::InvalidConfig(format!(
                "Policy lifetime must be positive, got {}s",
                c.policy_ttl_secs
            )));
        }
        Ok(self.config)
    }
}
