#[cfg(feature = "lambda")]
use crate::config::{DEFAULT_COMPLETION_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECONDS};
#[cfg(feature = "lambda")]
use crate::core::collections::{parse_quota_limit, QuotaPolicy};
#[cfg(feature = "lambda")]
use crate::core::{ConfigProvider, Storage};
#[cfg(feature = "lambda")]
use crate::utils::error::{FlashgenError, Result};
#[cfg(feature = "lambda")]
use crate::utils::validation::validate_required_field;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use std::env;

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub completion_endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
    pub json_mode: bool,
    pub s3_bucket: String,
    pub s3_prefix: String,
    pub s3_region: String,
    pub quota: QuotaPolicy,
}

#[cfg(feature = "lambda")]
fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse().ok())
}

/// A quota variable holds a count or `unlimited`; unset or malformed keeps the default.
#[cfg(feature = "lambda")]
fn quota_env(name: &str, default: Option<usize>) -> Option<usize> {
    match env::var(name) {
        Ok(value) => parse_quota_limit(&value).unwrap_or_else(|reason| {
            tracing::warn!("⚠️ Ignoring {}: {}", name, reason);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(feature = "lambda")]
impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = QuotaPolicy::default();
        let bucket = env::var("S3_BUCKET").ok().filter(|b| !b.trim().is_empty());

        Ok(Self {
            completion_endpoint: env::var("COMPLETION_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_COMPLETION_ENDPOINT.to_string()),
            api_key: env::var(crate::config::toml_config::API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: env::var("COMPLETION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout_seconds: parse_env("COMPLETION_TIMEOUT_SECONDS")
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            json_mode: parse_env("COMPLETION_JSON_MODE").unwrap_or(true),
            s3_bucket: validate_required_field("S3_BUCKET", &bucket)?.clone(),
            s3_prefix: env::var("S3_PREFIX").unwrap_or_else(|_| "flashgen".to_string()),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "ap-southeast-2".to_string()),
            quota: QuotaPolicy {
                free: quota_env("QUOTA_FREE", defaults.free),
                basic: quota_env("QUOTA_BASIC", defaults.basic),
                pro: quota_env("QUOTA_PRO", defaults.pro),
            },
        })
    }
}

#[cfg(feature = "lambda")]
impl ConfigProvider for LambdaConfig {
    fn completion_endpoint(&self) -> &str {
        &self.completion_endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn json_mode(&self) -> bool {
        self.json_mode
    }
}

#[cfg(feature = "lambda")]
impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        // 驗證API端點
        validate_url("COMPLETION_ENDPOINT", &self.completion_endpoint)?;
        validate_non_empty_string("COMPLETION_MODEL", &self.model)?;
        validate_range("COMPLETION_TIMEOUT_SECONDS", self.timeout_seconds, 1, 600)?;

        // 驗證S3 bucket名稱
        validate_s3_bucket_name("S3_BUCKET", &self.s3_bucket)?;

        // 驗證S3前綴
        validate_non_empty_string("S3_PREFIX", &self.s3_prefix)?;

        // 驗證區域
        validate_aws_region("S3_REGION", &self.s3_region)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(feature = "lambda")]
fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(FlashgenError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name must be between 3 and 63 characters".to_string(),
        });
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(FlashgenError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots"
                .to_string(),
        });
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(FlashgenError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name cannot start or end with a hyphen".to_string(),
        });
    }

    Ok(())
}

#[cfg(feature = "lambda")]
fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    crate::utils::validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(FlashgenError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

/// Collection storage in an S3 bucket under a key prefix.
#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    prefix: String,
}

#[cfg(feature = "lambda")]
impl S3Storage {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    fn key(&self, path: &str) -> String {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", prefix, path)
        }
    }
}

#[cfg(feature = "lambda")]
impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    FlashgenError::StorageNotFound {
                        path: path.to_string(),
                    }
                } else {
                    FlashgenError::StorageError {
                        message: format!("Failed to read from S3: {}", e),
                    }
                }
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| FlashgenError::StorageError {
                message: format!("Failed to collect S3 data: {}", e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .content_type("application/json")
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| FlashgenError::StorageError {
                message: format!("Failed to write to S3: {}", e),
            })?;

        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        // S3 刪除不存在的物件也會成功
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.key(path))
            .send()
            .await
            .map_err(|e| FlashgenError::StorageError {
                message: format!("Failed to delete from S3: {}", e),
            })?;

        Ok(())
    }
}

#[cfg(all(test, feature = "lambda"))]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name_rules() {
        assert!(validate_s3_bucket_name("S3_BUCKET", "flashgen-cards").is_ok());
        assert!(validate_s3_bucket_name("S3_BUCKET", "ab").is_err());
        assert!(validate_s3_bucket_name("S3_BUCKET", "Upper").is_err());
        assert!(validate_s3_bucket_name("S3_BUCKET", "-cards").is_err());
    }

    // 環境變數為整個行程共用，集中在同一個測試
    #[test]
    fn test_from_env_bucket_and_quota() {
        env::remove_var("S3_BUCKET");
        assert!(matches!(
            LambdaConfig::from_env(),
            Err(FlashgenError::MissingConfigError { field }) if field == "S3_BUCKET"
        ));

        env::set_var("S3_BUCKET", "flashgen-cards");
        env::set_var("QUOTA_FREE", "unlimited");
        env::set_var("QUOTA_BASIC", "not-a-number");
        env::set_var("QUOTA_PRO", "100");

        let config = LambdaConfig::from_env().unwrap();
        assert_eq!(config.s3_bucket, "flashgen-cards");
        assert_eq!(config.quota.free, None);
        assert_eq!(config.quota.basic, QuotaPolicy::default().basic);
        assert_eq!(config.quota.pro, Some(100));

        for name in ["S3_BUCKET", "QUOTA_FREE", "QUOTA_BASIC", "QUOTA_PRO"] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_region_rules() {
        assert!(validate_aws_region("S3_REGION", "ap-southeast-2").is_ok());
        assert!(validate_aws_region("S3_REGION", "AP_SOUTH").is_err());
    }
}
