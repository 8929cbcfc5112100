use crate::config::{DEFAULT_COMPLETION_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECONDS};
use crate::core::collections::QuotaPolicy;
use crate::core::ConfigProvider;
use crate::domain::model::{Account, PlanTier};
use crate::utils::error::{FlashgenError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub completion: CompletionConfig,
    pub storage: StorageConfig,
    pub account: AccountConfig,
    pub quota: QuotaPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
    pub json_mode: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COMPLETION_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            json_mode: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./flashcards".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub user_id: String,
    pub plan: PlanTier,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
            plan: PlanTier::Free,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FlashgenError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let mut config: Self =
            toml::from_str(&processed_content).map_err(|e| FlashgenError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.apply_env_fallbacks();
        Ok(config)
    }

    /// 替換環境變數 (例如 ${OPENROUTER_API_KEY})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Fills the API key from the environment when the file leaves it unset or unresolved.
    pub fn apply_env_fallbacks(&mut self) {
        let configured = self
            .completion
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("${"));

        if configured.is_none() {
            self.completion.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
    }

    pub fn account(&self) -> Account {
        Account::new(self.account.user_id.clone(), self.account.plan)
    }

    pub fn storage_path(&self) -> &str {
        &self.storage.path
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_url("completion.endpoint", &self.completion.endpoint)?;
        validate_non_empty_string("completion.model", &self.completion.model)?;
        validate_range(
            "completion.timeout_seconds",
            self.completion.timeout_seconds,
            1,
            600,
        )?;
        validate_path("storage.path", &self.storage.path)?;
        validate_non_empty_string("account.user_id", &self.account.user_id)?;

        if self.completion.api_key.is_none() {
            tracing::warn!(
                "⚠️ No API key configured; set completion.api_key or {}",
                API_KEY_ENV
            );
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn completion_endpoint(&self) -> &str {
        &self.completion.endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.completion.api_key.as_deref()
    }

    fn model(&self) -> &str {
        &self.completion.model
    }

    fn timeout_seconds(&self) -> u64 {
        self.completion.timeout_seconds
    }

    fn json_mode(&self) -> bool {
        self.completion.json_mode
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[completion]
endpoint = "https://api.example.com/v1/chat/completions"
api_key = "sk-test"
model = "example/model"
timeout_seconds = 30
json_mode = false

[storage]
path = "./test-cards"

[account]
user_id = "alice"
plan = "basic"

[quota]
free = 1
basic = 5
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(
            config.completion_endpoint(),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(config.api_key(), Some("sk-test"));
        assert_eq!(config.model(), "example/model");
        assert_eq!(config.timeout_seconds(), 30);
        assert!(!config.json_mode());
        assert_eq!(config.storage_path(), "./test-cards");
        assert_eq!(config.account(), Account::new("alice", PlanTier::Basic));
        assert_eq!(config.quota.limit_for(PlanTier::Basic), Some(5));
        assert_eq!(config.quota.limit_for(PlanTier::Pro), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.completion_endpoint(), DEFAULT_COMPLETION_ENDPOINT);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert!(config.json_mode());
        assert_eq!(config.account.user_id, "local");
        assert_eq!(config.quota, QuotaPolicy::default());
    }

    #[test]
    fn test_unlimited_quota_in_toml() {
        let config = TomlConfig::from_toml_str(
            r#"
[quota]
free = "unlimited"
basic = 0
pro = 50
"#,
        )
        .unwrap();

        assert_eq!(config.quota.limit_for(PlanTier::Free), None);
        assert_eq!(config.quota.limit_for(PlanTier::Basic), Some(0));
        assert_eq!(config.quota.limit_for(PlanTier::Pro), Some(50));

        let err = TomlConfig::from_toml_str("[quota]\nfree = \"plenty\"\n").unwrap_err();
        assert!(matches!(err, FlashgenError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FLASHGEN_TEST_ENDPOINT", "https://test.api.com/v1/chat/completions");

        let toml_content = r#"
[completion]
endpoint = "${FLASHGEN_TEST_ENDPOINT}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.completion.endpoint,
            "https://test.api.com/v1/chat/completions"
        );

        std::env::remove_var("FLASHGEN_TEST_ENDPOINT");
    }

    #[test]
    fn test_unresolved_key_placeholder_is_not_used() {
        let toml_content = r#"
[completion]
api_key = "${FLASHGEN_TEST_UNSET_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_ne!(config.api_key(), Some("${FLASHGEN_TEST_UNSET_KEY}"));
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[completion]
endpoint = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            r#"
[completion]
timeout_seconds = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[completion\nendpoint = ").unwrap_err();
        assert!(matches!(err, FlashgenError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[account]
user_id = "file-user"
plan = "pro"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.account(), Account::new("file-user", PlanTier::Pro));
    }
}
