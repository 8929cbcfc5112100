#[cfg(feature = "cli")]
pub mod cli;
pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::model::PlanTier;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct:free";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "flashgen.toml";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "flashgen")]
#[command(about = "Generate study flashcards from text with a language model")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Chat completions endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Model identifier sent to the completion service
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory where collections are stored
    #[arg(long, global = true)]
    pub storage_path: Option<String>,

    /// User that owns the collections
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Plan tier of the user (free, basic, pro)
    #[arg(long, global = true)]
    pub plan: Option<PlanTier>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate flashcards from text (argument, file or stdin)
    Generate {
        /// Source text
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Read source text from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Save the generated cards as a named collection
        #[arg(long)]
        save: Option<String>,

        /// Print the cards as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved collections
    List,
    /// Print the cards of a collection
    Show { name: String },
    /// Study a collection card by card
    Study { name: String },
    /// Delete a collection
    Delete { name: String },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the TOML configuration (if any) and applies command-line overrides.
    pub fn load_settings(&self) -> Result<TomlConfig> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
                TomlConfig::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => {
                let mut defaults = TomlConfig::default();
                defaults.apply_env_fallbacks();
                defaults
            }
        };

        if let Some(endpoint) = &self.endpoint {
            settings.completion.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            settings.completion.model = model.clone();
        }
        if let Some(path) = &self.storage_path {
            settings.storage.path = path.clone();
        }
        if let Some(user) = &self.user {
            settings.account.user_id = user.clone();
        }
        if let Some(plan) = self.plan {
            settings.account.plan = plan;
        }

        Ok(settings)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_generate_command() {
        let cli = CliConfig::try_parse_from([
            "flashgen", "generate", "--text", "Mitochondria", "--save", "Cells", "--plan", "pro",
        ])
        .unwrap();

        assert_eq!(cli.plan, Some(PlanTier::Pro));
        match cli.command {
            Command::Generate { text, save, json, file } => {
                assert_eq!(text.as_deref(), Some("Mitochondria"));
                assert_eq!(save.as_deref(), Some("Cells"));
                assert!(!json);
                assert!(file.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_text_and_file_conflict() {
        let result = CliConfig::try_parse_from([
            "flashgen", "generate", "--text", "a", "--file", "b.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[account]\nuser_id = \"from-file\"\n\n[storage]\npath = \"./a\"\n")
            .unwrap();

        let cli = CliConfig::try_parse_from([
            "flashgen",
            "--config",
            temp_file.path().to_str().unwrap(),
            "--user",
            "from-cli",
            "list",
        ])
        .unwrap();
        let settings = cli.load_settings().unwrap();

        assert_eq!(settings.account.user_id, "from-cli");
        assert_eq!(settings.storage.path, "./a");
    }
}
