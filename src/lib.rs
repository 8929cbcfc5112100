pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use adapters::http::ChatCompletionClient;
pub use config::toml_config::TomlConfig;
pub use core::{
    collections::CollectionStore, engine::FlashcardEngine, sanitizer::sanitize_and_validate,
    service::FlashcardService,
};
pub use domain::model::{Account, Flashcard, FlashcardRequest, PlanTier};
pub use utils::error::{FlashgenError, Result};
