pub mod collections;
pub mod engine;
pub mod generator;
pub mod sanitizer;
pub mod service;
pub mod study;

pub use crate::domain::model::{Flashcard, FlashcardRequest, RawCompletion};
pub use crate::domain::ports::{CompletionService, ConfigProvider, Storage};
pub use crate::utils::error::Result;
