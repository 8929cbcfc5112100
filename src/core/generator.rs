use crate::domain::model::RawCompletion;
use crate::domain::ports::CompletionService;
use crate::utils::error::Result;

/// Instruction sent as the system turn of every generation request.
///
/// The card count and sentence length are requests to the model only; the
/// sanitizer accepts whatever well-formed cards come back.
pub const SYSTEM_PROMPT: &str = r#"
You are a helpful assistant that generates flashcards. You take in text and generate exactly 10 flashcards from it. Both front and back should be one short sentence long. Aim to create a balanced set of flashcards that covers the topic comprehensively without repeating the same fact. You MUST return your response as a single JSON object in the following format, with no additional text before or after the JSON:

{
  "flashcards": [
    {
      "front": "question",
      "back": "answer"
    }
  ]
}
"#;

pub struct PromptedGenerator<C: CompletionService> {
    service: C,
}

impl<C: CompletionService> PromptedGenerator<C> {
    pub fn new(service: C) -> Self {
        Self { service }
    }

    /// One completion request for `source_text`; no retries.
    ///
    /// Zero choices or an empty message yield an empty completion rather than an error.
    pub async fn generate(&self, source_text: &str) -> Result<RawCompletion> {
        tracing::debug!("Requesting flashcards for {} bytes of text", source_text.len());

        let response = self.service.complete(SYSTEM_PROMPT, source_text).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.content)
            .unwrap_or_default();

        if content.is_empty() {
            tracing::warn!("⚠️ Completion service returned no content");
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CompletionChoice, CompletionResponse};
    use crate::utils::error::FlashgenError;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingService {
        calls: Arc<Mutex<Vec<(String, String)>>>,
        choices: Vec<Option<String>>,
        fail: bool,
    }

    #[async_trait]
    impl CompletionService for RecordingService {
        async fn complete(&self, system: &str, user: &str) -> Result<CompletionResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            if self.fail {
                return Err(FlashgenError::UpstreamEmptyBody);
            }
            Ok(CompletionResponse {
                choices: self
                    .choices
                    .iter()
                    .cloned()
                    .map(|content| CompletionChoice { content })
                    .collect(),
            })
        }
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_text() {
        let service = RecordingService {
            choices: vec![Some("{\"flashcards\":[]}".to_string())],
            ..Default::default()
        };
        let generator = PromptedGenerator::new(service.clone());

        let raw = generator.generate("Photosynthesis converts light").await.unwrap();

        assert_eq!(raw, "{\"flashcards\":[]}");
        let calls = service.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, SYSTEM_PROMPT);
        assert_eq!(calls[0].1, "Photosynthesis converts light");
    }

    #[tokio::test]
    async fn test_generate_uses_first_choice() {
        let service = RecordingService {
            choices: vec![Some("first".to_string()), Some("second".to_string())],
            ..Default::default()
        };
        let generator = PromptedGenerator::new(service);

        assert_eq!(generator.generate("text").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_generate_without_choices_returns_empty() {
        let generator = PromptedGenerator::new(RecordingService::default());
        assert_eq!(generator.generate("text").await.unwrap(), "");

        let generator = PromptedGenerator::new(RecordingService {
            choices: vec![None],
            ..Default::default()
        });
        assert_eq!(generator.generate("text").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_generate_passes_empty_text_through() {
        let service = RecordingService::default();
        let generator = PromptedGenerator::new(service.clone());

        generator.generate("").await.unwrap();

        assert_eq!(service.calls.lock().unwrap()[0].1, "");
    }

    #[tokio::test]
    async fn test_generate_propagates_upstream_error_once() {
        let service = RecordingService {
            fail: true,
            ..Default::default()
        };
        let generator = PromptedGenerator::new(service.clone());

        let err = generator.generate("text").await.unwrap_err();

        assert!(err.is_upstream());
        assert_eq!(service.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_prompt_describes_expected_shape() {
        assert!(SYSTEM_PROMPT.contains("exactly 10 flashcards"));
        assert!(SYSTEM_PROMPT.contains("\"flashcards\""));
        assert!(SYSTEM_PROMPT.contains("no additional text"));
    }
}
