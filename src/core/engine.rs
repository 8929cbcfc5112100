use crate::core::generator::PromptedGenerator;
use crate::core::sanitizer::{self, ResultQuality, SanitizeReport};
use crate::domain::model::{Flashcard, FlashcardRequest};
use crate::domain::ports::CompletionService;
use crate::utils::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub flashcards: Vec<Flashcard>,
    pub quality: ResultQuality,
    pub report: SanitizeReport,
}

/// Text in, validated flashcards out.
///
/// An unreachable completion service is an `Err`; unusable model output is an
/// `Ok` with few or no cards.
pub struct FlashcardEngine<C: CompletionService> {
    generator: PromptedGenerator<C>,
}

impl<C: CompletionService> FlashcardEngine<C> {
    pub fn new(service: C) -> Self {
        Self {
            generator: PromptedGenerator::new(service),
        }
    }

    pub async fn run(&self, request: &FlashcardRequest) -> Result<GenerationResult> {
        tracing::info!("🚀 Generating flashcards");

        let raw = self.generator.generate(&request.text).await?;
        tracing::debug!("Raw completion: {}", raw);

        let report = sanitizer::sanitize(&raw);
        let quality = report.quality();

        match quality {
            ResultQuality::Complete => {
                tracing::info!("✅ Generated {} flashcards", report.flashcards.len());
            }
            ResultQuality::PartialOrEmpty => {
                tracing::warn!(
                    "⚠️ Generated {} flashcards (dropped: {}, repaired: {}, failure: {:?})",
                    report.flashcards.len(),
                    report.dropped,
                    report.repaired,
                    report.failure
                );
            }
        }

        Ok(GenerationResult {
            flashcards: report.flashcards.clone(),
            quality,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sanitizer::ParseFailure;
    use crate::domain::model::{CompletionChoice, CompletionResponse};
    use crate::utils::error::FlashgenError;
    use async_trait::async_trait;

    struct CannedService(std::result::Result<&'static str, u16>);

    #[async_trait]
    impl CompletionService for CannedService {
        async fn complete(&self, _system: &str, _user: &str) -> Result<CompletionResponse> {
            match self.0 {
                Ok(content) => Ok(CompletionResponse {
                    choices: vec![CompletionChoice {
                        content: Some(content.to_string()),
                    }],
                }),
                Err(status) => Err(FlashgenError::UpstreamStatus {
                    status,
                    message: "upstream down".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_run_returns_validated_cards() {
        let engine = FlashcardEngine::new(CannedService(Ok(
            r#"{"flashcards":[{"front":"Q1","back":"A1"},{"front":"Q2","back":"A2"}]}"#,
        )));

        let result = engine.run(&FlashcardRequest::new("text")).await.unwrap();

        assert_eq!(result.flashcards.len(), 2);
        assert_eq!(result.quality, ResultQuality::Complete);
    }

    #[tokio::test]
    async fn test_run_degrades_on_garbage() {
        let engine = FlashcardEngine::new(CannedService(Ok("Sorry, I cannot help with that.")));

        let result = engine.run(&FlashcardRequest::new("text")).await.unwrap();

        assert!(result.flashcards.is_empty());
        assert_eq!(result.quality, ResultQuality::PartialOrEmpty);
        assert_eq!(result.report.failure, Some(ParseFailure::Unparseable));
    }

    #[tokio::test]
    async fn test_run_surfaces_upstream_failure() {
        let engine = FlashcardEngine::new(CannedService(Err(503)));

        let err = engine.run(&FlashcardRequest::new("text")).await.unwrap_err();

        assert!(matches!(err, FlashgenError::UpstreamStatus { status: 503, .. }));
    }
}
