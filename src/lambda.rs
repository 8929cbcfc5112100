#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use flashgen::core::service::{FlashcardService, ServiceRequest, ServiceResponse};
#[cfg(feature = "lambda")]
use flashgen::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use flashgen::{ChatCompletionClient, CollectionStore, FlashcardEngine, LambdaConfig, S3Storage};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[cfg(feature = "lambda")]
type Service = FlashcardService<ChatCompletionClient<LambdaConfig>, S3Storage>;

#[cfg(feature = "lambda")]
async fn function_handler(
    service: &Service,
    event: LambdaEvent<ServiceRequest>,
) -> Result<ServiceResponse, Error> {
    tracing::info!(request_id = %event.context.request_id, "Handling flashcard request");

    match service.handle(event.payload).await {
        Ok(response) => Ok(response),
        Err(e) => {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            Err(Box::new(e) as Error)
        }
    }
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;

    // 創建AWS配置和S3客戶端
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .region(Region::new(lambda_config.s3_region.clone()))
        .build();
    let s3_client = S3Client::from_conf(s3_config);

    let storage = S3Storage::new(
        s3_client,
        lambda_config.s3_bucket.clone(),
        lambda_config.s3_prefix.clone(),
    );
    let collections = CollectionStore::with_quota(storage, lambda_config.quota);
    let engine = FlashcardEngine::new(ChatCompletionClient::new(lambda_config));
    let service = Service::new(engine, collections);

    run(service_fn(|event| function_handler(&service, event))).await
}
