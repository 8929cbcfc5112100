use crate::core::collections::CollectionStore;
use crate::core::engine::FlashcardEngine;
use crate::domain::model::{
    Account, CollectionSummary, Flashcard, FlashcardCollection, FlashcardRequest,
};
use crate::domain::ports::{CompletionService, Storage};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// JSON request body of the internal RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServiceRequest {
    Generate {
        #[serde(default)]
        text: String,
    },
    SaveCollection {
        account: Account,
        name: String,
        flashcards: Vec<Flashcard>,
    },
    ListCollections {
        user_id: String,
    },
    GetCollection {
        user_id: String,
        name: String,
    },
    DeleteCollection {
        user_id: String,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceResponse {
    Flashcards { flashcards: Vec<Flashcard> },
    Saved { collection: CollectionSummary },
    Collections { collections: Vec<CollectionSummary> },
    Collection { collection: FlashcardCollection },
    Deleted { name: String },
}

pub struct FlashcardService<C: CompletionService, S: Storage> {
    engine: FlashcardEngine<C>,
    collections: CollectionStore<S>,
}

impl<C: CompletionService, S: Storage> FlashcardService<C, S> {
    pub fn new(engine: FlashcardEngine<C>, collections: CollectionStore<S>) -> Self {
        Self {
            engine,
            collections,
        }
    }

    pub async fn handle(&self, request: ServiceRequest) -> Result<ServiceResponse> {
        match request {
            ServiceRequest::Generate { text } => {
                let result = self.engine.run(&FlashcardRequest::new(text)).await?;
                Ok(ServiceResponse::Flashcards {
                    flashcards: result.flashcards,
                })
            }
            ServiceRequest::SaveCollection {
                account,
                name,
                flashcards,
            } => {
                let collection = self.collections.save(&account, &name, flashcards).await?;
                Ok(ServiceResponse::Saved { collection })
            }
            ServiceRequest::ListCollections { user_id } => Ok(ServiceResponse::Collections {
                collections: self.collections.list(&user_id).await?,
            }),
            ServiceRequest::GetCollection { user_id, name } => Ok(ServiceResponse::Collection {
                collection: self.collections.load(&user_id, &name).await?,
            }),
            ServiceRequest::DeleteCollection { user_id, name } => {
                self.collections.delete(&user_id, &name).await?;
                Ok(ServiceResponse::Deleted { name })
            }
        }
    }
}
