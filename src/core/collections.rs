use crate::domain::model::{
    Account, CollectionSummary, Flashcard, FlashcardCollection, PlanTier,
};
use crate::domain::ports::Storage;
use crate::utils::error::{FlashgenError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum number of saved collections per plan; `None` means unlimited.
///
/// In configuration a limit is either a count or the word `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    #[serde(default = "default_free_limit", with = "quota_limit")]
    pub free: Option<usize>,
    #[serde(default = "default_basic_limit", with = "quota_limit")]
    pub basic: Option<usize>,
    #[serde(default, with = "quota_limit")]
    pub pro: Option<usize>,
}

pub const UNLIMITED: &str = "unlimited";

/// Parses a quota limit from text: a count, or `unlimited`.
pub fn parse_quota_limit(value: &str) -> std::result::Result<Option<usize>, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case(UNLIMITED) {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| {
            format!(
                "invalid quota limit '{}', expected a number or '{}'",
                value, UNLIMITED
            )
        })
}

mod quota_limit {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Limit {
        Count(usize),
        Text(String),
    }

    pub fn serialize<S: Serializer>(
        limit: &Option<usize>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match limit {
            Some(count) => serializer.serialize_u64(*count as u64),
            None => serializer.serialize_str(super::UNLIMITED),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<usize>, D::Error> {
        match Limit::deserialize(deserializer)? {
            Limit::Count(count) => Ok(Some(count)),
            Limit::Text(text) => super::parse_quota_limit(&text).map_err(de::Error::custom),
        }
    }
}

fn default_free_limit() -> Option<usize> {
    Some(3)
}

fn default_basic_limit() -> Option<usize> {
    Some(25)
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free: default_free_limit(),
            basic: default_basic_limit(),
            pro: None,
        }
    }
}

impl QuotaPolicy {
    pub fn limit_for(&self, plan: PlanTier) -> Option<usize> {
        match plan {
            PlanTier::Free => self.free,
            PlanTier::Basic => self.basic,
            PlanTier::Pro => self.pro,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CollectionIndex {
    collections: Vec<CollectionSummary>,
}

/// User-scoped named flashcard collections on top of a `Storage` backend.
///
/// Layout: `users/<user>/index.json` lists the collections in save order and
/// `users/<user>/collections/<name>.json` holds the cards.
pub struct CollectionStore<S: Storage> {
    storage: S,
    quota: QuotaPolicy,
}

impl<S: Storage> CollectionStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_quota(storage, QuotaPolicy::default())
    }

    pub fn with_quota(storage: S, quota: QuotaPolicy) -> Self {
        Self { storage, quota }
    }

    pub async fn save(
        &self,
        account: &Account,
        name: &str,
        flashcards: Vec<Flashcard>,
    ) -> Result<CollectionSummary> {
        let name = validate_collection_name(name)?;
        validate_user_id(&account.user_id)?;

        if let Some(position) = flashcards.iter().position(|card| !card.is_valid()) {
            return Err(FlashgenError::ValidationError {
                message: format!("flashcard {} has an empty front or back", position + 1),
            });
        }

        let mut index = self.read_index(&account.user_id).await?;

        if index.collections.iter().any(|c| c.name == name) {
            return Err(FlashgenError::CollectionExists {
                name: name.to_string(),
            });
        }

        if let Some(limit) = self.quota.limit_for(account.plan) {
            if index.collections.len() >= limit {
                return Err(FlashgenError::QuotaExceeded {
                    plan: account.plan.to_string(),
                    limit,
                });
            }
        }

        let collection = FlashcardCollection {
            name: name.to_string(),
            created_at: Utc::now(),
            flashcards,
        };
        let summary = collection.summary();

        // 先寫入卡片，再更新索引
        let data = serde_json::to_vec_pretty(&collection)?;
        self.storage
            .write_file(&collection_path(&account.user_id, name), &data)
            .await?;

        index.collections.push(summary.clone());
        self.write_index(&account.user_id, &index).await?;

        tracing::info!(
            "💾 Saved collection '{}' ({} cards) for user {}",
            summary.name,
            summary.card_count,
            account.user_id
        );
        Ok(summary)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<CollectionSummary>> {
        validate_user_id(user_id)?;
        Ok(self.read_index(user_id).await?.collections)
    }

    pub async fn load(&self, user_id: &str, name: &str) -> Result<FlashcardCollection> {
        validate_user_id(user_id)?;
        let name = name.trim();
        let index = self.read_index(user_id).await?;
        if !index.collections.iter().any(|c| c.name == name) {
            return Err(FlashgenError::CollectionNotFound {
                name: name.to_string(),
            });
        }

        match self.storage.read_file(&collection_path(user_id, name)).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(FlashgenError::StorageNotFound { .. }) => Err(FlashgenError::CollectionNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, user_id: &str, name: &str) -> Result<()> {
        validate_user_id(user_id)?;
        let name = name.trim();
        let mut index = self.read_index(user_id).await?;
        let before = index.collections.len();
        index.collections.retain(|c| c.name != name);
        if index.collections.len() == before {
            return Err(FlashgenError::CollectionNotFound {
                name: name.to_string(),
            });
        }

        self.write_index(user_id, &index).await?;
        match self.storage.delete_file(&collection_path(user_id, name)).await {
            Ok(()) | Err(FlashgenError::StorageNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        tracing::info!("🗑️ Deleted collection '{}' for user {}", name, user_id);
        Ok(())
    }

    async fn read_index(&self, user_id: &str) -> Result<CollectionIndex> {
        match self.storage.read_file(&index_path(user_id)).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(FlashgenError::StorageNotFound { .. }) => Ok(CollectionIndex::default()),
            Err(e) => Err(e),
        }
    }

    async fn write_index(&self, user_id: &str, index: &CollectionIndex) -> Result<()> {
        let data = serde_json::to_vec_pretty(index)?;
        self.storage.write_file(&index_path(user_id), &data).await
    }
}

fn validate_collection_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FlashgenError::ValidationError {
            message: "collection name cannot be empty".to_string(),
        });
    }
    Ok(name)
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(FlashgenError::ValidationError {
            message: "user id cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Encodes one path segment. Dots are escaped too, so `.` and `..` never
/// resolve to a parent or sibling directory.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('.', "%2E")
}

fn index_path(user_id: &str) -> String {
    format!("users/{}/index.json", encode_segment(user_id))
}

fn collection_path(user_id: &str, name: &str) -> String {
    format!(
        "users/{}/collections/{}.json",
        encode_segment(user_id),
        encode_segment(name)
    )
}
