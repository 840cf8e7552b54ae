use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{db::Database, errors::AppResult, models::domain::Certificate};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the attempt already has a certificate.
    async fn create(&self, certificate: Certificate) -> AppResult<Certificate>;
    async fn find_by_attempt_id(&self, attempt_id: &str) -> AppResult<Option<Certificate>>;
    /// Most recently issued first.
    async fn find_by_national_id(
        &self,
        national_id_number: &str,
        limit: i64,
    ) -> AppResult<Vec<Certificate>>;
    /// Most recently issued first.
    async fn find_by_participant(
        &self,
        participant_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Certificate>>;
    /// Case-insensitive substring match on the participant name, most
    /// recently issued first.
    async fn search_by_name(&self, name: &str, limit: i64) -> AppResult<Vec<Certificate>>;
}

pub struct MongoCertificateRepository {
    collection: Collection<Certificate>,
}

impl MongoCertificateRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("certificates");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::debug!("Creating indexes for certificates collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let attempt_index = IndexModel::builder()
            .keys(doc! { "attempt_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("attempt_unique".to_string())
                    .build(),
            )
            .build();

        let number_index = IndexModel::builder()
            .keys(doc! { "certificate_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("certificate_number_unique".to_string())
                    .build(),
            )
            .build();

        let national_id_index = IndexModel::builder()
            .keys(doc! { "national_id_number": 1, "issued_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("national_id_issued".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(attempt_index).await?;
        self.collection.create_index(number_index).await?;
        let participant_index = IndexModel::builder()
            .keys(doc! { "participant_id": 1, "issued_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("participant_issued".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(national_id_index).await?;
        self.collection.create_index(participant_index).await?;

        log::debug!("Successfully created indexes for certificates collection");
        Ok(())
    }
}

#[async_trait]
impl CertificateRepository for MongoCertificateRepository {
    async fn create(&self, certificate: Certificate) -> AppResult<Certificate> {
        self.collection.insert_one(&certificate).await?;
        Ok(certificate)
    }

    async fn find_by_attempt_id(&self, attempt_id: &str) -> AppResult<Option<Certificate>> {
        let certificate = self
            .collection
            .find_one(doc! { "attempt_id": attempt_id })
            .await?;
        Ok(certificate)
    }

    async fn find_by_national_id(
        &self,
        national_id_number: &str,
        limit: i64,
    ) -> AppResult<Vec<Certificate>> {
        let certificates = self
            .collection
            .find(doc! { "national_id_number": national_id_number })
            .sort(doc! { "issued_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(certificates)
    }

    async fn find_by_participant(
        &self,
        participant_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Certificate>> {
        let certificates = self
            .collection
            .find(doc! { "participant_id": participant_id })
            .sort(doc! { "issued_at": -1 })
            .skip(offset.max(0) as u64)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(certificates)
    }

    async fn search_by_name(&self, name: &str, limit: i64) -> AppResult<Vec<Certificate>> {
        let certificates = self
            .collection
            .find(doc! {
                "participant_name": { "$regex": regex::escape(name), "$options": "i" }
            })
            .sort(doc! { "issued_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(certificates)
    }
}
