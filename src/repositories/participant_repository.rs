use async_trait::async_trait;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Participant,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    async fn create(&self, participant: Participant) -> AppResult<Participant>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Participant>>;
    async fn find_by_national_id(&self, national_id_number: &str) -> AppResult<Option<Participant>>;
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Participant>>;
    async fn update(&self, participant: Participant) -> AppResult<Participant>;
}

pub struct MongoParticipantRepository {
    collection: Collection<Participant>,
}

impl MongoParticipantRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("participants");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::debug!("Creating indexes for participants collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let national_id_index = IndexModel::builder()
            .keys(doc! { "national_id_number": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("national_id_unique".to_string())
                    .build(),
            )
            .build();

        let username_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .sparse(true)
                    .name("username_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(national_id_index).await?;
        self.collection.create_index(username_index).await?;

        log::debug!("Successfully created indexes for participants collection");
        Ok(())
    }
}

#[async_trait]
impl ParticipantRepository for MongoParticipantRepository {
    async fn create(&self, participant: Participant) -> AppResult<Participant> {
        self.collection.insert_one(&participant).await?;
        Ok(participant)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Participant>> {
        let participant = self.collection.find_one(doc! { "id": id }).await?;
        Ok(participant)
    }

    async fn find_by_national_id(&self, national_id_number: &str) -> AppResult<Option<Participant>> {
        let participant = self
            .collection
            .find_one(doc! { "national_id_number": national_id_number })
            .await?;
        Ok(participant)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Participant>> {
        let participant = self
            .collection
            .find_one(doc! { "username": username })
            .await?;
        Ok(participant)
    }

    async fn update(&self, participant: Participant) -> AppResult<Participant> {
        let result = self
            .collection
            .replace_one(doc! { "id": &participant.id }, &participant)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Participant with id '{}' not found",
                participant.id
            )));
        }

        Ok(participant)
    }
}
