use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::TestDefinition,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TestDefinitionRepository: Send + Sync {
    async fn create(&self, definition: TestDefinition) -> AppResult<TestDefinition>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<TestDefinition>>;
    async fn find_by_version(&self, version: i32) -> AppResult<Option<TestDefinition>>;
    async fn list(&self, include_inactive: bool) -> AppResult<Vec<TestDefinition>>;
    async fn update(&self, definition: TestDefinition) -> AppResult<TestDefinition>;
    async fn delete(&self, id: &str) -> AppResult<()>;
}

pub struct MongoTestDefinitionRepository {
    collection: Collection<TestDefinition>,
}

impl MongoTestDefinitionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("test_definitions");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::debug!("Creating indexes for test_definitions collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let version_index = IndexModel::builder()
            .keys(doc! { "version": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("version_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(version_index).await?;

        log::debug!("Successfully created indexes for test_definitions collection");
        Ok(())
    }
}

#[async_trait]
impl TestDefinitionRepository for MongoTestDefinitionRepository {
    async fn create(&self, definition: TestDefinition) -> AppResult<TestDefinition> {
        self.collection.insert_one(&definition).await?;
        Ok(definition)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<TestDefinition>> {
        let definition = self.collection.find_one(doc! { "id": id }).await?;
        Ok(definition)
    }

    async fn find_by_version(&self, version: i32) -> AppResult<Option<TestDefinition>> {
        let definition = self
            .collection
            .find_one(doc! { "version": version })
            .await?;
        Ok(definition)
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<TestDefinition>> {
        let filter = if include_inactive {
            doc! {}
        } else {
            doc! { "is_active": true }
        };

        let definitions = self
            .collection
            .find(filter)
            .sort(doc! { "version": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(definitions)
    }

    async fn update(&self, definition: TestDefinition) -> AppResult<TestDefinition> {
        let result = self
            .collection
            .replace_one(doc! { "id": &definition.id }, &definition)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Test definition with id '{}' not found",
                definition.id
            )));
        }

        Ok(definition)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;

        if result.deleted_count == 0 {
            return Err(AppError::NotFound(format!(
                "Test definition with id '{}' not found",
                id
            )));
        }

        Ok(())
    }
}
