use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};
use serde::Deserialize;

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{Answer, Attempt, AttemptStatus},
};

/// Running totals over completed attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct CompletedTally {
    pub count: i64,
    pub passed: i64,
    pub score_sum: f64,
}

impl CompletedTally {
    pub fn add(self, attempt: &Attempt) -> Self {
        CompletedTally {
            count: self.count + 1,
            passed: self.passed + i64::from(attempt.passed),
            score_sum: self.score_sum + attempt.overall.percentage,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the participant already has an
    /// in-progress attempt for the same test definition.
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>>;
    async fn find_in_progress(
        &self,
        participant_id: &str,
        test_definition_id: &str,
    ) -> AppResult<Option<Attempt>>;
    /// Upserts one answer. Returns `None` when the attempt is no longer in
    /// progress.
    async fn record_answer(
        &self,
        id: &str,
        question_id: &str,
        answer: &Answer,
    ) -> AppResult<Option<Attempt>>;
    /// Replaces the stored attempt only if it is still in progress.
    /// Returns `None` when another caller already completed it.
    async fn complete(&self, attempt: &Attempt) -> AppResult<Option<Attempt>>;
    /// Newest first.
    async fn find_by_participant(
        &self,
        participant_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Attempt>>;
    /// Aggregated server-side; attempts are never loaded into memory.
    async fn tally_completed(&self, test_version: Option<i32>) -> AppResult<CompletedTally>;
    async fn count_completed_for_definition(&self, test_definition_id: &str) -> AppResult<u64>;
    async fn delete_in_progress_for_definition(&self, test_definition_id: &str) -> AppResult<u64>;
}

pub struct MongoAttemptRepository {
    collection: Collection<Attempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::debug!("Creating indexes for attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let in_progress_index = IndexModel::builder()
            .keys(doc! { "participant_id": 1, "test_definition_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! {
                        "status": AttemptStatus::InProgress.as_str()
                    })
                    .name("participant_test_in_progress_unique".to_string())
                    .build(),
            )
            .build();

        let history_index = IndexModel::builder()
            .keys(doc! { "participant_id": 1, "started_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("participant_history".to_string())
                    .build(),
            )
            .build();

        let status_index = IndexModel::builder()
            .keys(doc! { "test_definition_id": 1, "status": 1 })
            .options(
                IndexOptions::builder()
                    .name("test_definition_status".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(in_progress_index).await?;
        self.collection.create_index(history_index).await?;
        self.collection.create_index(status_index).await?;

        log::debug!("Successfully created indexes for attempts collection");
        Ok(())
    }
}

fn completed_filter() -> Document {
    doc! {
        "status": {
            "$in": [AttemptStatus::Passed.as_str(), AttemptStatus::Failed.as_str()]
        }
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        self.collection.insert_one(&attempt).await?;
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_in_progress(
        &self,
        participant_id: &str,
        test_definition_id: &str,
    ) -> AppResult<Option<Attempt>> {
        let attempt = self
            .collection
            .find_one(doc! {
                "participant_id": participant_id,
                "test_definition_id": test_definition_id,
                "status": AttemptStatus::InProgress.as_str(),
            })
            .await?;
        Ok(attempt)
    }

    async fn record_answer(
        &self,
        id: &str,
        question_id: &str,
        answer: &Answer,
    ) -> AppResult<Option<Attempt>> {
        let mut set = Document::new();
        set.insert(
            format!("answers.{}", question_id),
            mongodb::bson::to_bson(answer)?,
        );

        let attempt = self
            .collection
            .find_one_and_update(
                doc! { "id": id, "status": AttemptStatus::InProgress.as_str() },
                doc! { "$set": set },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(attempt)
    }

    async fn complete(&self, attempt: &Attempt) -> AppResult<Option<Attempt>> {
        let stored = self
            .collection
            .find_one_and_replace(
                doc! { "id": &attempt.id, "status": AttemptStatus::InProgress.as_str() },
                attempt,
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(stored)
    }

    async fn find_by_participant(
        &self,
        participant_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! { "participant_id": participant_id })
            .sort(doc! { "started_at": -1 })
            .skip(offset.max(0) as u64)
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn tally_completed(&self, test_version: Option<i32>) -> AppResult<CompletedTally> {
        let mut filter = completed_filter();
        if let Some(version) = test_version {
            filter.insert("test_version", version);
        }

        let pipeline = vec![
            doc! { "$match": filter },
            doc! {
                "$group": {
                    "_id": null,
                    "count": { "$sum": 1 },
                    "passed": { "$sum": { "$cond": ["$passed", 1, 0] } },
                    "score_sum": { "$sum": "$overall.percentage" },
                }
            },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        match cursor.try_next().await? {
            Some(group) => Ok(mongodb::bson::from_document(group)?),
            None => Ok(CompletedTally::default()),
        }
    }

    async fn count_completed_for_definition(&self, test_definition_id: &str) -> AppResult<u64> {
        let mut filter = completed_filter();
        filter.insert("test_definition_id", test_definition_id);

        let count = self.collection.count_documents(filter).await?;
        Ok(count)
    }

    async fn delete_in_progress_for_definition(&self, test_definition_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .delete_many(doc! {
                "test_definition_id": test_definition_id,
                "status": AttemptStatus::InProgress.as_str(),
            })
            .await?;
        Ok(result.deleted_count)
    }
}
