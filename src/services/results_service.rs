use std::sync::Arc;

use crate::{
    errors::AppResult,
    models::{
        domain::attempt::round_2,
        dto::response::{AttemptSummary, Statistics},
    },
    repositories::{AttemptRepository, CompletedTally},
};

/// Read-only projections over attempts. Nothing here mutates an attempt.
pub struct ResultsService {
    attempts: Arc<dyn AttemptRepository>,
}

impl ResultsService {
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    /// Newest first.
    pub async fn history(
        &self,
        participant_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<AttemptSummary>> {
        let attempts = self
            .attempts
            .find_by_participant(participant_id, offset, limit)
            .await?;
        Ok(attempts.into_iter().map(AttemptSummary::from).collect())
    }

    pub async fn statistics(&self, test_version: Option<i32>) -> AppResult<Statistics> {
        let tally = self.attempts.tally_completed(test_version).await?;
        Ok(statistics_from(test_version, tally))
    }
}

fn statistics_from(test_version: Option<i32>, tally: CompletedTally) -> Statistics {
    let CompletedTally {
        count,
        passed,
        score_sum,
    } = tally;

    if count <= 0 {
        return Statistics {
            test_version,
            count: 0,
            pass_rate: 0.0,
            average_score: 0.0,
        };
    }

    Statistics {
        test_version,
        count,
        pass_rate: round_2(100.0 * passed as f64 / count as f64),
        average_score: round_2(score_sum / count as f64),
    }
}
