use std::sync::Arc;

use chrono::Utc;

use crate::{
    auth::{require_owner_or_staff, require_staff, Claims},
    errors::{AppError, AppResult},
    models::domain::{normalize_national_id, AttemptStatus, Certificate},
    repositories::{AttemptRepository, CertificateRepository, ParticipantRepository},
};

pub const SEARCH_RESULT_LIMIT: i64 = 5;
pub const NAME_SEARCH_LIMIT: i64 = 20;

pub struct CertificateService {
    certificates: Arc<dyn CertificateRepository>,
    attempts: Arc<dyn AttemptRepository>,
    participants: Arc<dyn ParticipantRepository>,
    validity_days: i64,
}

impl CertificateService {
    pub fn new(
        certificates: Arc<dyn CertificateRepository>,
        attempts: Arc<dyn AttemptRepository>,
        participants: Arc<dyn ParticipantRepository>,
        validity_days: i64,
    ) -> Self {
        Self {
            certificates,
            attempts,
            participants,
            validity_days,
        }
    }

    /// One certificate per passed attempt. Repeated or concurrent calls
    /// return the certificate that was stored first.
    pub async fn generate(&self, attempt_id: &str, claims: &Claims) -> AppResult<Certificate> {
        let attempt = self
            .attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt {} not found", attempt_id)))?;

        require_owner_or_staff(claims, &attempt.participant_id)?;

        if attempt.status != AttemptStatus::Passed || attempt.completed_at.is_none() {
            return Err(AppError::InvalidState(format!(
                "Attempt {} is {} and does not qualify for a certificate",
                attempt_id,
                attempt.status.as_str()
            )));
        }

        if let Some(existing) = self.certificates.find_by_attempt_id(attempt_id).await? {
            return Ok(existing);
        }

        let participant = self
            .participants
            .find_by_id(&attempt.participant_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Participant {} not found", attempt.participant_id))
            })?;

        let certificate =
            Certificate::issue(&attempt, &participant, Utc::now(), self.validity_days);

        match self.certificates.create(certificate).await {
            Ok(certificate) => {
                log::info!(
                    "Certificate {} issued for attempt {}",
                    certificate.certificate_number,
                    attempt_id
                );
                Ok(certificate)
            }
            Err(AppError::AlreadyExists(_)) => {
                log::warn!(
                    "Certificate for attempt {} was issued concurrently",
                    attempt_id
                );
                self.certificates
                    .find_by_attempt_id(attempt_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::InternalError(format!(
                            "Certificate for attempt {} collided but cannot be read back",
                            attempt_id
                        ))
                    })
            }
            Err(err) => Err(err),
        }
    }

    pub async fn search_by_national_id(&self, national_id: &str) -> AppResult<Vec<Certificate>> {
        self.certificates
            .find_by_national_id(&normalize_national_id(national_id), SEARCH_RESULT_LIMIT)
            .await
    }

    /// Newest first.
    pub async fn list_for_participant(
        &self,
        participant_id: &str,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<Certificate>> {
        self.certificates
            .find_by_participant(participant_id, offset, limit)
            .await
    }

    /// Staff only. Matches any part of the participant name, ignoring case.
    pub async fn search_by_name(&self, name: &str, claims: &Claims) -> AppResult<Vec<Certificate>> {
        require_staff(claims)?;

        let name = name.trim();
        if name.chars().count() < 2 {
            return Err(AppError::ValidationError(
                "Name search needs at least 2 characters".to_string(),
            ));
        }

        self.certificates
            .search_by_name(name, NAME_SEARCH_LIMIT)
            .await
    }
}
