use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use csv::StringRecord;
use secrecy::{ExposeSecret, SecretString};
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{normalize_national_id, Participant},
        dto::{
            request::{CreateStaffRequest, ImportRow, NATIONAL_ID_REGEX},
            response::{ImportReport, RejectedRow},
        },
    },
    repositories::ParticipantRepository,
};

const NATIONAL_ID_HEADER: &str = "national_id_number";
const FULL_NAME_HEADER: &str = "full_name";

/// Identity provider for participants and staff, plus bulk import of the
/// participant roster.
pub struct ParticipantService {
    repository: Arc<dyn ParticipantRepository>,
}

impl ParticipantService {
    pub fn new(repository: Arc<dyn ParticipantRepository>) -> Self {
        Self { repository }
    }

    pub async fn authenticate_participant(&self, national_id: &str) -> AppResult<Participant> {
        let national_id = normalize_national_id(national_id);

        let participant = self
            .repository
            .find_by_national_id(&national_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                AppError::NotFound(format!("No active participant with national id {}", national_id))
            })?;

        if participant.is_staff() {
            return Err(AppError::Unauthorized(
                "Staff accounts must sign in with their access code".to_string(),
            ));
        }

        Ok(participant)
    }

    pub async fn authenticate_staff(
        &self,
        username: &str,
        access_code: &str,
    ) -> AppResult<Participant> {
        let invalid = || AppError::Unauthorized("Invalid staff credentials".to_string());

        let staff = self
            .repository
            .find_by_username(&username.trim().to_lowercase())
            .await?
            .filter(|p| p.is_active && p.is_staff())
            .ok_or_else(invalid)?;

        let hash = staff.access_code_hash.clone().ok_or_else(invalid)?;
        if !verify_access_code(access_code.to_string(), hash).await? {
            log::warn!("Rejected staff login for '{}'", username.trim());
            return Err(invalid());
        }

        Ok(staff)
    }

    pub async fn create_staff(&self, request: CreateStaffRequest) -> AppResult<Participant> {
        request.validate()?;

        let username = request.username.trim().to_lowercase();
        if self.repository.find_by_username(&username).await?.is_some() {
            return Err(AppError::AlreadyExists(format!(
                "Staff username '{}' is taken",
                username
            )));
        }

        let access_code_hash = hash_access_code(request.access_code.clone()).await?;
        let staff = Participant::new_staff(
            &request.national_id_number,
            &request.display_name,
            &username,
            access_code_hash,
        );

        let staff = self.repository.create(staff).await?;
        log::info!("Staff account '{}' created", username);
        Ok(staff)
    }

    /// Creates the configured staff account on first start. No-op when the
    /// username already exists.
    pub async fn ensure_bootstrap_staff(
        &self,
        username: &str,
        access_code: &SecretString,
    ) -> AppResult<()> {
        let normalized = username.trim().to_lowercase();
        if self.repository.find_by_username(&normalized).await?.is_some() {
            return Ok(());
        }

        let national_id = format!("STAFF{}", normalized.to_uppercase())
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(20)
            .collect::<String>();

        self.create_staff(CreateStaffRequest {
            national_id_number: national_id,
            display_name: username.trim().to_string(),
            username: normalized,
            access_code: access_code.expose_secret().to_string(),
        })
        .await
        .map(|_| ())
    }

    pub async fn get_participant(&self, id: &str) -> AppResult<Participant> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Participant {} not found", id)))
    }

    /// Upserts rows keyed on the normalized national id. Row numbers in the
    /// report are 1-based.
    pub async fn import_rows(&self, rows: Vec<ImportRow>) -> AppResult<ImportReport> {
        let mut report = ImportReport::default();

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;
            let full_name = row.full_name.trim();

            if !NATIONAL_ID_REGEX.is_match(&row.national_id_number) {
                report.rejected.push(RejectedRow {
                    row: row_number,
                    reason: format!("Invalid national id '{}'", row.national_id_number.trim()),
                });
                continue;
            }
            if full_name.is_empty() {
                report.rejected.push(RejectedRow {
                    row: row_number,
                    reason: "Full name is empty".to_string(),
                });
                continue;
            }

            let national_id = normalize_national_id(&row.national_id_number);
            match self.repository.find_by_national_id(&national_id).await? {
                Some(existing) if existing.display_name == full_name => report.unchanged += 1,
                Some(mut existing) => {
                    existing.display_name = full_name.to_string();
                    existing.modified_at = Some(Utc::now());
                    self.repository.update(existing).await?;
                    report.updated += 1;
                }
                None => match self.repository.create(Participant::new(&national_id, full_name)).await {
                    Ok(_) => report.created += 1,
                    Err(AppError::AlreadyExists(_)) => report.rejected.push(RejectedRow {
                        row: row_number,
                        reason: format!("National id {} was imported concurrently", national_id),
                    }),
                    Err(err) => return Err(err),
                },
            }
        }

        log::info!(
            "Participant import: {} created, {} updated, {} unchanged, {} rejected",
            report.created,
            report.updated,
            report.unchanged,
            report.rejected.len()
        );
        Ok(report)
    }

    pub async fn import_csv(&self, content: &str) -> AppResult<ImportReport> {
        let (parsed, parse_errors) = parse_import_csv(content)?;
        let (positions, rows): (Vec<usize>, Vec<ImportRow>) = parsed.into_iter().unzip();

        let mut report = self.import_rows(rows).await?;

        // import_rows numbers rows among the parsed ones only; map them back
        // to CSV data line numbers.
        for rejected in &mut report.rejected {
            if let Some(line) = positions.get(rejected.row - 1) {
                rejected.row = *line;
            }
        }
        report.rejected.extend(parse_errors);
        report.rejected.sort_by_key(|r| r.row);

        Ok(report)
    }
}

// bcrypt is CPU bound; keep it off the async workers.
async fn hash_access_code(access_code: String) -> AppResult<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(access_code, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::InternalError(format!("Access code hashing task failed: {}", e)))??;
    Ok(hash)
}

async fn verify_access_code(access_code: String, hash: String) -> AppResult<bool> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(access_code, &hash))
        .await
        .map_err(|e| AppError::InternalError(format!("Access code check task failed: {}", e)))??;
    Ok(matches)
}

/// Parsed rows paired with their 1-based data line number, and the lines
/// that could not be parsed.
type ParsedImport = (Vec<(usize, ImportRow)>, Vec<RejectedRow>);

fn parse_import_csv(content: &str) -> AppResult<ParsedImport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: StringRecord = reader.headers()?.clone();
    let header_map = header_positions(&headers)?;

    let mut rows = Vec::new();
    let mut rejected = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let row_number = index + 1;
        match result {
            Ok(record) => {
                let field = |name: &str| {
                    header_map
                        .get(name)
                        .and_then(|&i| record.get(i))
                        .unwrap_or_default()
                        .to_string()
                };
                rows.push((
                    row_number,
                    ImportRow {
                        national_id_number: field(NATIONAL_ID_HEADER),
                        full_name: field(FULL_NAME_HEADER),
                    },
                ));
            }
            Err(err) => rejected.push(RejectedRow {
                row: row_number,
                reason: format!("CSV parse error: {}", err),
            }),
        }
    }

    Ok((rows, rejected))
}

fn header_positions(headers: &StringRecord) -> AppResult<HashMap<String, usize>> {
    let map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase().replace(' ', "_"), i))
        .collect();

    for required in [NATIONAL_ID_HEADER, FULL_NAME_HEADER] {
        if !map.contains_key(required) {
            return Err(AppError::ValidationError(format!(
                "CSV is missing the '{}' column",
                required
            )));
        }
    }

    Ok(map)
}
