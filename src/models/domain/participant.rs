use async_graphql::Enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Participant,
    Staff,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Participant {
    pub id: String,
    pub display_name: String,
    pub national_id_number: String,
    pub role: ParticipantRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code_hash: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Participant {
    pub fn new(national_id_number: &str, display_name: &str) -> Self {
        Participant {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.trim().to_string(),
            national_id_number: normalize_national_id(national_id_number),
            role: ParticipantRole::Participant,
            username: None,
            access_code_hash: None,
            is_active: true,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn new_staff(
        national_id_number: &str,
        display_name: &str,
        username: &str,
        access_code_hash: String,
    ) -> Self {
        Participant {
            role: ParticipantRole::Staff,
            username: Some(username.trim().to_lowercase()),
            access_code_hash: Some(access_code_hash),
            ..Participant::new(national_id_number, display_name)
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == ParticipantRole::Staff
    }
}

/// National ids are compared case-insensitively and without surrounding
/// whitespace.
pub fn normalize_national_id(value: &str) -> String {
    value.trim().to_uppercase()
}
