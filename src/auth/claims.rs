use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{Participant, ParticipantRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Participant id
    pub national_id_number: String,
    pub display_name: String,
    pub role: ParticipantRole,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn new(participant: &Participant, expiration_hours: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours);

        Self {
            sub: participant.id.clone(),
            national_id_number: participant.national_id_number.clone(),
            display_name: participant.display_name.clone(),
            role: participant.role,
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == ParticipantRole::Staff
    }
}
