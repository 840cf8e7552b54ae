use std::{fmt, str::FromStr};

use async_graphql::Enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TRUE_TOKENS: [&str; 6] = ["true", "vrai", "1", "yes", "oui", "t"];
const FALSE_TOKENS: [&str; 6] = ["false", "faux", "0", "no", "non", "f"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Fr,
    En,
    Ar,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Fr => "fr",
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "fr" => Ok(Language::Fr),
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            other => Err(format!("Unsupported language '{}'", other)),
        }
    }
}

/// Statement text per language. French is mandatory, the other
/// translations fall back to it when missing or blank.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalizedText {
    pub fr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ar: Option<String>,
}

impl LocalizedText {
    pub fn get(&self, language: Language) -> &str {
        let translated = match language {
            Language::Fr => None,
            Language::En => self.en.as_deref(),
            Language::Ar => self.ar.as_deref(),
        };

        translated
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(&self.fr)
    }
}

/// A submitted answer as it arrives from a client. Normalized to a
/// boolean at the question boundary; anything that does not normalize
/// is scored as incorrect.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    IntFlag(i64),
    Token(String),
}

impl Answer {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Answer::Bool(value) => Some(*value),
            Answer::IntFlag(0) => Some(false),
            Answer::IntFlag(1) => Some(true),
            Answer::IntFlag(_) => None,
            Answer::Token(token) => {
                let token = token.trim().to_lowercase();
                if TRUE_TOKENS.contains(&token.as_str()) {
                    Some(true)
                } else if FALSE_TOKENS.contains(&token.as_str()) {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        Answer::Bool(value)
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Token(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub code: String,
    pub statement: LocalizedText,
    pub correct_answer: bool,
    pub is_mandatory: bool,
    pub points: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(code: &str, statement: LocalizedText, correct_answer: bool, points: i32) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            code: code.trim().to_string(),
            statement,
            correct_answer,
            is_mandatory: false,
            points,
            image_url: None,
            is_active: true,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn statement_for(&self, language: Language) -> &str {
        self.statement.get(language)
    }

    /// Never fails: a missing or unrecognized answer is simply wrong.
    pub fn check_answer(&self, answer: Option<&Answer>) -> bool {
        answer
            .and_then(Answer::as_bool)
            .map(|value| value == self.correct_answer)
            .unwrap_or(false)
    }
}
