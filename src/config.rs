use std::env;

use secrecy::SecretString;

use crate::{
    errors::{AppError, AppResult},
    models::domain::Language,
};

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub certificate_validity_days: i64,
    pub site_title: String,
    pub default_language: Language,
    pub cors_allowed_origin: Option<String>,
    pub bootstrap_staff_username: Option<String>,
    pub bootstrap_staff_access_code: Option<SecretString>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "hse-induction-local".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(8),
            certificate_validity_days: env::var("CERTIFICATE_VALIDITY_DAYS")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(365),
            site_title: env::var("SITE_TITLE").unwrap_or_else(|_| "HSE Induction".to_string()),
            default_language: env::var("DEFAULT_LANGUAGE")
                .ok()
                .and_then(|l| l.parse().ok())
                .unwrap_or(Language::Ar),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
            bootstrap_staff_username: env::var("BOOTSTRAP_STAFF_USERNAME").ok(),
            bootstrap_staff_access_code: env::var("BOOTSTRAP_STAFF_ACCESS_CODE")
                .ok()
                .map(SecretString::from),
        }
    }

    /// Rejects configuration that must never reach production.
    pub fn validate_for_production(&self) -> AppResult<()> {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            return Err(AppError::ValidationError(
                "JWT_SECRET is using the default value".to_string(),
            ));
        }

        if jwt_secret.len() < 32 {
            return Err(AppError::ValidationError(format!(
                "JWT_SECRET is too short ({}), at least 32 characters are required",
                jwt_secret.len()
            )));
        }

        if self.certificate_validity_days < 1 {
            return Err(AppError::ValidationError(
                "CERTIFICATE_VALIDITY_DAYS must be positive".to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "hse-induction-test".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            certificate_validity_days: 365,
            site_title: "HSE Induction (test)".to_string(),
            default_language: Language::Fr,
            cors_allowed_origin: None,
            bootstrap_staff_username: None,
            bootstrap_staff_access_code: None,
        }
    }
}
