//! Client for the remote REST API.
//!
//! Every call takes the caller's [`Credential`] explicitly; the client itself
//! holds no authentication state.

use std::time::Duration;

use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{AdminProfile, InUseReel, Reel, ReelUsageHistory};
use crate::records::{self, Record};
use crate::session::Credential;

const REEL_STOCKS: &str = "/admin/inventory/getReelStocks";
const IN_USE_REELS: &str = "/admin/inventory/getInUseReelsWithDetails";
const REEL_USAGE: &str = "/admin/reel/orderReelUsage";
const ADMIN_LOGIN: &str = "/admin/login";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub admin: AdminProfile,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(ApiClient {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /admin/inventory/getReelStocks`
    pub async fn reel_stocks(&self, credential: &Credential) -> Result<Vec<Reel>, AppError> {
        let records: Vec<Value> = self.get_json(credential, REEL_STOCKS).await?;
        records
            .into_iter()
            .map(|record| Reel::from_json(record).map_err(|e| AppError::Decode(e.to_string())))
            .collect()
    }

    /// `GET /admin/inventory/getInUseReelsWithDetails`
    pub async fn in_use_reels(&self, credential: &Credential) -> Result<Vec<InUseReel>, AppError> {
        self.get_json(credential, IN_USE_REELS).await
    }

    /// `GET /admin/reel/orderReelUsage/{barcodeId}`
    pub async fn reel_usage(
        &self,
        credential: &Credential,
        barcode: &str,
    ) -> Result<ReelUsageHistory, AppError> {
        let path = format!("{}/{}", REEL_USAGE, urlencoding::encode(barcode));
        self.get_json(credential, &path).await
    }

    /// List the records behind an admin screen
    ///
    /// # Arguments
    /// * `path` - The entity's list endpoint
    ///
    /// # Returns
    /// * `Result<Vec<Record>, AppError>` - The records, whether the backend
    ///   answers with a bare array or wraps it under `data`
    pub async fn list_records(&self, credential: &Credential, path: &str) -> Result<Vec<Record>, AppError> {
        let body: Value = self.get_json(credential, path).await?;
        records::records_from_json(body)
            .ok_or_else(|| AppError::Decode(format!("{} did not return a list", path)))
    }

    /// `POST` a new record to `path`
    pub async fn create_record(&self, credential: &Credential, path: &str, record: &Record) -> Result<(), AppError> {
        self.send_json(Method::POST, credential, path, record).await
    }

    /// `PUT` changes for record `id` to `{path}/{id}`
    pub async fn update_record(
        &self,
        credential: &Credential,
        path: &str,
        id: &str,
        record: &Record,
    ) -> Result<(), AppError> {
        let path = format!("{}/{}", path, urlencoding::encode(id));
        self.send_json(Method::PUT, credential, &path, record).await
    }

    /// `POST /admin/login`, returning the bearer token and admin profile
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let url = format!("{}{}", self.base_url, ADMIN_LOGIN);
        log::debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| {
                log::warn!("GET {} failed: {}", url, e);
                AppError::Transport(e.to_string())
            })?;
        Self::decode(response).await
    }

    async fn send_json(
        &self,
        method: Method,
        credential: &Credential,
        path: &str,
        body: &Record,
    ) -> Result<(), AppError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, url);
        let response = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(credential.token())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                log::warn!("{} {} failed: {}", method, url, e);
                AppError::Transport(e.to_string())
            })?;
        // success bodies vary per endpoint and are not needed
        if response.status().is_success() {
            return Ok(());
        }
        Self::decode::<Value>(response).await.map(|_| ())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            log::warn!("remote API responded {}: {}", status, message);
            return Err(AppError::Status {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Decode(e.to_string()))
    }
}

/// Pull a human message out of a JSON error body such as `{"message": "..."}`
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"message":"Reel not found","error":"x"}"#).as_deref(),
            Some("Reel not found")
        );
        assert_eq!(error_message(r#"{"error":"Unauthorized"}"#).as_deref(), Some("Unauthorized"));
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn base_url_is_normalised() {
        let config = Config {
            api_base_url: "http://example.com/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://example.com");
    }
}
