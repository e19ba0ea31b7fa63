use std::time::Duration;

use anyhow::Result;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;

pub mod filters;
pub mod select;
pub mod services;
pub mod types;

use types::{FilterPager, ListResponse};

const SESSION_TYPE_ADMIN: i32 = 2;
const SESSION_EXPIRY_SECS: i64 = 86_400;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const RETRY_ATTEMPTS: u32 = 3;

/// Vendor error when a filtered query would match more than 10 000 entries.
pub const ERR_MAX_MATCHES: &str = "QUERY_EXCEEDED_MAX_MATCHES_ALLOWED";

#[derive(Debug)]
pub enum KalturaError {
    /// The API answered with a KalturaAPIException envelope.
    Api { code: String, message: String },
    Http(reqwest::Error),
    Decode(serde_json::Error),
}

impl std::fmt::Display for KalturaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KalturaError::Api { code, message } => write!(f, "API error {}: {}", code, message),
            KalturaError::Http(err) => write!(f, "HTTP error: {}", err),
            KalturaError::Decode(err) => write!(f, "response decode error: {}", err),
        }
    }
}

impl std::error::Error for KalturaError {}

impl KalturaError {
    pub fn api_code(&self) -> Option<&str> {
        match self {
            KalturaError::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

/// Session-bound RPC client for the Kaltura api_v3 endpoint. One instance per
/// partner account; commands that span two accounts hold two clients.
pub struct KalturaClient {
    http: HttpClient,
    service_url: String,
    partner_id: i32,
    ks: String,
}

impl KalturaClient {
    /// Start an admin session and return a ready client.
    pub async fn login(config: &Config) -> Result<Self> {
        Self::login_with(
            &config.service_url,
            config.partner_id,
            &config.admin_secret,
            &config.user_id,
            &config.privileges,
        )
        .await
    }

    pub async fn login_with(
        service_url: &str,
        partner_id: i32,
        admin_secret: &str,
        user_id: &str,
        privileges: &str,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        let mut client = KalturaClient {
            http,
            service_url: service_url.trim_end_matches('/').to_string(),
            partner_id,
            ks: String::new(),
        };
        let ks: String = client
            .call(
                "session",
                "start",
                json!({
                    "secret": admin_secret,
                    "userId": user_id,
                    "type": SESSION_TYPE_ADMIN,
                    "partnerId": partner_id,
                    "expiry": SESSION_EXPIRY_SECS,
                    "privileges": privileges,
                }),
            )
            .await?;
        client.ks = ks;
        debug!("admin session opened for partner {}", partner_id);
        Ok(client)
    }

    pub fn partner_id(&self) -> i32 {
        self.partner_id
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// End the session. Best effort; the ks expires on its own regardless.
    pub async fn logout(&self) {
        if let Err(err) = self.call::<Value>("session", "end", json!({})).await {
            debug!("session.end failed: {}", err);
        }
    }

    fn endpoint(&self, service: &str, action: &str) -> String {
        format!("{}/api_v3/service/{}/action/{}", self.service_url, service, action)
    }

    /// One RPC round trip: POST JSON params, decode the JSON reply, surface
    /// KalturaAPIException envelopes as errors. Transient network failures
    /// and 5xx responses are retried with exponential backoff.
    pub async fn call<T: DeserializeOwned>(
        &self,
        service: &str,
        action: &str,
        mut params: Value,
    ) -> Result<T, KalturaError> {
        let endpoint = self.endpoint(service, action);
        if let Value::Object(map) = &mut params {
            map.insert("format".into(), json!(1));
            if !self.ks.is_empty() {
                map.insert("ks".into(), json!(self.ks));
            }
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.call_once(&endpoint, &params).await {
                Ok(value) => {
                    return serde_json::from_value(value).map_err(KalturaError::Decode);
                }
                Err(err) if attempt <= RETRY_ATTEMPTS && is_transient(&err) => {
                    let delay = Duration::from_millis(500 * (1 << attempt));
                    warn!(
                        "{}.{} attempt {} failed ({}); retrying in {:?}",
                        service, action, attempt, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn call_once(&self, endpoint: &str, params: &Value) -> Result<Value, KalturaError> {
        let response = self
            .http
            .post(endpoint)
            .json(params)
            .send()
            .await
            .map_err(KalturaError::Http)?;
        let status = response.status();
        if status.is_server_error() {
            // surface as a retryable API error with the status as code
            return Err(KalturaError::Api {
                code: format!("HTTP_{}", status.as_u16()),
                message: format!("server answered {}", status),
            });
        }
        let value: Value = response.json().await.map_err(KalturaError::Http)?;
        if let Some(exception) = as_api_exception(&value) {
            return Err(exception);
        }
        Ok(value)
    }

    /// Paginate a `*.list` action until a short page. `page_size` follows
    /// whatever the original workflow used (100 or 500).
    pub async fn list_all<T, F>(
        &self,
        service: &str,
        filter_object_type: &str,
        filter: &F,
        page_size: i32,
    ) -> Result<Vec<T>, KalturaError>
    where
        T: DeserializeOwned,
        F: Serialize,
    {
        let mut pager = FilterPager::new(page_size);
        let mut out: Vec<T> = Vec::new();
        loop {
            let page: ListResponse<T> = self
                .call(
                    service,
                    "list",
                    json!({
                        "filter": with_object_type(filter, filter_object_type),
                        "pager": &pager,
                    }),
                )
                .await?;
            let fetched = page.objects.len();
            out.extend(page.objects);
            if fetched < page_size as usize {
                break;
            }
            pager.page_index += 1;
        }
        Ok(out)
    }
}

/// Merge the vendor objectType discriminator into a serialized filter.
pub fn with_object_type<F: Serialize>(filter: &F, object_type: &str) -> Value {
    let mut value = serde_json::to_value(filter).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut value {
        map.insert("objectType".into(), json!(object_type));
    }
    value
}

fn as_api_exception(value: &Value) -> Option<KalturaError> {
    let obj = value.as_object()?;
    if obj.get("objectType")?.as_str()? != "KalturaAPIException" {
        return None;
    }
    Some(KalturaError::Api {
        code: obj.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN").to_string(),
        message: obj.get("message").and_then(Value::as_str).unwrap_or_default().to_string(),
    })
}

fn is_transient(err: &KalturaError) -> bool {
    match err {
        KalturaError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        KalturaError::Api { code, .. } => code.starts_with("HTTP_5"),
        KalturaError::Decode(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kaltura::filters::MediaEntryFilter;

    #[test]
    fn filter_serialization_omits_unset_fields() {
        let filter = MediaEntryFilter { tags_like: Some("lecture".into()), ..Default::default() };
        let value = with_object_type(&filter, MediaEntryFilter::OBJECT_TYPE);
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get("objectType").unwrap(), "KalturaMediaEntryFilter");
        assert_eq!(obj.get("tagsLike").unwrap(), "lecture");
        assert!(!obj.contains_key("idIn"));
        assert!(!obj.contains_key("userIdEqual"));
    }

    #[test]
    fn api_exception_envelope_becomes_error() {
        let body = serde_json::json!({
            "objectType": "KalturaAPIException",
            "code": "ENTRY_ID_NOT_FOUND",
            "message": "Entry id \"1_abc\" not found"
        });
        let err = as_api_exception(&body).expect("should detect exception");
        assert_eq!(err.api_code(), Some("ENTRY_ID_NOT_FOUND"));
    }

    #[test]
    fn plain_objects_are_not_exceptions() {
        let body = serde_json::json!({ "objectType": "KalturaMediaEntry", "id": "1_abc" });
        assert!(as_api_exception(&body).is_none());
    }
}
