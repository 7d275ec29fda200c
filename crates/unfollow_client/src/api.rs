use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use unfollow_logging::{unfollow_debug, unfollow_warn};
use url::Url;

use crate::{
    ApiError, BatchRequest, WireBatchAccepted, WireEnvelope, WireOperationDetails,
    WireOperationList, WireRateLimits, WireStatus,
};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    /// Raw `Cookie` header value carrying the server session.
    pub session_cookie: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            session_cookie: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The unfollow service's HTTP surface.
#[async_trait::async_trait]
pub trait UnfollowApi: Send + Sync {
    async fn status(&self) -> Result<WireStatus, ApiError>;
    async fn start_batch(&self, request: &BatchRequest) -> Result<WireBatchAccepted, ApiError>;
    async fn list_operations(&self) -> Result<WireOperationList, ApiError>;
    async fn operation_details(&self, operation_id: &str)
        -> Result<WireOperationDetails, ApiError>;
    /// Returns the server's confirmation message, if any.
    async fn cancel_operation(&self, operation_id: &str) -> Result<Option<String>, ApiError>;
    /// Returns how many operations the server dropped.
    async fn clear_batches(&self) -> Result<u32, ApiError>;
    async fn refresh_token(&self) -> Result<(), ApiError>;
    async fn retry_user_info(&self) -> Result<(), ApiError>;
    async fn rate_limits(&self) -> Result<WireRateLimits, ApiError>;
}

#[derive(Debug, Default, Deserialize)]
struct WireCleared {
    #[serde(default)]
    cleared_operations: u32,
}

#[derive(Debug, Default, Deserialize)]
struct WireRateLimitsReply {
    #[serde(default)]
    rate_limits: Option<WireRateLimits>,
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    client: reqwest::Client,
    base: Url,
    session_cookie: Option<String>,
}

impl ReqwestApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        Ok(Self {
            client,
            base,
            session_cookie: settings
                .session_cookie
                .clone()
                .filter(|cookie| !cookie.trim().is_empty()),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Vec<u8>>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        unfollow_debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie.as_str());
        }
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        decode_reply(status, &bytes)
    }
}

/// Non-2xx answers and `success: false` both become [`ApiError::Rejected`].
fn decode_reply<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<T, ApiError> {
    if !status.is_success() {
        let envelope: WireEnvelope = serde_json::from_slice(bytes).unwrap_or_default();
        unfollow_warn!("Server answered {}: {:?}", status, envelope.reason());
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message: envelope.reason(),
        });
    }

    let envelope: WireEnvelope =
        serde_json::from_slice(bytes).map_err(|err| ApiError::Decode(err.to_string()))?;
    if envelope.success == Some(false) {
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message: envelope.reason(),
        });
    }
    serde_json::from_slice(bytes).map_err(|err| ApiError::Decode(err.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(value).map_err(|err| ApiError::Decode(err.to_string()))
}

#[async_trait::async_trait]
impl UnfollowApi for ReqwestApi {
    async fn status(&self) -> Result<WireStatus, ApiError> {
        self.call(Method::GET, &["status"], None).await
    }

    async fn start_batch(&self, request: &BatchRequest) -> Result<WireBatchAccepted, ApiError> {
        let body = encode(request)?;
        self.call(Method::POST, &["unfollow", "slow-batch"], Some(body))
            .await
    }

    async fn list_operations(&self) -> Result<WireOperationList, ApiError> {
        self.call(Method::GET, &["unfollow", "slow-batch", "list"], None)
            .await
    }

    async fn operation_details(
        &self,
        operation_id: &str,
    ) -> Result<WireOperationDetails, ApiError> {
        self.call(
            Method::GET,
            &["unfollow", "slow-batch", operation_id, "status"],
            None,
        )
        .await
    }

    async fn cancel_operation(&self, operation_id: &str) -> Result<Option<String>, ApiError> {
        let envelope: WireEnvelope = self
            .call(
                Method::POST,
                &["unfollow", "slow-batch", operation_id, "cancel"],
                None,
            )
            .await?;
        Ok(envelope.message)
    }

    async fn clear_batches(&self) -> Result<u32, ApiError> {
        let cleared: WireCleared = self
            .call(Method::POST, &["debug", "clear-batches"], None)
            .await?;
        Ok(cleared.cleared_operations)
    }

    async fn refresh_token(&self) -> Result<(), ApiError> {
        let _: WireEnvelope = self.call(Method::POST, &["refresh-token"], None).await?;
        Ok(())
    }

    async fn retry_user_info(&self) -> Result<(), ApiError> {
        let _: WireEnvelope = self
            .call(Method::POST, &["api", "retry-user-info"], None)
            .await?;
        Ok(())
    }

    async fn rate_limits(&self) -> Result<WireRateLimits, ApiError> {
        let reply: WireRateLimitsReply = self
            .call(Method::GET, &["api", "rate-limits"], None)
            .await?;
        Ok(reply.rate_limits.unwrap_or_default())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::Timeout(err.to_string());
    }
    ApiError::Network(err.to_string())
}
