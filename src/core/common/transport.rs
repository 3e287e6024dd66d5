use log::debug;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::api_error::ApiError;

pub const FBX_APP_AUTH_HEADER: &str = "X-Fbx-App-Auth";

/// Uniform `{success, error_code, result}` wrapper returned by every endpoint
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiEnvelope<T> {
    pub msg: Option<String>,
    pub success: Option<bool>,
    pub uid: Option<String>,
    pub error_code: Option<String>,
    pub result: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Error code reported by the API, an empty code counts as none
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Validates the envelope and hands back its payload.
    ///
    /// A failed envelope is classified into an [`ApiError::Api`], an envelope
    /// whose `success` flag contradicts its `error_code` is rejected as malformed.
    pub fn into_result(self, url: &str) -> Result<Option<T>, ApiError> {
        let success = self.success.unwrap_or(false);
        let code = self.error_code().map(str::to_string);

        match (success, code) {
            (true, None) => Ok(self.result),
            (false, Some(code)) => Err(ApiError::from_code(&code, self.msg)),
            (true, Some(code)) => Err(ApiError::MalformedEnvelope {
                url: url.to_string(),
                reason: format!("success response carries error_code {code}"),
            }),
            (false, None) => Err(ApiError::MalformedEnvelope {
                url: url.to_string(),
                reason: "failed response without error_code".to_string(),
            }),
        }
    }

    /// Same as [`ApiEnvelope::into_result`] but an absent result is an error
    pub fn into_required_result(self, url: &str) -> Result<T, ApiError> {
        self.into_result(url)?.ok_or_else(|| ApiError::MissingResult {
            url: url.to_string(),
        })
    }
}

/// Sends the request and decodes the response body as an envelope.
///
/// Transport failures and `404` responses are reported before any decoding, other
/// status codes still carry an envelope (the freebox answers `403` with `auth_required`).
pub async fn fetch_envelope<T: DeserializeOwned>(
    request: RequestBuilder,
    url: &str,
) -> Result<ApiEnvelope<T>, ApiError> {
    let resp = request.send().await.map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;

    if resp.status() == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound {
            url: url.to_string(),
        });
    }

    let body = resp.text().await.map_err(|source| ApiError::Transport {
        url: url.to_string(),
        source,
    })?;

    serde_json::from_str::<ApiEnvelope<T>>(&body).map_err(|source| {
        debug!("{url}: {body}");
        ApiError::Decode {
            url: url.to_string(),
            source,
        }
    })
}

/// An API call as handed to the session gateway by collaborators
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub header: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            header: FBX_APP_AUTH_HEADER.to_string(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}
