use thiserror::Error;

/*
auth_required 	Invalid session token, or not session token sent
invalid_token 	The app token you are trying to use is invalid or has been revoked
pending_token 	The app token you are trying to use has not been validated by user yet
insufficient_rights 	Your app permissions does not allow accessing this API
denied_from_external_ip 	You are trying to get an app_token from a remote IP
invalid_request 	Your request is invalid
ratelimited 	Too many auth error have been made from your IP
new_apps_denied 	New application token request has been disabled
apps_denied 	API access from apps has been disabled
internal_error 	Internal error
db_error 	The database you are trying to access doesn't seem to exist
nodev 	Invalid interface
 */

/// Semantic failure kind behind a Freebox `error_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Session expired or missing, only ever handled by the gateway
    AuthRequired,
    CredentialRevoked,
    PendingApproval,
    PermissionDenied,
    RemoteAccessDenied,
    InvalidRequest,
    RateLimited,
    RegistrationDisabled,
    ServerError,
    InvalidTarget,
    Unknown,
}

impl ApiErrorKind {
    /// Maps an API error code to its kind, unrecognized codes map to `Unknown`.
    pub fn classify(code: &str) -> Self {
        match code {
            "auth_required" => ApiErrorKind::AuthRequired,
            "invalid_token" => ApiErrorKind::CredentialRevoked,
            "pending_token" => ApiErrorKind::PendingApproval,
            "insufficient_rights" => ApiErrorKind::PermissionDenied,
            "denied_from_external_ip" => ApiErrorKind::RemoteAccessDenied,
            "invalid_request" => ApiErrorKind::InvalidRequest,
            "ratelimited" => ApiErrorKind::RateLimited,
            "new_apps_denied" | "apps_denied" => ApiErrorKind::RegistrationDisabled,
            "internal_error" | "db_error" => ApiErrorKind::ServerError,
            "nodev" => ApiErrorKind::InvalidTarget,
            _ => ApiErrorKind::Unknown,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ApiErrorKind::AuthRequired => "invalid session token, or no session token sent",
            ApiErrorKind::CredentialRevoked => {
                "the app token you are trying to use is invalid or has been revoked"
            }
            ApiErrorKind::PendingApproval => {
                "the app token you are trying to use has not been validated by user yet"
            }
            ApiErrorKind::PermissionDenied => "your app permissions does not allow accessing this API",
            ApiErrorKind::RemoteAccessDenied => "you are trying to get an app_token from a remote IP",
            ApiErrorKind::InvalidRequest => "your request is invalid",
            ApiErrorKind::RateLimited => "too many auth error have been made from your IP",
            ApiErrorKind::RegistrationDisabled => "application access or registration has been disabled",
            ApiErrorKind::ServerError => "the freebox reported an internal error",
            ApiErrorKind::InvalidTarget => "invalid interface",
            ApiErrorKind::Unknown => "the API returned an unknown error_code",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("{url}: transport failure: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url}: 404 Not Found")]
    NotFound { url: String },

    #[error("{url}: cannot decode response: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{url}: malformed response envelope: {reason}")]
    MalformedEnvelope { url: String, reason: String },

    #[error("{url}: response was empty")]
    MissingResult { url: String },

    #[error("{code}: {}", .kind.description())]
    Api {
        kind: ApiErrorKind,
        code: String,
        msg: Option<String>,
    },

    #[error("{url}: session was rejected again after renewal")]
    ReauthenticationFailed { url: String },

    #[error("cannot access application token at {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("application is not registered, please register it first")]
    NotRegistered,

    #[error("authorization has been denied on the freebox")]
    BootstrapDenied,

    #[error("authorization aborted after {attempts} attempts")]
    BootstrapTimedOut { attempts: u32 },

    #[error("cannot discover API url: {0}")]
    Discovery(String),
}

impl ApiError {
    pub fn from_code(code: &str, msg: Option<String>) -> Self {
        ApiError::Api {
            kind: ApiErrorKind::classify(code),
            code: code.to_string(),
            msg,
        }
    }

    /// Raw API error code, when the failure came from the freebox itself
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Api { code, .. } => Some(code.as_str()),
            ApiError::ReauthenticationFailed { .. } => Some("auth_required"),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            ApiError::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub(crate) fn is_auth_required(&self) -> bool {
        self.kind() == Some(ApiErrorKind::AuthRequired)
    }
}
