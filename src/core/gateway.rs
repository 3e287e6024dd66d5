use std::sync::Arc;

use log::{debug, error, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::core::{
    authenticator::{
        application_token_provider::{ApplicationToken, ApplicationTokenProvider},
        Authenticator, RegistrationPolicy, SessionToken, SessionTokenProvider,
    },
    common::{transport::fetch_envelope, ApiError, ApiErrorKind, ApiRequest},
};


/// What the gateway does when no application token has been stored yet
#[derive(Clone, Copy, Debug)]
pub enum MissingTokenPolicy {
    /// Run the interactive registration, then log in
    Register(RegistrationPolicy),
    /// Fail with [`ApiError::NotRegistered`]
    Fail,
}

#[derive(Default)]
struct SessionState {
    token: Option<SessionToken>,
    /// bumped every time a new session token is installed
    generation: u64,
}

/// Single entry point for authenticated calls to the freebox API.
///
/// The gateway owns the session token. It logs in on first use, registers the
/// application when no token is stored (if allowed), and renews the session at
/// most once per call when the freebox answers `auth_required`. Logins happen
/// under one lock so concurrent callers hitting an expired session converge on
/// the same renewed token.
pub struct SessionGateway {
    api_url: String,
    client: Client,
    token_store: Arc<dyn ApplicationTokenProvider>,
    authenticator: Authenticator,
    session_provider: SessionTokenProvider,
    missing_token_policy: MissingTokenPolicy,
    session: Mutex<SessionState>,
}

impl SessionGateway {
    pub fn new(
        api_url: String,
        client: Client,
        authenticator: Authenticator,
        token_store: Arc<dyn ApplicationTokenProvider>,
        missing_token_policy: MissingTokenPolicy,
    ) -> Self {
        let session_provider = SessionTokenProvider::new(
            client.clone(),
            api_url.clone(),
            authenticator.identity().app_id().to_string(),
        );

        Self {
            api_url,
            client,
            token_store,
            authenticator,
            session_provider,
            missing_token_policy,
            session: Mutex::new(SessionState::default()),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Absolute url of an API path relative to the API base url, e.g. `v4/system/`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Current session, if one has been negotiated
    pub async fn session(&self) -> Option<SessionToken> {
        self.session.lock().await.token.clone()
    }

    /// Drops the current session and negotiates a fresh one
    pub async fn login(&self) -> Result<SessionToken, ApiError> {
        let mut state = self.session.lock().await;
        state.token = None;

        let token = self.authenticate().await?;
        state.generation += 1;
        state.token = Some(token.clone());

        Ok(token)
    }

    /// Performs an authenticated call and decodes its `result` into `T`.
    ///
    /// An absent `result` is decoded from JSON `null`, so `T` may be an `Option`
    /// or `()` for endpoints without payload.
    pub async fn call<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let (token, generation) = self
            .current_session()
            .await
            .map_err(|e| Self::hide_auth_required(e, request))?;

        let payload = match self.send(request, &token).await {
            Err(e) if e.is_auth_required() => {
                info!("session expired, renewing session token");

                let (token, _) = self
                    .renew_session(generation)
                    .await
                    .map_err(|e| Self::hide_auth_required(e, request))?;

                match self.send(request, &token).await {
                    Err(e) if e.is_auth_required() => {
                        error!("{}: freebox rejected the renewed session", request.url);
                        return Err(ApiError::ReauthenticationFailed {
                            url: request.url.clone(),
                        });
                    }
                    res => res?,
                }
            }
            res => res?,
        };

        serde_json::from_value::<T>(payload.unwrap_or(serde_json::Value::Null)).map_err(
            |source| ApiError::Decode {
                url: request.url.clone(),
                source,
            },
        )
    }

    /// `auth_required` is never handed to callers, a login answering it is a failed renewal
    fn hide_auth_required(e: ApiError, request: &ApiRequest) -> ApiError {
        match e.is_auth_required() {
            true => {
                error!("{}: freebox rejected the session login", request.url);
                ApiError::ReauthenticationFailed {
                    url: request.url.clone(),
                }
            }
            false => e,
        }
    }

    async fn send(
        &self,
        request: &ApiRequest,
        token: &SessionToken,
    ) -> Result<Option<serde_json::Value>, ApiError> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(request.header.as_str(), token.value());

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        fetch_envelope::<serde_json::Value>(builder, &request.url)
            .await?
            .into_result(&request.url)
    }

    async fn current_session(&self) -> Result<(SessionToken, u64), ApiError> {
        let mut state = self.session.lock().await;

        if let Some(token) = &state.token {
            return Ok((token.clone(), state.generation));
        }

        let token = self.authenticate().await?;
        state.generation += 1;
        state.token = Some(token.clone());

        Ok((token, state.generation))
    }

    /// Renews the session unless another caller already replaced the token
    /// rejected under `stale_generation`.
    async fn renew_session(&self, stale_generation: u64) -> Result<(SessionToken, u64), ApiError> {
        let mut state = self.session.lock().await;

        if state.generation != stale_generation {
            if let Some(token) = &state.token {
                debug!("session already renewed by a concurrent call");
                return Ok((token.clone(), state.generation));
            }
        }

        state.token = None;

        let token = self.authenticate().await?;
        state.generation += 1;
        state.token = Some(token.clone());

        Ok((token, state.generation))
    }

    /// Must be called with the session lock held.
    ///
    /// A revoked application token is replaced through registration when allowed,
    /// then login is attempted once more.
    async fn authenticate(&self) -> Result<SessionToken, ApiError> {
        let app_token = self.application_token().await?;

        match self.session_provider.login(&app_token).await {
            Err(e) if e.kind() == Some(ApiErrorKind::CredentialRevoked) => {
                match self.missing_token_policy {
                    MissingTokenPolicy::Register(policy) => {
                        warn!("application token has been revoked, registering again");
                        let app_token = self.authenticator.register(policy).await?;
                        self.session_provider.login(&app_token).await
                    }
                    MissingTokenPolicy::Fail => Err(e),
                }
            }
            res => res,
        }
    }

    async fn application_token(&self) -> Result<ApplicationToken, ApiError> {
        if let Some(token) = self.token_store.load().await? {
            return Ok(token);
        }

        match self.missing_token_policy {
            MissingTokenPolicy::Register(policy) => {
                info!("application is not registered, registering now");
                self.authenticator.register(policy).await
            }
            MissingTokenPolicy::Fail => {
                warn!("application is not registered, see register command");
                Err(ApiError::NotRegistered)
            }
        }
    }
}
