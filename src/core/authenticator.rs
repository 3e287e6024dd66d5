use crate::core::common::{transport::fetch_envelope, ApiError};
use application_token_provider::{ApplicationToken, ApplicationTokenProvider};
use common::{AuthorizationResult, GrantStatus};
use log::{debug, info, warn};
use std::{sync::Arc, time::Duration};

pub mod application_token_provider;
pub mod common;
pub mod prompt;
pub mod session_token_provider;
pub use prompt::{ApplicationIdentity, PromptResult};
pub use session_token_provider::{SessionToken, SessionTokenProvider};


pub const DEFAULT_POOLING_INTERVAL: u64 = 6;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Bounds of the approval wait during registration
#[derive(Clone, Copy, Debug)]
pub struct RegistrationPolicy {
    pub pooling_interval: Duration,
    pub max_attempts: u32,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            pooling_interval: Duration::from_secs(DEFAULT_POOLING_INTERVAL),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Steps of the application token registration
enum RegistrationState {
    Requesting,
    AwaitingApproval { pending: PromptResult, attempts: u32 },
    Approved(ApplicationToken),
    Denied,
    TimedOut { attempts: u32 },
}

/// Owns the one-time application token registration against the freebox
pub struct Authenticator {
    api_url: String,
    client: reqwest::Client,
    identity: ApplicationIdentity,
    token_store: Arc<dyn ApplicationTokenProvider>,
}

impl Authenticator {
    pub fn new(
        api_url: String,
        client: reqwest::Client,
        identity: ApplicationIdentity,
        store: Arc<dyn ApplicationTokenProvider>,
    ) -> Self {
        Self {
            api_url,
            client,
            identity,
            token_store: store,
        }
    }

    pub fn identity(&self) -> &ApplicationIdentity {
        &self.identity
    }

    pub async fn is_registered(&self) -> Result<bool, ApiError> {
        let token = self.token_store.load().await?;

        Ok(token.is_some())
    }

    /// Requests a new application token and blocks until it is approved on the
    /// freebox front panel, denied, or the policy runs out of attempts.
    ///
    /// The token is persisted only once granted.
    pub async fn register(&self, policy: RegistrationPolicy) -> Result<ApplicationToken, ApiError> {
        let mut state = RegistrationState::Requesting;

        loop {
            state = match state {
                RegistrationState::Requesting => {
                    let pending = self.prompt().await?;
                    info!(
                        "Requested authorization, please go to the Freebox and check LCD screen instructions"
                    );
                    RegistrationState::AwaitingApproval {
                        pending,
                        attempts: 0,
                    }
                }
                RegistrationState::AwaitingApproval { pending, attempts } => {
                    if attempts >= policy.max_attempts {
                        RegistrationState::TimedOut { attempts }
                    } else {
                        tokio::time::sleep(policy.pooling_interval).await;

                        let res = self.get_authorization_status(pending.track_id).await?;
                        let attempts = attempts + 1;

                        match res.status {
                            GrantStatus::Granted => RegistrationState::Approved(
                                ApplicationToken::new(pending.app_token, Some(pending.track_id)),
                            ),
                            GrantStatus::Denied => RegistrationState::Denied,
                            GrantStatus::Timeout => RegistrationState::TimedOut { attempts },
                            GrantStatus::Pending => {
                                RegistrationState::AwaitingApproval { pending, attempts }
                            }
                            GrantStatus::Unknown => {
                                warn!("unrecognized authorization status, still waiting");
                                RegistrationState::AwaitingApproval { pending, attempts }
                            }
                        }
                    }
                }
                RegistrationState::Approved(token) => {
                    self.token_store.save(token.clone()).await?;
                    info!("Successfully registered application");
                    return Ok(token);
                }
                RegistrationState::Denied => {
                    warn!("Authorization has failed, reason: denied");
                    return Err(ApiError::BootstrapDenied);
                }
                RegistrationState::TimedOut { attempts } => {
                    warn!("Authorization has failed, reason: timeout after {attempts} attempts");
                    return Err(ApiError::BootstrapTimedOut { attempts });
                }
            };
        }
    }

    async fn prompt(&self) -> Result<PromptResult, ApiError> {
        debug!("prompting for registration");

        let url = format!("{}v4/login/authorize", self.api_url);
        let request = self.client.post(&url).json(&self.identity);
        let res = fetch_envelope::<PromptResult>(request, &url).await?;

        res.into_required_result(&url)
    }

    async fn get_authorization_status(
        &self,
        track_id: i32,
    ) -> Result<AuthorizationResult, ApiError> {
        debug!("checking authorization status");

        let url = format!("{}v4/login/authorize/{}", self.api_url, track_id);
        let res = fetch_envelope::<AuthorizationResult>(self.client.get(&url), &url).await?;

        res.into_required_result(&url)
    }
}
