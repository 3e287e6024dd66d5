use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::{debug, error};
use reqwest::Client;
use sha1::Sha1;
type HmacSha1 = Hmac<Sha1>;

use crate::core::{
    authenticator::common::{ChallengeResult, SessionPayload, SessionResult},
    common::{transport::fetch_envelope, ApiError, ApiErrorKind, Permissions},
};

use super::application_token_provider::ApplicationToken;

/// Short-lived credential attached to every authenticated API call
#[derive(Clone)]
pub struct SessionToken {
    value: String,
    permissions: Permissions,
    issued_on: DateTime<Utc>,
}

impl SessionToken {
    pub fn new(value: String, permissions: Permissions) -> Self {
        Self {
            value,
            permissions,
            issued_on: Utc::now(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn issued_on(&self) -> DateTime<Utc> {
        self.issued_on
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("value", &"***")
            .field("permissions", &self.permissions)
            .field("issued_on", &self.issued_on)
            .finish()
    }
}

/// Trades an application token for a session token through the challenge handshake
#[derive(Clone)]
pub struct SessionTokenProvider {
    client: Client,
    api_url: String,
    app_id: String,
}

impl SessionTokenProvider {
    pub fn new(client: Client, api_url: String, app_id: String) -> Self {
        Self {
            client,
            api_url,
            app_id,
        }
    }

    pub async fn login(&self, app_token: &ApplicationToken) -> Result<SessionToken, ApiError> {
        debug!("login in");

        // a challenge is single use, always ask for a fresh one
        let challenge = self.get_challenge().await?;

        let password = compute_password(app_token.value(), &challenge.challenge);

        let session_result = match self.get_session_token(password).await {
            Err(e) => {
                if e.kind() == Some(ApiErrorKind::CredentialRevoked) {
                    error!("application token has been revoked, please register the application again");
                }
                return Err(e);
            }
            Ok(s) => s,
        };

        match session_result.session_token {
            Some(t) if !t.is_empty() => Ok(SessionToken::new(t, session_result.permissions)),
            _ => Err(ApiError::MissingResult {
                url: self.session_url(),
            }),
        }
    }

    async fn get_challenge(&self) -> Result<ChallengeResult, ApiError> {
        debug!("fetching challenge");

        let url = format!("{}v4/login/", self.api_url);
        let res = fetch_envelope::<ChallengeResult>(self.client.get(&url), &url).await?;

        res.into_required_result(&url)
    }

    async fn get_session_token(&self, password: String) -> Result<SessionResult, ApiError> {
        debug!("negociating session token");

        let payload = SessionPayload {
            app_id: self.app_id.clone(),
            password,
        };

        let url = self.session_url();
        let res =
            fetch_envelope::<SessionResult>(self.client.post(&url).json(&payload), &url).await?;

        if !res.success.unwrap_or(false) {
            error!("{}", res.msg.clone().unwrap_or_default());
        }

        res.into_required_result(&url)
    }

    fn session_url(&self) -> String {
        format!("{}v4/login/session", self.api_url)
    }
}

/// Hex encoded HMAC-SHA1 of the challenge keyed with the application token
pub fn compute_password(app_token: &str, challenge: &str) -> String {
    debug!("computing session password");

    let mut mac = match HmacSha1::new_from_slice(app_token.as_bytes()) {
        Ok(m) => m,
        Err(_) => unreachable!("hmac key of any size is valid"),
    };

    mac.update(challenge.as_bytes());

    let code = mac.finalize().into_bytes();
    code.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::{compute_password, SessionTokenProvider};
    use crate::core::{
        authenticator::application_token_provider::ApplicationToken,
        common::{ApiError, ApiErrorKind},
    };

    #[test]
    fn compute_password_matches_hmac_sha1_vector() {
        let password = compute_password("key", "The quick brown fox jumps over the lazy dog");

        assert_eq!("de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9", password);
    }

    async fn mount_challenge(mock_server: &MockServer, challenge: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path("/api/v4/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "logged_in": false, "challenge": challenge }, "success": true,
            })))
            .expect(times)
            .mount(mock_server)
            .await;
    }

    fn provider(mock_server: &MockServer) -> SessionTokenProvider {
        SessionTokenProvider::new(
            Client::new(),
            format!("{}/api/", mock_server.uri()),
            "fr.freebox.test".to_string(),
        )
    }

    #[tokio::test]
    async fn login_signs_challenge_with_app_token() {
        let mock_server = MockServer::start().await;
        mount_challenge(&mock_server, "1234", 1).await;

        Mock::given(method("POST"))
            .and(path("/api/v4/login/session"))
            .and(body_json(json!({
                "app_id": "fr.freebox.test",
                "password": compute_password("foo.bar", "1234"),
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "session_token": "4321",
                    "challenge": "5678",
                    "permissions": { "settings": true, "pvr": false }
                },
                "success": true,
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let token = provider(&mock_server)
            .login(&ApplicationToken::new("foo.bar".to_string(), Some(1)))
            .await
            .unwrap();

        assert_eq!("4321", token.value());
        assert_eq!(Some(true), token.permissions().settings);
        assert_eq!(vec!["settings"], token.permissions().granted());
    }

    #[tokio::test]
    async fn login_reports_revoked_application_token() {
        let mock_server = MockServer::start().await;
        mount_challenge(&mock_server, "1234", 1).await;

        Mock::given(method("POST"))
            .and(path("/api/v4/login/session"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "msg": "Erreur d'authentification de l'application",
                "success": false,
                "uid": "23b86ec8091013d668829fe12791fdab",
                "error_code": "invalid_token",
                "result": { "challenge": "5678" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let res = provider(&mock_server)
            .login(&ApplicationToken::new("foo.bar".to_string(), None))
            .await;

        match res {
            Err(e) => {
                assert_eq!(Some(ApiErrorKind::CredentialRevoked), e.kind());
                assert_eq!(Some("invalid_token"), e.code());
            }
            Ok(t) => panic!("unexpected session {t:?}"),
        }
    }

    #[tokio::test]
    async fn login_without_session_token_fails() {
        let mock_server = MockServer::start().await;
        mount_challenge(&mock_server, "1234", 1).await;

        Mock::given(method("POST"))
            .and(path("/api/v4/login/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "challenge": "5678" }, "success": true,
            })))
            .mount(&mock_server)
            .await;

        let res = provider(&mock_server)
            .login(&ApplicationToken::new("foo.bar".to_string(), None))
            .await;

        assert!(matches!(res, Err(ApiError::MissingResult { .. })));
    }

    #[tokio::test]
    async fn malformed_challenge_is_a_decode_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v4/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&mock_server)
            .await;

        let res = provider(&mock_server)
            .login(&ApplicationToken::new("foo.bar".to_string(), None))
            .await;

        assert!(matches!(res, Err(ApiError::Decode { .. })));
    }
}
