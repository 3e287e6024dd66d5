use serde::{Deserialize, Deserializer, Serialize};

use crate::core::common::Permissions;

/// Tracking status of a pending application token request
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    Pending,
    Granted,
    Denied,
    Timeout,
    #[serde(other)]
    Unknown,
}

impl Default for GrantStatus {
    fn default() -> Self {
        GrantStatus::Unknown
    }
}

/// A `null` status reads as `Unknown` as well
fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GrantStatus, D::Error> {
    Ok(Option::<GrantStatus>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthorizationResult {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: GrantStatus,
    #[allow(dead_code)]
    pub challenge: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ChallengeResult {
    pub challenge: String,
}

#[derive(Serialize, Debug)]
pub struct SessionPayload {
    pub app_id: String,
    pub password: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionResult {
    pub session_token: Option<String>,
    #[serde(default)]
    pub permissions: Permissions,
}

#[cfg(test)]
mod tests {
    use super::{AuthorizationResult, GrantStatus};

    #[test]
    fn grant_status_falls_back_to_unknown() {
        let cases = [
            ("pending", GrantStatus::Pending),
            ("granted", GrantStatus::Granted),
            ("denied", GrantStatus::Denied),
            ("timeout", GrantStatus::Timeout),
            ("unknown", GrantStatus::Unknown),
            ("whatever", GrantStatus::Unknown),
        ];

        for (raw, expected) in cases {
            let res: AuthorizationResult =
                serde_json::from_str(&format!(r#"{{"status": "{raw}"}}"#)).unwrap();
            assert_eq!(expected, res.status);
        }
    }

    #[test]
    fn null_or_missing_status_is_unknown() {
        for raw in [r#"{"status": null}"#, r#"{"challenge": "abcd"}"#] {
            let res: AuthorizationResult = serde_json::from_str(raw).unwrap();
            assert_eq!(GrantStatus::Unknown, res.status);
        }
    }
}
