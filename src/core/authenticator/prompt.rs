use serde::{Deserialize, Serialize};

pub const DEFAULT_APP_ID: &str = "fr.freebox.session.gateway";
pub const DEFAULT_APP_NAME: &str = "Freebox Session Gateway";

/// Static descriptor of this software sent when requesting an application token
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ApplicationIdentity {
    app_id: String,
    app_name: String,
    app_version: String,
    device_name: String,
}

impl ApplicationIdentity {
    pub fn new(app_id: String, app_name: String, app_version: String, device_name: String) -> Self {
        ApplicationIdentity {
            app_id,
            app_name,
            app_version,
            device_name,
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl Default for ApplicationIdentity {
    fn default() -> Self {
        let device_name = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "local".to_string());

        ApplicationIdentity::new(
            DEFAULT_APP_ID.to_string(),
            DEFAULT_APP_NAME.to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
            device_name,
        )
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct PromptResult {
    pub app_token: String,
    pub track_id: i32,
}
