use serde::Deserialize;
use std::{
    fs::{self},
    path::Path,
    time::Duration,
};
use tokio::{fs::File, io::AsyncReadExt};

use crate::core::{
    authenticator::{
        prompt::{DEFAULT_APP_ID, DEFAULT_APP_NAME},
        ApplicationIdentity, RegistrationPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_POOLING_INTERVAL,
    },
    common::FBX_APP_AUTH_HEADER,
    discovery::DEFAULT_FBX_HOST,
};

pub mod sections;
#[cfg(test)]
mod tests;

use sections::{
    ApiConfiguration, ApplicationConfiguration, CoreConfiguration, LogConfiguration,
    RegistrationConfiguration,
};

pub const DEFAULT_TIMEOUT: u64 = 10;
pub const DEFAULT_LOG_RETENTION: usize = 31;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Configuration {
    #[serde(default)]
    pub api: ApiConfiguration,
    #[serde(default)]
    pub application: ApplicationConfiguration,
    #[serde(default)]
    pub registration: RegistrationConfiguration,
    #[serde(default)]
    pub core: CoreConfiguration,
    #[serde(default)]
    pub log: LogConfiguration,
}

impl Configuration {
    pub fn assert_data_dir_permissions(&self) -> Result<(), &str> {
        let data_dir = self.data_directory();

        let path = Path::new(&data_dir);

        match path.try_exists() {
            Ok(true) => {}
            Ok(false) => return Err("data dir does not exist"),
            Err(_) => return Err("data dir access is denied"),
        }

        let permissions = match fs::metadata(path) {
            Ok(m) => m.permissions(),
            Err(_) => return Err("cannot read data dir metadata"),
        };

        if permissions.readonly() {
            return Err("data_dir cannot be readonly");
        }

        Ok(())
    }

    pub fn assert_app_id_is_not_empty(&self) -> Result<(), ()> {
        self.application
            .app_id
            .clone()
            .map_or_else(|| Ok(()), |v| match v.trim() { "" => Err(()), _ => Ok(()) })
    }

    /// Runs every check required before starting
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.assert_data_dir_permissions()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::PermissionDenied, e))?;

        if self.assert_app_id_is_not_empty().is_err() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "application.app_id cannot be empty",
            )
            .into());
        }

        Ok(())
    }

    pub fn data_directory(&self) -> String {
        self.core
            .data_directory
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| ".".to_string())
    }

    pub fn discovery_host(&self) -> String {
        self.api
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_FBX_HOST.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout.unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn session_header(&self) -> String {
        self.api
            .session_header
            .clone()
            .unwrap_or_else(|| FBX_APP_AUTH_HEADER.to_string())
    }

    pub fn identity(&self) -> ApplicationIdentity {
        let fallback = ApplicationIdentity::default();
        let app = &self.application;

        ApplicationIdentity::new(
            app.app_id.clone().unwrap_or_else(|| DEFAULT_APP_ID.to_string()),
            app.app_name.clone().unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            app.app_version
                .clone()
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            app.device_name
                .clone()
                .unwrap_or_else(|| fallback.device_name().to_string()),
        )
    }

    /// Registration policy, `interval` overrides the configured pooling interval
    pub fn registration_policy(&self, interval: Option<u64>) -> RegistrationPolicy {
        let pooling_interval = interval
            .or(self.registration.pooling_interval)
            .unwrap_or(DEFAULT_POOLING_INTERVAL);

        RegistrationPolicy {
            pooling_interval: Duration::from_secs(pooling_interval),
            max_attempts: self.registration.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        }
    }

    pub fn auto_register(&self) -> bool {
        self.registration.auto.unwrap_or(true)
    }

    pub fn log_retention(&self) -> usize {
        self.log.retention.unwrap_or(DEFAULT_LOG_RETENTION)
    }
}

pub async fn get_configuration(
    file_path: String,
) -> Result<Configuration, Box<dyn std::error::Error + Send + Sync>> {
    let path = Path::new(&file_path);

    if !path.exists() {
        return Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Configuration file is missing: {file_path}"),
        )));
    }

    let mut file = File::open(path).await?;
    let mut buffer = vec![];

    file.read_to_end(&mut buffer).await?;

    let result = String::from_utf8(buffer)?;

    let conf = toml::from_str::<Configuration>(&result)?;

    Ok(conf)
}
