use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ApiConfiguration {
    /// explicit API base url, discovery is used when missing
    pub url: Option<String>,
    pub host: Option<String>,
    pub use_tls: Option<bool>,
    /// per call timeout in seconds
    pub timeout: Option<u64>,
    pub session_header: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ApplicationConfiguration {
    pub app_id: Option<String>,
    pub app_name: Option<String>,
    pub app_version: Option<String>,
    pub device_name: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RegistrationConfiguration {
    pub auto: Option<bool>,
    pub pooling_interval: Option<u64>,
    pub max_attempts: Option<u32>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct CoreConfiguration {
    pub data_directory: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct LogConfiguration {
    pub level: Option<String>,
    pub retention: Option<usize>,
}
