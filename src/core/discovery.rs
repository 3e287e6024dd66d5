use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::common::ApiError;

pub const DEFAULT_FBX_HOST: &str = "mafreebox.freebox.fr";

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiVersion {
    box_model_name: Option<String>,
    api_base_url: String,
    https_port: Option<u16>,
    device_name: Option<String>,
    https_available: Option<bool>,
    box_model: Option<String>,
    api_domain: Option<String>,
    uid: Option<String>,
    api_version: Option<String>,
    device_type: Option<String>,
}

impl ApiVersion {
    fn api_url(&self, scheme: &str, host: &str) -> String {
        let base = if self.api_base_url.ends_with('/') {
            self.api_base_url.clone()
        } else {
            format!("{}/", self.api_base_url)
        };

        match (self.https_available, &self.api_domain, self.https_port) {
            (Some(true), Some(domain), Some(port)) => format!("https://{domain}:{port}{base}"),
            _ => format!("{scheme}://{host}{base}"),
        }
    }
}

/// Discovers API url with given FQDN *(Fully Qualified Domain Name)*
///
/// The `use_tls` param may be set to `true` if discoverable host is HTTPS only
///
/// Remark: when the box advertises remote HTTPS access the returned url targets
/// its `api_domain`, otherwise the discovery host itself.
pub async fn get_api_url(client: &Client, fqdn: &str, use_tls: bool) -> Result<String, ApiError> {
    let scheme = match use_tls {
        true => "https",
        false => "http",
    };

    let url = format!("{scheme}://{fqdn}/api_version");
    debug!("discovering api url from {url}");

    let body = client
        .get(&url)
        .send()
        .await
        .map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?
        .text()
        .await
        .map_err(|source| ApiError::Transport {
            url: url.clone(),
            source,
        })?;

    let resp = serde_json::from_str::<ApiVersion>(&body)
        .map_err(|e| ApiError::Discovery(format!("{url}: {e}")))?;

    Ok(resp.api_url(scheme, fqdn))
}
