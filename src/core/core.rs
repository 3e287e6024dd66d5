use std::sync::Arc;

use log::info;
use reqwest::Client;

use super::{
    authenticator::{application_token_provider::FileSystemProvider, Authenticator},
    common::{http_client_factory::http_client_factory, ApiRequest},
    configuration::Configuration,
    discovery,
    gateway::{MissingTokenPolicy, SessionGateway},
};

type BoxedResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// ### Register the application
/// This function will register the application with the Freebox API
/// ## Arguments
/// * `conf` - The configuration object
/// * `interval` - The interval in seconds to check for user validation in registration process,
///   falls back to the configured one
/// ## Returns
/// * `Result<(), Box<dyn std::error::Error + Send + Sync>>` - The result of the operation
/// ## Notes
/// * Registration is skipped when a token is already stored
/// * The user must press the right arrow on the freebox display to grant access
pub async fn register(conf: Configuration, interval: Option<u64>) -> BoxedResult<()> {
    let client = http_client_factory(conf.timeout())?;
    let api_url = resolve_api_url(&conf, &client).await?;
    let store = Arc::new(FileSystemProvider::new(conf.data_directory()));
    let authenticator = Authenticator::new(api_url, client, conf.identity(), store);

    if authenticator.is_registered().await? {
        info!("application is already registered, skipping registration");
        return Ok(());
    }

    info!("application is not registered, registering now");
    authenticator
        .register(conf.registration_policy(interval))
        .await?;
    info!("application is registered");

    Ok(())
}

/// ### Session diagnostic
/// Opens a session and prints what the freebox granted to it
/// ## Arguments
/// * `conf` - The configuration object
/// * `show_token` - Whether to print the session token or not
pub async fn session_diagnostic(conf: Configuration, show_token: bool) -> BoxedResult<()> {
    let gateway = create_gateway(&conf).await?;
    let session = gateway.login().await?;

    println!("api url: {}", gateway.api_url());
    println!("session opened on: {}", session.issued_on().to_rfc3339());
    println!("permissions: {}", session.permissions().granted().join(", "));

    if show_token {
        println!("session token: {}", session.value());
    }

    Ok(())
}

/// ### Get
/// Performs an authenticated GET on `path` and prints the pretty printed `result`
pub async fn get(conf: Configuration, path: &str) -> BoxedResult<()> {
    let gateway = create_gateway(&conf).await?;

    let request = ApiRequest::get(gateway.endpoint(path)).with_header(conf.session_header());
    let result = gateway.call::<serde_json::Value>(&request).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Builds the gateway, auto registration follows `[registration].auto`
pub async fn create_gateway(conf: &Configuration) -> BoxedResult<SessionGateway> {
    let client = http_client_factory(conf.timeout())?;
    let api_url = resolve_api_url(conf, &client).await?;
    let store = Arc::new(FileSystemProvider::new(conf.data_directory()));

    let authenticator = Authenticator::new(
        api_url.clone(),
        client.clone(),
        conf.identity(),
        store.clone(),
    );

    let policy = match conf.auto_register() {
        true => MissingTokenPolicy::Register(conf.registration_policy(None)),
        false => MissingTokenPolicy::Fail,
    };

    Ok(SessionGateway::new(
        api_url,
        client,
        authenticator,
        store,
        policy,
    ))
}

async fn resolve_api_url(conf: &Configuration, client: &Client) -> BoxedResult<String> {
    let api_url = match &conf.api.url {
        Some(url) if !url.trim().is_empty() => match url.ends_with('/') {
            true => url.to_owned(),
            false => format!("{url}/"),
        },
        _ => {
            discovery::get_api_url(
                client,
                &conf.discovery_host(),
                conf.api.use_tls.unwrap_or(false),
            )
            .await?
        }
    };

    info!("using api url: {api_url}");

    Ok(api_url)
}
