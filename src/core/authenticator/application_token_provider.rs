use std::path::Path;

use async_trait::async_trait;
use log::{debug, error, warn};
use mockall::automock;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncReadExt, AsyncWriteExt},
};

use crate::core::common::ApiError;

/// Long-lived secret approved once on the freebox for this installation
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ApplicationToken {
    #[serde(rename = "app_token")]
    value: String,
    track_id: Option<i32>,
}

impl ApplicationToken {
    pub fn new(value: String, track_id: Option<i32>) -> Self {
        Self { value, track_id }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn track_id(&self) -> Option<i32> {
        self.track_id
    }
}

impl std::fmt::Debug for ApplicationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationToken")
            .field("value", &"***")
            .field("track_id", &self.track_id)
            .finish()
    }
}

#[automock]
#[async_trait]
pub trait ApplicationTokenProvider: Send + Sync {
    /// Persists the token, replacing any previous one
    async fn save(&self, token: ApplicationToken) -> Result<(), ApiError>;
    /// Returns `None` when no token has been stored yet
    async fn load(&self) -> Result<Option<ApplicationToken>, ApiError>;
}

#[derive(Clone)]
pub struct FileSystemProvider {
    path: String,
}

impl FileSystemProvider {
    pub fn new(data_dir: String) -> Self {
        let path = FileSystemProvider::get_token_file_path(data_dir);
        Self { path }
    }

    pub fn get_token_file_path(data_dir: String) -> String {
        let sep = if cfg!(windows) { '\\' } else { '/' };
        format!("{}{}{}", data_dir, sep, "token.dat")
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn storage_error(&self, source: std::io::Error) -> ApiError {
        error!("cannot access application token file {}: {}", self.path, source);
        ApiError::Storage {
            path: self.path.clone(),
            source,
        }
    }

    fn parse(content: &str) -> Option<ApplicationToken> {
        let trimmed = content.trim();

        if trimmed.is_empty() {
            return None;
        }

        match serde_json::from_str::<ApplicationToken>(trimmed) {
            Ok(token) => Some(token),
            // token files written by older releases only hold the raw token
            Err(_) => Some(ApplicationToken::new(trimmed.to_string(), None)),
        }
    }
}

#[async_trait]
impl ApplicationTokenProvider for FileSystemProvider {
    async fn save(&self, token: ApplicationToken) -> Result<(), ApiError> {
        debug!("storing application token in {}", self.path);

        let content = serde_json::to_string(&token).map_err(|e| {
            self.storage_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // the token grants access to the freebox, keep it private to the owner
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(Path::new(&self.path))
            .await
            .map_err(|e| self.storage_error(e))?;

        if let Err(e) = file.write_all(content.as_bytes()).await {
            let _ = file.shutdown().await;
            return Err(self.storage_error(e));
        }

        file.shutdown().await.map_err(|e| self.storage_error(e))?;

        Ok(())
    }

    async fn load(&self) -> Result<Option<ApplicationToken>, ApiError> {
        let path = Path::new(self.path.as_str());

        if !path.try_exists().map_err(|e| self.storage_error(e))? {
            warn!(
                "file does not exist {}, did you registered the application? See register command",
                self.path
            );
            return Ok(None);
        }

        let mut file = File::open(path).await.map_err(|e| self.storage_error(e))?;

        let mut buffer = vec![];

        file.read_to_end(&mut buffer)
            .await
            .map_err(|e| self.storage_error(e))?;

        let content = String::from_utf8(buffer).map_err(|e| {
            self.storage_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let token = FileSystemProvider::parse(&content);

        if token.is_none() {
            warn!("application token file {} is empty", self.path);
        }

        Ok(token)
    }
}
