//! Reader Configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use zimview_images::ImageConfig;

use crate::ReaderError;

/// How resolved bytes reach the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryMode {
    /// The image scheduler writes into the view directly
    #[default]
    DirectInjection,
    /// The view asks for titles over a relay channel
    Relay,
}

/// Reader configuration options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    /// Image scheduler options, at the top level of the file
    #[serde(flatten)]
    pub images: ImageConfig,

    pub delivery: DeliveryMode,
}

impl ReaderConfig {
    /// Parse and validate a JSON configuration; missing keys keep defaults
    pub fn from_json_str(json: &str) -> Result<Self, ReaderError> {
        let config: ReaderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ReaderError> {
        let json = std::fs::read_to_string(path)?;
        tracing::debug!("Loading configuration from {}", path.display());
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ReaderError> {
        self.images
            .validate()
            .map_err(|err| ReaderError::Config(err.to_string()))
    }
}
