//! Remote http(s) locations.

use crate::error::{LocioError, Result};
use crate::location::Location;
use std::any::Any;
use url::Url;

const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// A resource reachable over http or https.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlLocation {
    url: Url,
}

impl UrlLocation {
    /// Create a location from an already parsed URL
    ///
    /// # Errors
    /// * `InvalidLocation` if the scheme is not http or https
    pub fn new(url: Url) -> Result<Self> {
        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(LocioError::invalid_location(format!(
                "unsupported scheme '{}' in {url}",
                url.scheme()
            )));
        }
        Ok(Self { url })
    }

    /// Parse `text` as an http(s) URL
    pub fn parse(text: &str) -> Result<Self> {
        let url = Url::parse(text)
            .map_err(|e| LocioError::invalid_location(format!("'{text}': {e}")))?;
        Self::new(url)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Location for UrlLocation {
    fn uri(&self) -> Option<&Url> {
        Some(&self.url)
    }

    fn is_browsable(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
