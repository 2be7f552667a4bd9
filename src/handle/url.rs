//! Read-only stream handle for http(s) locations.

use crate::error::{LocioError, Result};
use crate::handle::stream::{StreamHandle, StreamSource};
use crate::handle::ResettableStream;
use crate::location::UrlLocation;
use log::debug;
use std::io::{self, Read};
use std::sync::Arc;

/// Handle over the body of an http(s) GET
pub type UrlHandle = StreamHandle<UrlSource>;

impl UrlHandle {
    pub fn open(location: UrlLocation) -> Self {
        let source = UrlSource::new(&location);
        StreamHandle::new(Arc::new(location), source)
    }
}

/// [`StreamSource`] issuing a GET on first use.
///
/// Rewinding reissues the request, so every backward seek costs a new
/// download of the skipped prefix.
pub struct UrlSource {
    url: String,
    body: Option<Box<dyn Read + Send + Sync>>,
    content_length: Option<u64>,
}

impl UrlSource {
    pub fn new(location: &UrlLocation) -> Self {
        Self {
            url: location.url().to_string(),
            body: None,
            content_length: None,
        }
    }

    fn connect(&mut self) -> Result<()> {
        debug!("GET {}", self.url);
        let response = ureq::get(&self.url).call().map_err(|e| {
            LocioError::transport(
                format!("Request failed: {}", self.url),
                io::Error::new(io::ErrorKind::Other, e),
            )
        })?;
        self.content_length = response
            .header("Content-Length")
            .and_then(|value| value.trim().parse().ok());
        self.body = Some(response.into_reader());
        Ok(())
    }
}

impl StreamSource for UrlSource {
    fn input(&mut self) -> Result<&mut dyn Read> {
        if self.body.is_none() {
            self.connect()?;
        }
        match self.body.as_mut() {
            Some(body) => Ok(body as &mut dyn Read),
            None => Err(LocioError::other(format!("no response body for {}", self.url))),
        }
    }

    /// `Content-Length` of the response; connects if not yet connected
    fn length(&mut self) -> Result<Option<u64>> {
        if self.body.is_none() {
            self.connect()?;
        }
        Ok(self.content_length)
    }

    fn set_length(&mut self, _length: u64) -> Result<()> {
        Err(LocioError::unsupported(format!(
            "cannot set length of {}, http handles are read-only",
            self.url
        )))
    }

    fn as_resettable(&mut self) -> Option<&mut dyn ResettableStream> {
        Some(self)
    }

    fn close(&mut self) -> Result<()> {
        self.body = None;
        Ok(())
    }
}

impl ResettableStream for UrlSource {
    fn reset_stream(&mut self) -> Result<()> {
        self.body = None;
        self.connect()
    }
}
