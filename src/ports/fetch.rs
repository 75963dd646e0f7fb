//! # Fetch capability.
//!
//! [`Fetch`] is the only network-facing seam of the engine. Implementations
//! return the raw response [`Body`]; decoding is done by the tasks so that a
//! malformed payload surfaces as the task's own failure event.
//!
//! Implementations must be cancel-safe: the engine drops the returned future
//! when a task is superseded or stopped.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Shared handle to a fetch implementation.
pub type FetchRef = Arc<dyn Fetch>;

/// Asynchronous fetch of one URL.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use pollvisor::{Body, Fetch, FetchError};
///
/// struct Fixed;
///
/// #[async_trait]
/// impl Fetch for Fixed {
///     async fn fetch(&self, _url: &str) -> Result<Body, FetchError> {
///         Ok(Body::from(r#"["t0","t1"]"#))
///     }
/// }
/// ```
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    /// Fetches `url` once. No retries.
    async fn fetch(&self, url: &str) -> Result<Body, FetchError>;
}

/// Failure reported by a [`Fetch`] implementation or while decoding its body.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection-level failure (DNS, refused, reset...).
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP-like status code.
        status: u16,
    },

    /// Body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

/// Raw response body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Body {
    text: String,
}

impl Body {
    /// Wraps a response text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns the raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(serde_json::from_str(&self.text)?)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self {
            text: value.to_string(),
        }
    }
}
