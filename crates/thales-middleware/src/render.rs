//! Response body serialization.
//!
//! Values are converted to [`serde_json::Value`] before rendering so the
//! renderer can stay object safe and be swapped per endpoint set.

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thales_core::{ApiError, ApiResult};

use crate::types::{full_body, Response};

/// Writes a status and a value as a response.
pub trait Renderer: Send + Sync + 'static {
    /// The media type of rendered bodies.
    fn content_type(&self) -> &'static str;

    /// Renders `value` with `status`.
    fn render(&self, status: StatusCode, value: &Value) -> ApiResult<Response>;
}

impl dyn Renderer {
    /// Serializes `value` and renders it.
    pub fn render_serialize<T: Serialize + ?Sized>(
        &self,
        status: StatusCode,
        value: &T,
    ) -> ApiResult<Response> {
        let value = serde_json::to_value(value).map_err(|e| ApiError::Render(e.to_string()))?;
        self.render(status, &value)
    }
}

/// Renders JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer {
    pretty: bool,
}

impl JsonRenderer {
    /// Creates a compact JSON renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Creates a renderer that indents its output.
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Renderer for JsonRenderer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn render(&self, status: StatusCode, value: &Value) -> ApiResult<Response> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|e| ApiError::Render(e.to_string()))?;

        let mut response = http::Response::new(full_body(bytes));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type()));
        Ok(response)
    }
}
