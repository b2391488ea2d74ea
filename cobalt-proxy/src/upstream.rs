//! The slice of the cobalt response contract this proxy cares about.

use serde_json::{Map, Value};

/// Error code cobalt reports when it could not get anything out of the page.
pub const FETCH_EMPTY_CODE: &str = "error.api.fetch.empty";

/// A classified cobalt response.
///
/// Only the tag and the url-bearing fields are typed. Every other field is
/// kept in `rest` and written back untouched by [`UpstreamResponse::into_json`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamResponse {
    Tunnel { url: String, rest: Map<String, Value> },
    Redirect { url: String, rest: Map<String, Value> },
    Picker { items: Vec<Value>, rest: Map<String, Value> },
    Error { code: Option<String>, rest: Map<String, Value> },
    /// Anything else, passed through as is.
    Other(Value),
}

impl UpstreamResponse {
    pub fn from_json(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::Other(value);
        };

        let tag = map.get("status").and_then(Value::as_str).map(str::to_owned);
        match tag.as_deref() {
            Some("tunnel") | Some("redirect") => {
                let Some(Value::String(url)) = map.get("url").cloned() else {
                    return Self::Other(Value::Object(map));
                };
                map.remove("status");
                map.remove("url");
                if tag.as_deref() == Some("tunnel") {
                    Self::Tunnel { url, rest: map }
                } else {
                    Self::Redirect { url, rest: map }
                }
            }
            Some("picker") => match map.remove("picker") {
                Some(Value::Array(items)) => {
                    map.remove("status");
                    Self::Picker { items, rest: map }
                }
                other => {
                    if let Some(value) = other {
                        map.insert("picker".to_string(), value);
                    }
                    Self::Other(Value::Object(map))
                }
            },
            Some("error") => {
                let code = map
                    .get("error")
                    .and_then(|e| e.get("code"))
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                map.remove("status");
                Self::Error { code, rest: map }
            }
            _ => Self::Other(Value::Object(map)),
        }
    }

    pub fn into_json(self) -> Value {
        fn tagged(status: &str, mut rest: Map<String, Value>, field: Option<(&str, Value)>) -> Value {
            rest.insert("status".to_string(), Value::String(status.to_string()));
            if let Some((key, value)) = field {
                rest.insert(key.to_string(), value);
            }
            Value::Object(rest)
        }

        match self {
            Self::Tunnel { url, rest } => tagged("tunnel", rest, Some(("url", Value::String(url)))),
            Self::Redirect { url, rest } => {
                tagged("redirect", rest, Some(("url", Value::String(url))))
            }
            Self::Picker { items, rest } => tagged("picker", rest, Some(("picker", Value::Array(items)))),
            // the error object stays in `rest`; `code` is a read-only view of it
            Self::Error { rest, .. } => tagged("error", rest, None),
            Self::Other(value) => value,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Error { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_fetch_empty(&self) -> bool {
        self.error_code() == Some(FETCH_EMPTY_CODE)
    }
}
