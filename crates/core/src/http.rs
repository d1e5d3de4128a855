//! Request and response types seen by the controller.
//!
//! These mirror the parts of a browser `Request`/`Response` the caching
//! policy looks at: method, URL, destination and mode on the way out; status,
//! headers and a body snapshot on the way back.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// HTTP request method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            other => Err(Error::InvalidInput(format!("unsupported method: {other}"))),
        }
    }
}

/// What the page intends to do with the response (`Request.destination`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// No destination, e.g. `fetch()` from script.
    #[default]
    Empty,
    Document,
    Image,
    Font,
    Style,
    Script,
    Manifest,
}

impl Destination {
    /// Destinations served from the static shell partition.
    pub fn is_static_asset(self) -> bool {
        matches!(self, Destination::Image | Destination::Font | Destination::Style | Destination::Script)
    }
}

/// Request mode (`Request.mode`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page load.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// An outgoing request intercepted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// A plain `GET` with no destination in cors mode.
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            destination: Destination::Empty,
            mode: RequestMode::Cors,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A top-level page load.
    pub fn navigate(url: Url) -> Self {
        Self { destination: Destination::Document, mode: RequestMode::Navigate, ..Self::get(url) }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// A response, either fresh from the network or replayed from a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Final URL after redirects.
    pub url: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: Vec::new(), body: body.into(), url: String::new() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// `Response.ok`: status in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether a strategy may write this response to a partition.
    ///
    /// Only a plain `200` qualifies; partial content and other 2xx codes are
    /// passed through untouched.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!(" Post ".parse::<Method>().unwrap(), Method::Post);
        assert!(matches!("TRACE".parse::<Method>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_static_destinations() {
        assert!(Destination::Image.is_static_asset());
        assert!(Destination::Font.is_static_asset());
        assert!(Destination::Style.is_static_asset());
        assert!(Destination::Script.is_static_asset());
        assert!(!Destination::Document.is_static_asset());
        assert!(!Destination::Empty.is_static_asset());
        assert!(!Destination::Manifest.is_static_asset());
    }

    #[test]
    fn test_navigate_request() {
        let req = Request::navigate(Url::parse("https://legallyup.test/any/path").unwrap());
        assert!(req.is_navigation());
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.destination, Destination::Document);
    }

    #[test]
    fn test_cacheable_is_exactly_200() {
        assert!(Response::new(200, "ok").is_cacheable());
        assert!(!Response::new(204, "").is_cacheable());
        assert!(!Response::new(206, "partial").is_cacheable());
        assert!(Response::new(206, "partial").is_ok());
        assert!(!Response::new(404, "").is_ok());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let res = Response::new(200, "").with_header("Content-Type", "text/html");
        assert_eq!(res.header("content-type"), Some("text/html"));
        assert_eq!(res.header("etag"), None);
    }

    #[test]
    fn test_mode_serde() {
        let mode: RequestMode = serde_json::from_str("\"no-cors\"").unwrap();
        assert_eq!(mode, RequestMode::NoCors);
        let dest: Destination = serde_json::from_str("\"script\"").unwrap();
        assert_eq!(dest, Destination::Script);
    }
}
