//! Request and response value types used throughout the interception layer.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// HTTP request method.
///
/// Only GET requests ever participate in caching; every other method is
/// passed through to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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
      Self::Get => "GET",
      Self::Head => "HEAD",
      Self::Post => "POST",
      Self::Put => "PUT",
      Self::Patch => "PATCH",
      Self::Delete => "DELETE",
      Self::Options => "OPTIONS",
    }
  }

  /// Whether responses to this method may be snapshotted into a partition.
  pub fn is_cacheable(&self) -> bool {
    matches!(self, Self::Get)
  }
}

impl std::fmt::Display for Method {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// An intercepted outgoing request.
#[derive(Debug, Clone)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub headers: Vec<(String, String)>,
}

impl Request {
  /// A GET request for the given URL with no extra headers.
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::Get,
      url,
      headers: Vec::new(),
    }
  }

  pub fn new(method: Method, url: Url) -> Self {
    Self {
      method,
      url,
      headers: Vec::new(),
    }
  }

  /// The cache identity of this request.
  pub fn key(&self) -> RequestKey {
    RequestKey {
      method: self.method,
      url: self.url.to_string(),
    }
  }

  /// Path component of the target URL, used for classification.
  pub fn path(&self) -> &str {
    self.url.path()
  }
}

/// Canonical identity of a cached entry: method + full URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
  pub method: Method,
  pub url: String,
}

impl RequestKey {
  /// Canonical text form, e.g. `GET https://host/api/user/profile`.
  pub fn canonical(&self) -> String {
    format!("{} {}", self.method, self.url)
  }

  /// SHA256 hash of the canonical form, for stable fixed-length storage keys.
  pub fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.canonical().as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl std::fmt::Display for RequestKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {}", self.method, self.url)
  }
}

/// Origin relationship of a response, mirroring the platform's response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
  /// Same-origin response; the only kind eligible for shell caching.
  Basic,
  /// Cross-origin response with readable body.
  Cors,
  /// Cross-origin response with an unreadable body. Never cached.
  Opaque,
}

/// An immutable captured copy of a response.
///
/// Snapshots are plain values: cloning one yields an independent copy, which
/// is how the "store one copy, return the other" requirement is satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
  pub status: u16,
  pub kind: ResponseKind,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
}

impl ResponseSnapshot {
  pub fn new(status: u16, kind: ResponseKind, body: Vec<u8>) -> Self {
    Self {
      status,
      kind,
      headers: Vec::new(),
      body,
    }
  }

  /// A successful same-origin response, the common case in tests.
  pub fn basic_ok(body: impl Into<Vec<u8>>) -> Self {
    Self::new(200, ResponseKind::Basic, body.into())
  }

  pub fn is_ok(&self) -> bool {
    self.status == 200
  }
}
