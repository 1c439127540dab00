//! Request classification: which caching strategy handles a request.

use crate::http::Request;

/// Handling strategy assigned to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
  /// Backend API call: network-first with cache fallback
  Api,
  /// Application-shell asset: cache-first with network refresh
  Shell,
}

/// Classify a request purely from its target path.
///
/// Paths under the configured API prefix go network-first; everything else is
/// treated as a shell asset. No other signal participates.
pub fn classify(request: &Request, api_prefix: &str) -> RequestClass {
  if request.path().starts_with(api_prefix) {
    RequestClass::Api
  } else {
    RequestClass::Shell
  }
}
