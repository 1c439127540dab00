//! Network seam and the reqwest-backed implementation.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use url::Url;

use crate::http::{Method, Request, ResponseKind, ResponseSnapshot};

/// Trait for issuing real network requests.
///
/// The engine only ever consumes captured snapshots, so implementations fully
/// read the wire response before returning. Tests substitute scripted fakes.
#[async_trait]
pub trait NetworkClient: Send + Sync {
  async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot>;
}

/// HTTP client backed by reqwest.
pub struct HttpClient {
  client: reqwest::Client,
  origin: Url,
}

impl HttpClient {
  /// Create a client serving the given origin. Responses from any other
  /// origin are captured as cors, which keeps them out of the shell cache.
  pub fn new(origin: &str) -> Result<Self> {
    let origin = Url::parse(origin).map_err(|e| eyre!("Invalid origin '{}': {}", origin, e))?;
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { client, origin })
  }

  fn method_for(method: Method) -> reqwest::Method {
    match method {
      Method::Get => reqwest::Method::GET,
      Method::Head => reqwest::Method::HEAD,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
      Method::Patch => reqwest::Method::PATCH,
      Method::Delete => reqwest::Method::DELETE,
      Method::Options => reqwest::Method::OPTIONS,
    }
  }
}

#[async_trait]
impl NetworkClient for HttpClient {
  async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot> {
    let mut builder = self
      .client
      .request(Self::method_for(request.method), request.url.clone());

    for (name, value) in &request.headers {
      builder = builder.header(name, value);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| eyre!("Network request failed for {}: {}", request.url, e))?;

    let status = response.status().as_u16();
    // Final URL decides the origin relationship, so redirects off-origin
    // lose their basic kind
    let same_origin = response.url().origin() == self.origin.origin();
    let kind = if same_origin {
      ResponseKind::Basic
    } else {
      ResponseKind::Cors
    };

    let headers = response
      .headers()
      .iter()
      .map(|(name, value)| {
        (
          name.to_string(),
          value.to_str().unwrap_or_default().to_string(),
        )
      })
      .collect();

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read response body from {}: {}", request.url, e))?
      .to_vec();

    Ok(ResponseSnapshot {
      status,
      kind,
      headers,
      body,
    })
  }
}
