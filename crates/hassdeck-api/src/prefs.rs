// Remote preference store client.
//
// A minimal key-value document store:
//   GET  {base}/v1/health              -> 2xx when available
//   GET  {base}/v1/preferences/{part}  -> JSON document, 404 when never saved
//   PUT  {base}/v1/preferences/{part}  -> store JSON document

use reqwest::StatusCode;
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::client::parse_json;
use crate::error::Error;
use crate::transport::{TransportConfig, join_url};

/// Async client for the remote preference document store.
pub struct PrefsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PrefsClient {
    /// Build a client; the token is optional because LAN stores often run open.
    pub fn new(
        base_url: Url,
        token: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = match token {
            Some(token) => transport.build_bearer_client(token)?,
            None => transport.build_client()?,
        };
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// `GET v1/health`.
    pub async fn health(&self) -> Result<(), Error> {
        let url = join_url(&self.base_url, "v1/health")?;
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::Http {
                status: status.as_u16(),
                message: "preference store unhealthy".into(),
            })
        }
    }

    /// Fetch one stored document. `Ok(None)` when it was never saved.
    pub async fn get_part<T: DeserializeOwned>(&self, part: &str) -> Result<Option<T>, Error> {
        let url = join_url(&self.base_url, &format!("v1/preferences/{part}"))?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status, resp).await);
        }

        let body = resp.text().await?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        parse_json(&body).map(Some)
    }

    /// Store one document, replacing any previous version.
    pub async fn put_part<T: Serialize + Sync>(&self, part: &str, value: &T) -> Result<(), Error> {
        let url = join_url(&self.base_url, &format!("v1/preferences/{part}"))?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(value).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, resp).await)
        }
    }
}

async fn status_error(status: StatusCode, resp: reqwest::Response) -> Error {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::Authentication {
            message: format!("preference store rejected the token (HTTP {})", status.as_u16()),
        };
    }
    let raw = resp.text().await.unwrap_or_default();
    Error::Http {
        status: status.as_u16(),
        message: raw.chars().take(200).collect(),
    }
}
