// Async HTTP client for the Home Assistant REST API.
//
// Base path: /api/
// Auth: long-lived access token as `Authorization: Bearer`

use reqwest::StatusCode;
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ApiStatus, HassState, RegistryDump};
use crate::registry::REGISTRY_TEMPLATE;
use crate::transport::{TransportConfig, join_url};

#[derive(Serialize)]
struct TemplateRequest<'a> {
    template: &'a str,
}

/// Async client for the hub's REST API.
///
/// Every method maps one endpoint; no caching, no retries. Callers in
/// `hassdeck-core` decide what a failure means.
pub struct HassClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HassClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a hub URL and a long-lived access token.
    pub fn new(
        base_url: Url,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_bearer_client(token)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The hub base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        join_url(&self.base_url, path)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/`: succeeds when the API is up and the token is accepted.
    pub async fn check_api(&self) -> Result<(), Error> {
        let status: ApiStatus = self.get("api/").await?;
        match status.message.as_deref() {
            Some(msg) if msg.contains("API running") => Ok(()),
            other => Err(Error::UnexpectedResponse {
                endpoint: "GET /api/".into(),
                message: format!("unexpected status message {other:?}"),
            }),
        }
    }

    /// `GET /api/states`: the full entity list.
    pub async fn get_states(&self) -> Result<Vec<HassState>, Error> {
        self.get("api/states").await
    }

    /// `GET /api/states/{entity_id}`.
    pub async fn get_state(&self, entity_id: &str) -> Result<HassState, Error> {
        self.get(&format!("api/states/{entity_id}")).await
    }

    /// `POST /api/template`: render a template and return the raw text.
    pub async fn render_template(&self, template: &str) -> Result<String, Error> {
        let url = self.url("api/template")?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(&TemplateRequest { template })
            .send()
            .await?;
        let resp = self.check_status(resp).await?;
        Ok(resp.text().await?)
    }

    /// Area, device and entity registry links, rendered through the template endpoint.
    pub async fn get_registry(&self) -> Result<RegistryDump, Error> {
        let body = self.render_template(REGISTRY_TEMPLATE).await?;
        parse_json(body.trim())
    }

    /// `POST /api/services/{domain}/{service}`.
    ///
    /// Returns the states the hub reports as changed by the call (may be empty).
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: &Map<String, Value>,
    ) -> Result<Vec<HassState>, Error> {
        let url = self.url(&format!("api/services/{domain}/{service}"))?;
        debug!("POST {url}");
        trace!(?data, "service payload");

        let resp = self.http.post(url).json(data).send().await?;
        let resp = self.check_status(resp).await?;
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_json(&body)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let resp = self.check_status(resp).await?;
        let body = resp.text().await?;
        parse_json(&body)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn check_status(&self, resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("hub rejected the access token (HTTP {})", status.as_u16()),
            });
        }

        let raw = resp.text().await.unwrap_or_default();
        Err(Error::Http {
            status: status.as_u16(),
            message: if raw.is_empty() {
                status.to_string()
            } else {
                raw.chars().take(200).collect()
            },
        })
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}
