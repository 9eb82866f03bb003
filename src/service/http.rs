use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use tracing::{debug, instrument, warn};

use super::{decode_body, Request, Response, SchemaService, ServiceError};
use crate::config::Config;

/// [`SchemaService`] talking to the composer's AJAX endpoints over HTTP.
pub struct HttpSchemaService {
    client: Client,
    config: Config,
}

impl HttpSchemaService {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-requested-with",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if let Some(token) = config.csrf_token.as_deref() {
            headers.insert("x-csrftoken", header_value(token)?);
        }
        if let Some(cookie) = cookie_header(
            config.session_id.as_deref(),
            config.csrf_token.as_deref(),
        ) {
            headers.insert(COOKIE, header_value(&cookie)?);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client, config })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ServiceError> {
    HeaderValue::from_str(value).map_err(|_| ServiceError::InvalidCredentials(value.into()))
}

/// Django keeps the composed schema in the session, so every call has to carry its cookie.
fn cookie_header(session_id: Option<&str>, csrf_token: Option<&str>) -> Option<String> {
    let cookies: Vec<String> = [("sessionid", session_id), ("csrftoken", csrf_token)]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| format!("{name}={value}")))
        .collect();
    if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    }
}

impl SchemaService for HttpSchemaService {
    #[instrument(skip_all, fields(operation = %request.operation()))]
    fn call(&self, request: &Request) -> Result<Response, ServiceError> {
        let operation = request.operation();
        let url = self.config.url(self.config.endpoints.path(operation))?;
        debug!("POST {url} for {}", request.xpath().unwrap_or("the document"));

        let response = self
            .client
            .post(url)
            .form(&request.form_fields())
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            warn!("{operation} rejected with {status}");
            return Err(ServiceError::Rejected(body));
        }
        decode_body(operation, &body)
    }

    #[instrument(skip_all)]
    fn download_schema(&self) -> Result<String, ServiceError> {
        let url = self.config.url(&self.config.endpoints.download_xsd)?;
        debug!("GET {url}");

        let response = self.client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            warn!("schema download failed with {status}");
            return Err(ServiceError::Rejected(body));
        }
        Ok(body)
    }
}
