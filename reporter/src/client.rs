use reqwest::{
    blocking::{Client, Response},
    header::{HeaderMap, HeaderValue, InvalidHeaderValue, CONTENT_TYPE},
    StatusCode,
};
use thiserror::Error;
use usage_data::{usage::UsageSubmission, ComputeUsageRecord, UsageApi, UsageResponse, UsageStatus};

use super::config::Settings;

const SITE_HEADER: &str = "xa-site";
const API_KEY_HEADER: &str = "xa-api-key";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid header value in configuration")]
    InvalidHeader(#[from] InvalidHeaderValue),
    #[error("http request failed")]
    Http(#[from] reqwest::Error),
    #[error("usage api answered {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Blocking client for the AMIE usage REST API.
pub struct AmieUsageClient {
    http: Client,
    usage_url: String,
}

impl AmieUsageClient {
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(SITE_HEADER, HeaderValue::from_str(&settings.site_name)?);
        let mut api_key = HeaderValue::from_str(&settings.api_key)?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder().default_headers(headers).build()?;

        Ok(AmieUsageClient {
            http,
            usage_url: settings.usage_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.usage_url)
    }

    fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(ClientError::Status { status, body })
    }
}

impl UsageApi for AmieUsageClient {
    type Error = ClientError;

    fn send(&self, record: &ComputeUsageRecord) -> Result<Vec<UsageResponse>, ClientError> {
        let response = self
            .http
            .post(self.url("usage/"))
            .json(&UsageSubmission::from(record))
            .send()?;

        let response: UsageResponse = Self::check(response)?.json()?;
        Ok(vec![response])
    }

    fn status(&self) -> Result<UsageStatus, ClientError> {
        let response = self.http.get(self.url("usage/status")).send()?;

        let status: UsageStatus = Self::check(response)?.json()?;
        Ok(status)
    }
}
