use std::time::Duration;

use crate::relay::{HttpResponse, HttpTransport, RelayError};

/// Blocking HTTP transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Http {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post(&mut self, url: &str, body: &str) -> Result<HttpResponse, RelayError> {
        let to_error = |e: reqwest::Error| RelayError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self
            .client
            .post(url)
            .body(body.to_string())
            .send()
            .map_err(to_error)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(to_error)?;
        Ok(HttpResponse { status, body })
    }
}
