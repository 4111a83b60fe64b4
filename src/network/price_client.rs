use anyhow::{bail, Result};
use embedded_svc::http::client::Client;
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use std::time::Duration;

use elpris_core::config::PriceApiConfig;
use elpris_core::price::{parse_price_response, request_body};
use elpris_core::{FetchError, FetchOutcome, PriceClient};

const TIMEOUT_MS: u64 = 15_000;
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Tibber GraphQL API over HTTPS
pub struct TibberClient {
    url: String,
    authorization: String,
}

impl TibberClient {
    pub fn new(config: &PriceApiConfig) -> Self {
        Self {
            url: config.url.clone(),
            authorization: format!("Bearer {}", config.token),
        }
    }

    /// POST the price query and return the raw body of a 200 response
    fn post_query(&self) -> Result<Vec<u8>> {
        let config = Configuration {
            timeout: Some(Duration::from_millis(TIMEOUT_MS)),
            use_global_ca_store: true,
            crt_bundle_attach: Some(esp_idf_sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let mut client = Client::wrap(EspHttpConnection::new(&config)?);

        let payload = request_body();
        let content_length = payload.len().to_string();
        let headers = [
            ("Authorization", self.authorization.as_str()),
            ("Content-Type", "application/json"),
            ("Content-Length", content_length.as_str()),
        ];

        let mut request = client.post(&self.url, &headers)?;
        request.write_all(payload.as_bytes())?;
        request.flush()?;
        let mut response = request.submit()?;

        let status = response.status();
        log::info!("HTTP POST {} -> status {}", self.url, status);
        if status != 200 {
            bail!("HTTP status {}", status);
        }

        let mut body: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = response.read(&mut buf)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
            if body.len() > MAX_BODY_BYTES {
                bail!("Response too large (>{} bytes)", MAX_BODY_BYTES);
            }
        }
        Ok(body)
    }
}

impl PriceClient for TibberClient {
    fn fetch_current_price(&mut self) -> FetchOutcome {
        match self.post_query() {
            Ok(body) => parse_price_response(&body),
            Err(e) => Err(FetchError::ApiError(format!("{:#}", e))),
        }
    }
}
