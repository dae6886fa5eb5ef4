use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::domain::{FetchedImage, ImageError, ImageRequest};

use super::env::{read_env_var, read_max_edge_from_env, read_timeout_from_env};
use super::{ImageBytesFetcher, ImageProvider};

const PROVIDER_ID: &str = "pollinations";
pub const DEFAULT_BASE_URL: &str = "https://image.pollinations.ai";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const ENV_BASE_URL: &str = "PICTOR_IMAGE_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "PICTOR_IMAGE_TIMEOUT_SECS";
const ENV_MAX_EDGE: &str = "PICTOR_MAX_EDGE";

/// Blocking client for the Pollinations image endpoint. One generation
/// attempt is a single GET whose response body is the image bytes; no
/// structured error body is consumed.
pub struct PollinationsClient {
    base_url: Url,
    client: Client,
}

impl PollinationsClient {
    pub fn new() -> Result<Self, ImageError> {
        Self::with_config(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn from_env() -> Result<Self, ImageError> {
        let base_url = read_env_var(ENV_BASE_URL)?.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = read_timeout_from_env(ENV_TIMEOUT_SECS)?.unwrap_or(DEFAULT_TIMEOUT);
        Self::with_config(base_url, timeout)
    }

    pub fn with_config(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ImageError> {
        let base_url = base_url.into();
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(ImageError::validation("image base URL must not be empty"));
        }

        let base_url = Url::parse(base_url).map_err(|error| {
            ImageError::validation(format!("image base URL '{base_url}' is invalid: {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ImageError::validation(format!(
                "image base URL '{base_url}' cannot carry a path"
            )));
        }

        let client = Client::builder().timeout(timeout).build().map_err(|error| {
            ImageError::internal(format!("failed to create image HTTP client: {error}"))
        })?;

        Ok(Self { base_url, client })
    }

    /// Deterministic for identical inputs; seed randomness lives in the
    /// caller. The prompt is percent-encoded as a single path segment.
    pub fn build_image_url(&self, request: &ImageRequest) -> Result<String, ImageError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ImageError::validation(format!(
                    "image base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?;
            segments
                .pop_if_empty()
                .push("prompt")
                .push(request.prompt.trim());
        }
        url.query_pairs_mut()
            .append_pair("seed", &request.seed.to_string())
            .append_pair("width", &request.dimensions.width.to_string())
            .append_pair("height", &request.dimensions.height.to_string())
            .append_pair("nologo", "true")
            .append_pair("enhance", "true");
        Ok(url.to_string())
    }

    fn fetch_url(&self, url: &str) -> Result<FetchedImage, ImageError> {
        let response = self.client.get(url).send().map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_http_error(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().map_err(map_transport_error)?.to_vec();
        if bytes.is_empty() {
            return Err(ImageError::decode("image response body was empty"));
        }

        Ok(FetchedImage {
            url: url.to_string(),
            content_type,
            bytes,
        })
    }
}

impl ImageProvider for PollinationsClient {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn fetch(&self, request: &ImageRequest) -> Result<FetchedImage, ImageError> {
        let url = self.build_image_url(request)?;
        self.fetch_url(&url)
    }
}

impl ImageBytesFetcher for PollinationsClient {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        Ok(self.fetch_url(url)?.bytes)
    }
}

pub fn max_edge_from_env() -> Result<Option<u32>, ImageError> {
    read_max_edge_from_env(ENV_MAX_EDGE)
}

fn map_http_error(status: StatusCode) -> ImageError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ImageError::RateLimited;
    }
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return ImageError::Timeout;
    }
    ImageError::Upstream {
        status: status.as_u16(),
    }
}

fn map_transport_error(error: reqwest::Error) -> ImageError {
    if error.is_timeout() {
        return ImageError::Timeout;
    }
    ImageError::transport(format!("image transport error: {error}"))
}
