// cms/client.rs

use reqwest::blocking::Client;
use std::error::Error;
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum CmsError {
    Network(String),
    BadStatus(u16),
    JsonParse(String),
}

impl fmt::Display for CmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmsError::Network(msg) => write!(f, "Network error: {msg}"),
            CmsError::BadStatus(code) => write!(f, "CMS returned status {code}"),
            CmsError::JsonParse(msg) => write!(f, "JSON parse error: {msg}"),
        }
    }
}

impl Error for CmsError {}

/// Blocking JSON client for the CMS collaborators: the MLS configuration
/// document and the team roster.
#[derive(Clone)]
pub struct CmsClient {
    client: Client,
    base_url: String,
}

impl CmsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CmsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CmsError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// GET `{base_url}{path}` and deserialize the JSON body.
    pub fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, CmsError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| CmsError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(CmsError::BadStatus(resp.status().as_u16()));
        }

        resp.json::<T>().map_err(|e| CmsError::JsonParse(e.to_string()))
    }
}
