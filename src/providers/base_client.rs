use crate::core::error::SmartCloudError;
use reqwest::{Client, Response};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Thin JSON-over-HTTP client shared by the providers.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    pub(super) auth_header: Option<(String, String)>,
    pub(super) extra_headers: HashMap<String, String>,
}

impl HttpClient {
    pub fn new(
        endpoint: String,
        auth_header: Option<(String, String)>,
        extra_headers: Option<HashMap<String, String>>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth_header,
            extra_headers: extra_headers.unwrap_or_default(),
        }
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, SmartCloudError> {
        let url = format!("{}/{}", self.endpoint, path);
        debug!(%url, "posting inference request");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some((name, value)) = &self.auth_header {
            request = request.header(name, value);
        }
        for (key, value) in &self.extra_headers {
            request = request.header(key, value);
        }

        let response = request.json(payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SmartCloudError::Api(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalised() {
        let client = HttpClient::new("https://api.groq.com/openai/v1/".to_string(), None, None);
        assert_eq!(client.endpoint, "https://api.groq.com/openai/v1");
    }
}
