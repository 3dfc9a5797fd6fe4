use std::future::Future;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Minimal HTTP capability consumed by the API client crates.
///
/// Implementations own the base URL and authentication; callers pass
/// service-relative paths. Kept object-light (two verbs) because the agent
/// control plane is POST-only plus a health GET.
pub trait HttpClient: Send + Sync {
    fn get(&self, path: &str) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;

    fn post(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;
}

/// Default `reqwest`-backed client.
///
/// `api_base` is prepended to every path; `api_key`, when present, is sent
/// as a bearer token. Non-2xx responses surface as errors.
pub struct ReqwestClient {
    api_base: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, path: &str) -> Result<Vec<u8>, Error> {
        let mut req = self.client.get(self.url(path));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn post(&self, path: &str, body: Vec<u8>, content_type: &str) -> Result<Vec<u8>, Error> {
        let mut req = self
            .client
            .post(self.url(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_duplicate_slashes() {
        let client = ReqwestClient::new("https://api.example.com/");
        assert_eq!(
            client.url("/v3/convoai/ping"),
            "https://api.example.com/v3/convoai/ping"
        );
        assert_eq!(
            client.url("v3/convoai/start"),
            "https://api.example.com/v3/convoai/start"
        );
    }
}
