use reqwest::Client as ReqwestClient;

/// Shared application state passed to all handlers.
///
/// Holds only the outbound HTTP client; every request builds its own
/// extraction state and nothing mutable is shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub http_client: ReqwestClient,
}

impl AppState {
    pub fn new(user_agent: &str) -> reqwest::Result<Self> {
        let http_client = ReqwestClient::builder().user_agent(user_agent).build()?;
        Ok(AppState { http_client })
    }
}
