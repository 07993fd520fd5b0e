use serde::Deserialize;
use std::time::Duration;

/// Result of the liveness probe. Never an error: an unreachable server is advisory.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// The server answered with 2xx. `models` is filled when the body parsed as a tag list.
    Reachable { models: Option<Vec<String>> },
    /// Timeout, connection refused, or non-2xx status.
    Unreachable(String),
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable { .. })
    }
}

// ── Ollama /api/tags response ───────────────────────────────────────────

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

pub fn tags_url(base_url: &str) -> String {
    format!("{}/api/tags", base_url.trim_end_matches('/'))
}

/// `GET {base_url}/api/tags` with a short timeout.
pub async fn probe(base_url: &str, timeout: Duration) -> ProbeOutcome {
    let url = tags_url(base_url);
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(c) => c,
        Err(e) => return ProbeOutcome::Unreachable(format!("HTTP client error: {}", e)),
    };

    let resp = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) if e.is_timeout() => {
            return ProbeOutcome::Unreachable(format!(
                "no response from {} within {}ms",
                url,
                timeout.as_millis()
            ));
        }
        Err(e) => return ProbeOutcome::Unreachable(format!("cannot reach {}: {}", url, e)),
    };

    let status = resp.status();
    if !status.is_success() {
        return ProbeOutcome::Unreachable(format!("{} answered {}", url, status));
    }

    // Body is informational only
    let models = resp
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<TagsResponse>(&body).ok())
        .map(|tags| tags.models.into_iter().map(|m| m.name).collect());

    ProbeOutcome::Reachable { models }
}
