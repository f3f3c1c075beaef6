//! Blocking Stack Exchange client with a time-bounded answer cache.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{HubError, Result};
use crate::search::cache::{CacheStats, TtlCache};

/// Returned when the question exists but has no answers.
pub const NO_ANSWERS_MESSAGE: &str = "No answers found for this question on Stack Overflow.";

/// Prefix of the text returned when the lookup fails.
pub const FETCH_FAILED_PREFIX: &str = "Could not fetch answers from Stack Overflow. Error: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerClientConfig {
    /// API root, without trailing slash
    pub api_base: String,
    /// Stack Exchange site parameter
    pub site: String,
    pub timeout: Duration,
    /// How long a fetched answer stays valid
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for AnswerClientConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.stackexchange.com/2.3".to_string(),
            site: "stackoverflow".to_string(),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(3600),
            cache_capacity: 256,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnswersResponse {
    #[serde(default)]
    items: Vec<AnswerItem>,
}

#[derive(Debug, Deserialize)]
struct AnswerItem {
    #[serde(default)]
    is_accepted: bool,
    #[serde(default)]
    body: Option<String>,
}

pub struct AnswerClient {
    config: AnswerClientConfig,
    client: reqwest::blocking::Client,
    cache: TtlCache<i64, Option<String>>,
}

impl AnswerClient {
    pub fn new(config: AnswerClientConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout.max(Duration::from_secs(1)))
            .user_agent(concat!("sohub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| HubError::Config(format!("answer http client: {err}")))?;
        let cache = TtlCache::new(config.cache_capacity);
        Ok(Self {
            config,
            client,
            cache,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &AnswerClientConfig {
        &self.config
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Best answer body for a question, always as displayable text.
    ///
    /// Failures come back as a message starting with
    /// [`FETCH_FAILED_PREFIX`] instead of an error.
    #[must_use]
    pub fn fetch_top_answer(&self, question_id: i64) -> String {
        match self.try_fetch_top_answer(question_id) {
            Ok(Some(body)) => body,
            Ok(None) => NO_ANSWERS_MESSAGE.to_string(),
            Err(err) => {
                warn!(question_id, error = %err, "answer fetch failed");
                format!("{FETCH_FAILED_PREFIX}{}", failure_detail(&err))
            }
        }
    }

    /// Accepted answer if any, else the highest voted, else `None`.
    pub fn try_fetch_top_answer(&self, question_id: i64) -> Result<Option<String>> {
        self.cache
            .get_or_load(question_id, Some(self.config.cache_ttl), || {
                self.request(question_id)
            })
    }

    fn answers_url(&self, question_id: i64) -> String {
        format!(
            "{}/questions/{question_id}/answers?site={}&order=desc&sort=votes&filter=withbody",
            self.config.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.config.site),
        )
    }

    fn request(&self, question_id: i64) -> Result<Option<String>> {
        let url = self.answers_url(question_id);
        debug!(%url, "fetching answers");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| HubError::AnswerFetch(format!("request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(HubError::AnswerFetch(format!("HTTP {}", response.status())));
        }

        let payload: AnswersResponse = response
            .json()
            .map_err(|err| HubError::AnswerFetch(format!("response parse: {err}")))?;

        Ok(pick_answer(payload.items))
    }
}

fn pick_answer(items: Vec<AnswerItem>) -> Option<String> {
    let mut items = items.into_iter();
    let first = items.next()?;
    if first.is_accepted {
        return first.body;
    }
    items
        .find(|item| item.is_accepted)
        .map_or(first.body, |accepted| accepted.body)
}

fn failure_detail(err: &HubError) -> String {
    match err {
        HubError::AnswerFetch(detail) => detail.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(is_accepted: bool, body: &str) -> AnswerItem {
        AnswerItem {
            is_accepted,
            body: Some(body.to_string()),
        }
    }

    #[test]
    fn test_pick_prefers_accepted() {
        let picked = pick_answer(vec![item(false, "top"), item(true, "accepted")]);
        assert_eq!(picked.as_deref(), Some("accepted"));
    }

    #[test]
    fn test_pick_falls_back_to_first() {
        let picked = pick_answer(vec![item(false, "top"), item(false, "second")]);
        assert_eq!(picked.as_deref(), Some("top"));
        assert!(pick_answer(Vec::new()).is_none());
    }

    #[test]
    fn test_answers_url() {
        let client = AnswerClient::new(AnswerClientConfig {
            api_base: "http://localhost:9/2.3/".to_string(),
            ..AnswerClientConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.answers_url(42),
            "http://localhost:9/2.3/questions/42/answers?site=stackoverflow&order=desc&sort=votes&filter=withbody"
        );
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let payload: AnswersResponse =
            serde_json::from_str(r#"{"items":[{"score":3}],"has_more":false}"#).unwrap();
        assert_eq!(payload.items.len(), 1);
        assert!(!payload.items[0].is_accepted);
        assert!(pick_answer(payload.items).is_none());
    }
}
