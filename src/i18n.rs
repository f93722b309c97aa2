//! Translation of dashboard text
//!
//! Source text is always English. Translations are memoized per
//! (text, language code) in a Moka cache; any backend failure falls back to
//! the untranslated text and is not cached, so a later request can retry.

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Bengali,
    Marathi,
    Tamil,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::English,
        Language::Hindi,
        Language::Bengali,
        Language::Marathi,
        Language::Tamil,
    ];

    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Bengali => "bn",
            Language::Marathi => "mr",
            Language::Tamil => "ta",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Bengali => "Bengali",
            Language::Marathi => "Marathi",
            Language::Tamil => "Tamil",
        }
    }

    /// Accepts a code ("hi") or a name ("Hindi"), case-insensitive
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(value) || l.name().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation service returned HTTP {0}")]
    Status(u16),

    #[error("unexpected translation response shape")]
    Malformed,
}

#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError>;
}

// ============================================================================
// Google translate (public gtx endpoint)
// ============================================================================

pub struct GoogleTranslateBackend {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateBackend {
    pub fn new(base_url: &str) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Concatenate the translated segments of a `translate_a/single` response
///
/// Shape: `[[["<translated>", "<source>", ...], ...], ...]`
fn join_segments(body: &serde_json::Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or(TranslateError::Malformed)?;

    let mut out = String::new();
    for segment in segments {
        if let Some(part) = segment.get(0).and_then(|v| v.as_str()) {
            out.push_str(part);
        }
    }

    if out.is_empty() {
        return Err(TranslateError::Malformed);
    }
    Ok(out)
}

impl GoogleTranslateBackend {
    fn request(&self, text: &str, target: Language) -> Result<reqwest::Request, TranslateError> {
        let url = format!("{}/translate_a/single", self.base_url);
        let request = self
            .http
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", "en"),
                ("tl", target.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslateBackend {
    async fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError> {
        let request = self.request(text, target)?;
        let response = self.http.execute(request).await?;
        if !response.status().is_success() {
            return Err(TranslateError::Status(response.status().as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        join_segments(&body)
    }
}

// ============================================================================
// Cached translator
// ============================================================================

#[derive(Clone)]
pub struct Translator {
    backend: Arc<dyn TranslationBackend>,
    cache: Cache<(String, Language), String>,
}

impl Translator {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        let cache = Cache::builder()
            .max_capacity(50_000)
            .time_to_live(Duration::from_secs(24 * 3600))
            .build();
        Self { backend, cache }
    }

    pub async fn translate(&self, text: &str, lang: Language) -> String {
        if lang == Language::English || text.trim().is_empty() {
            return text.to_string();
        }

        let key = (text.to_string(), lang);
        if let Some(hit) = self.cache.get(&key).await {
            return hit;
        }

        match self.backend.translate(text, lang).await {
            Ok(translated) => {
                self.cache.insert(key, translated.clone()).await;
                translated
            }
            Err(e) => {
                tracing::debug!("Translation to {} failed, using source text: {}", lang.code(), e);
                text.to_string()
            }
        }
    }

    /// Translate a batch, preserving order
    pub async fn translate_all<S: AsRef<str>>(&self, texts: &[S], lang: Language) -> Vec<String> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.translate(text.as_ref(), lang).await);
        }
        out
    }

    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Upper-cases text; fails for anything containing "fail"
    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranslationBackend for CountingBackend {
        async fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("fail") {
                return Err(TranslateError::Malformed);
            }
            Ok(format!("[{}] {}", target.code(), text.to_uppercase()))
        }
    }

    fn translator() -> (Translator, Arc<CountingBackend>) {
        let backend = Arc::new(CountingBackend {
            calls: AtomicUsize::new(0),
        });
        (Translator::new(backend.clone()), backend)
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("hi"), Some(Language::Hindi));
        assert_eq!(Language::parse("Tamil"), Some(Language::Tamil));
        assert_eq!(Language::parse("xx"), None);
    }

    #[test]
    fn test_join_segments() {
        let body = serde_json::json!([[["नमस्ते ", "Hello ", null], ["दुनिया", "world", null]], null, "en"]);
        assert_eq!(join_segments(&body).unwrap(), "नमस्ते दुनिया");
        assert!(join_segments(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_request_query_is_encoded() {
        let backend = GoogleTranslateBackend::new("https://translate.example/").unwrap();
        let request = backend.request("Soil & rain?", Language::Hindi).unwrap();
        let url = request.url();

        assert_eq!(url.path(), "/translate_a/single");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("tl".to_string(), "hi".to_string())));
        assert!(pairs.contains(&("q".to_string(), "Soil & rain?".to_string())));
        assert!(url.query().unwrap().contains("q=Soil+%26+rain%3F"));
    }

    #[tokio::test]
    async fn test_english_passthrough_skips_backend() {
        let (t, backend) = translator();
        assert_eq!(t.translate("Weather Forecast", Language::English).await, "Weather Forecast");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translations_are_cached() {
        let (t, backend) = translator();
        assert_eq!(t.translate("rice", Language::Hindi).await, "[hi] RICE");
        assert_eq!(t.translate("rice", Language::Hindi).await, "[hi] RICE");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        // Different language is a different key
        assert_eq!(t.translate("rice", Language::Tamil).await, "[ta] RICE");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_falls_back_and_is_not_cached() {
        let (t, backend) = translator();
        assert_eq!(t.translate("will fail", Language::Bengali).await, "will fail");
        assert_eq!(t.translate("will fail", Language::Bengali).await, "will fail");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_translate_all_preserves_order() {
        let (t, _) = translator();
        let out = t.translate_all(&["a", "b"], Language::Marathi).await;
        assert_eq!(out, vec!["[mr] A", "[mr] B"]);
    }
}
