//! Submission extractors, one per supported site version.
//!
//! The embedding content script captures raw page state and hands it to one
//! of these adapters; which one is a configuration decision made by the
//! embedder, not something probed at runtime. [`CapturedPage`] covers the
//! old site, where every field is scraped off the DOM individually.
//! [`SubmissionDetailsSource`] covers the new site, where a submission id
//! buys the whole submission-details payload in one JSON document.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::contract::ProblemSource;

/// Map a language label to its source-file extension. Accepts both the
/// display labels used by the old site ("Python3", "C++") and the api names
/// used by the new one ("python3", "cpp").
pub fn extension_for(language: &str) -> Option<&'static str> {
    let lang = language.trim().to_ascii_lowercase();
    let ext = match lang.as_str() {
        "c++" | "cpp" => ".cpp",
        "java" => ".java",
        "python" | "python3" => ".py",
        "c" => ".c",
        "c#" | "csharp" => ".cs",
        "javascript" => ".js",
        "typescript" => ".ts",
        "ruby" => ".rb",
        "swift" => ".swift",
        "go" | "golang" => ".go",
        "kotlin" => ".kt",
        "scala" => ".scala",
        "rust" => ".rs",
        "php" => ".php",
        "mysql" | "mssql" | "ms sql server" | "oracle" | "oraclesql" => ".sql",
        "dart" => ".dart",
        "racket" => ".rkt",
        "erlang" => ".erl",
        "elixir" => ".ex",
        _ => return None,
    };
    Some(ext)
}

/// Old-site extractor: all fields pre-scraped by the content script.
#[derive(Debug, Clone, Default)]
pub struct CapturedPage {
    pub slug: String,
    pub accepted: bool,
    pub stats: Option<String>,
    pub question: Option<String>,
    pub code: Option<String>,
    /// Language display label, e.g. "Python3".
    pub language: Option<String>,
    pub difficulty: Option<String>,
    pub topic_tags: Vec<String>,
    pub notes: Option<String>,
    pub submission_id: Option<u64>,
}

#[async_trait]
impl ProblemSource for CapturedPage {
    async fn accepted(&self) -> bool {
        self.accepted
    }

    fn slug(&self) -> String {
        self.slug.clone()
    }

    fn stats(&self) -> Option<String> {
        self.stats.clone()
    }

    fn question(&self) -> Option<String> {
        self.question.clone()
    }

    fn code(&self) -> Option<String> {
        self.code.clone()
    }

    fn language_extension(&self) -> Option<String> {
        self.language
            .as_deref()
            .and_then(extension_for)
            .map(str::to_owned)
    }

    fn difficulty(&self) -> Option<String> {
        self.difficulty.clone()
    }

    fn topic_tags(&self) -> Vec<String> {
        self.topic_tags.clone()
    }

    fn notes(&self) -> Option<String> {
        self.notes.clone()
    }

    fn submission_id(&self) -> Option<u64> {
        self.submission_id
    }
}

const STATUS_ACCEPTED: i64 = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionDetails {
    #[serde(default)]
    runtime_display: Option<String>,
    #[serde(default)]
    runtime_percentile: Option<f64>,
    #[serde(default)]
    memory_display: Option<String>,
    #[serde(default)]
    memory_percentile: Option<f64>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    status_code: Option<i64>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    lang: Option<Lang>,
    #[serde(default)]
    question: Option<QuestionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Lang {
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDetails {
    #[serde(default)]
    title_slug: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    topic_tags: Vec<TopicTag>,
}

#[derive(Debug, Clone, Deserialize)]
struct TopicTag {
    name: String,
}

/// New-site extractor over the submission-details JSON payload.
#[derive(Debug, Clone)]
pub struct SubmissionDetailsSource {
    slug: String,
    submission_id: Option<u64>,
    details: SubmissionDetails,
}

impl SubmissionDetailsSource {
    /// Parse the raw submission-details payload. `slug` is the slug taken
    /// from the page URL, used when the payload itself carries none.
    pub fn new(
        slug: impl Into<String>,
        submission_id: Option<u64>,
        payload: Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            slug: slug.into(),
            submission_id,
            details: serde_json::from_value(payload)?,
        })
    }
}

#[async_trait]
impl ProblemSource for SubmissionDetailsSource {
    async fn accepted(&self) -> bool {
        self.details.status_code == Some(STATUS_ACCEPTED)
    }

    fn slug(&self) -> String {
        self.details
            .question
            .as_ref()
            .and_then(|q| q.title_slug.clone())
            .unwrap_or_else(|| self.slug.clone())
    }

    fn stats(&self) -> Option<String> {
        let runtime = self.details.runtime_display.as_deref()?;
        let memory = self.details.memory_display.as_deref()?;
        let runtime_pct = self.details.runtime_percentile.unwrap_or(0.0);
        let memory_pct = self.details.memory_percentile.unwrap_or(0.0);
        Some(format!(
            "Time: {runtime} ({runtime_pct:.2}%), Space: {memory} ({memory_pct:.2}%)"
        ))
    }

    fn question(&self) -> Option<String> {
        self.details.question.as_ref()?.content.clone()
    }

    fn code(&self) -> Option<String> {
        self.details.code.clone()
    }

    fn language_extension(&self) -> Option<String> {
        self.details
            .lang
            .as_ref()
            .and_then(|lang| extension_for(&lang.name))
            .map(str::to_owned)
    }

    fn difficulty(&self) -> Option<String> {
        self.details.question.as_ref()?.difficulty.clone()
    }

    fn topic_tags(&self) -> Vec<String> {
        self.details
            .question
            .as_ref()
            .map(|q| q.topic_tags.iter().map(|tag| tag.name.clone()).collect())
            .unwrap_or_default()
    }

    fn notes(&self) -> Option<String> {
        self.details.notes.clone()
    }

    fn submission_id(&self) -> Option<u64> {
        self.submission_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "runtimeDisplay": "2 ms",
            "runtimePercentile": 97.123,
            "memoryDisplay": "8.3 MB",
            "memoryPercentile": 55.6,
            "code": "class Solution:\n    pass\n",
            "statusCode": 10,
            "notes": "two pointers",
            "lang": { "name": "python3" },
            "question": {
                "titleSlug": "two-sum",
                "content": "<p>Given an array of integers...</p>",
                "difficulty": "Easy",
                "topicTags": [
                    { "name": "Array" },
                    { "name": "Hash Table" }
                ]
            }
        })
    }

    #[tokio::test]
    async fn parses_the_submission_details_payload() {
        let source =
            SubmissionDetailsSource::new("two-sum", Some(123456), sample_payload()).expect("parses");

        assert!(source.accepted().await);
        assert_eq!(source.slug(), "two-sum");
        assert_eq!(
            source.stats().as_deref(),
            Some("Time: 2 ms (97.12%), Space: 8.3 MB (55.60%)")
        );
        assert_eq!(source.language_extension().as_deref(), Some(".py"));
        assert_eq!(source.difficulty().as_deref(), Some("Easy"));
        assert_eq!(source.topic_tags(), vec!["Array", "Hash Table"]);
        assert_eq!(source.notes().as_deref(), Some("two pointers"));
        assert_eq!(source.submission_id(), Some(123456));
    }

    #[tokio::test]
    async fn wrong_answer_is_not_accepted() {
        let mut payload = sample_payload();
        payload["statusCode"] = json!(11);
        let source = SubmissionDetailsSource::new("two-sum", None, payload).expect("parses");
        assert!(!source.accepted().await);
    }

    #[test]
    fn sparse_payload_yields_empty_fields_rather_than_errors() {
        let source =
            SubmissionDetailsSource::new("two-sum", None, json!({ "statusCode": 10 }))
                .expect("parses");
        assert_eq!(source.slug(), "two-sum");
        assert!(source.stats().is_none());
        assert!(source.question().is_none());
        assert!(source.language_extension().is_none());
        assert!(source.topic_tags().is_empty());
    }

    #[test]
    fn extension_table_covers_label_and_api_spellings() {
        assert_eq!(extension_for("Python3"), Some(".py"));
        assert_eq!(extension_for("python3"), Some(".py"));
        assert_eq!(extension_for("C++"), Some(".cpp"));
        assert_eq!(extension_for("cpp"), Some(".cpp"));
        assert_eq!(extension_for("MS SQL Server"), Some(".sql"));
        assert_eq!(extension_for("Rust"), Some(".rs"));
        assert_eq!(extension_for("Brainfuck"), None);
    }

    #[test]
    fn captured_page_resolves_its_language() {
        let page = CapturedPage {
            language: Some("Kotlin".into()),
            ..CapturedPage::default()
        };
        assert_eq!(page.language_extension().as_deref(), Some(".kt"));

        let unknown = CapturedPage {
            language: Some("Whitespace".into()),
            ..CapturedPage::default()
        };
        assert_eq!(unknown.language_extension(), None);
    }
}
