//! The report client: one attempt, typed failure, no retry.
//!
//! [`ReportGenerator`] is the seam the orchestrating host depends on; the
//! concrete [`GeminiReportClient`] talks to the `generateContent` endpoint and
//! funnels every way a call can go wrong into [`ReportError`]. Callers treat
//! any error as "no report" and keep the session alive.

use crate::level::Level;
use crate::prompt;
use crate::report::{AdvancedReport, AnswerReport, FinalReport, JuniorReport};
use crate::session::InterviewAnswer;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything that can go wrong between "prompt built" and "validated report".
///
/// None of these abort the session; the host renders a fallback screen with a
/// way to continue.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned status {0}")]
    Status(u16),
    #[error("response carried no generated text")]
    EmptyPayload,
    #[error("model output contained no well-formed report object")]
    Shape,
}

/// The generation seam between the session host and the model endpoint.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait ReportGenerator: Send + Sync {
    /// Feedback for one answer, validated against the shared per-answer shape.
    async fn answer_report(
        &self,
        level: Level,
        question: &str,
        answer: &str,
    ) -> Result<AnswerReport, ReportError>;

    /// The aggregate report, validated against the requested level's variant.
    async fn final_report(
        &self,
        level: Level,
        answers: &[InterviewAnswer],
    ) -> Result<FinalReport, ReportError>;
}

// Response shape of the generateContent endpoint. Only the path down to the
// first candidate's first text part matters; the rest is ignored.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiReportClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiReportClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL.to_string(), DEFAULT_TIMEOUT)
    }

    /// Overrides the endpoint base and request timeout. The timeout bounds how
    /// long a stalled request can hold the session in a loading screen; on
    /// expiry the call resolves as a transport failure.
    pub fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url,
            timeout,
        }
    }

    /// Sends one prompt and returns the raw generated text.
    async fn generate(&self, prompt: String) -> Result<String, ReportError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %error_body, "generateContent call failed");
            return Err(ReportError::Status(status.as_u16()));
        }

        let data: GenerateResponse = response.json().await?;
        data.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ReportError::EmptyPayload)
    }
}

#[async_trait]
impl ReportGenerator for GeminiReportClient {
    async fn answer_report(
        &self,
        level: Level,
        question: &str,
        answer: &str,
    ) -> Result<AnswerReport, ReportError> {
        let prompt = prompt::answer_report_prompt(level, question, answer);
        let text = self.generate(prompt).await?;
        parse_answer_report(&text)
    }

    async fn final_report(
        &self,
        level: Level,
        answers: &[InterviewAnswer],
    ) -> Result<FinalReport, ReportError> {
        let prompt = prompt::final_report_prompt(level, answers);
        let text = self.generate(prompt).await?;
        parse_final_report(level, &text)
    }
}

/// Pulls the first plausible JSON object out of free-form model text.
///
/// Order of preference: the first fenced block, then the whole trimmed text,
/// then the first balanced `{...}` substring. No repair is attempted on
/// malformed JSON; the caller fails cleanly instead.
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(inner) = fenced_block(text) {
        return Some(inner);
    }
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }
    balanced_object(text)
}

/// Returns the contents of the first ``` fence, tolerating a `json` tag.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let after = after.strip_prefix("json").unwrap_or(after);
    let end = after.find("```")?;
    Some(after[..end].trim())
}

/// Scans for the first brace-balanced object, skipping braces inside string
/// literals and escaped quotes.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, byte) in text.bytes().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_answer_report(text: &str) -> Result<AnswerReport, ReportError> {
    let candidate = extract_json_object(text).ok_or_else(|| {
        tracing::error!(raw = %text, "no JSON object in model output");
        ReportError::Shape
    })?;
    serde_json::from_str(candidate).map_err(|error| {
        tracing::error!(%error, raw = %text, "model output did not match the answer-report shape");
        ReportError::Shape
    })
}

fn parse_final_report(level: Level, text: &str) -> Result<FinalReport, ReportError> {
    let candidate = extract_json_object(text).ok_or_else(|| {
        tracing::error!(raw = %text, "no JSON object in model output");
        ReportError::Shape
    })?;
    let parsed = match level {
        Level::Elementary | Level::Middle => {
            serde_json::from_str::<JuniorReport>(candidate).map(FinalReport::Junior)
        }
        Level::Advanced => {
            serde_json::from_str::<AdvancedReport>(candidate).map(FinalReport::Advanced)
        }
    };
    parsed.map_err(|error| {
        tracing::error!(%error, %level, raw = %text, "model output did not match the final-report shape");
        ReportError::Shape
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER_REPORT_JSON: &str = r#"{
        "title": "Question 2 analysis report",
        "evaluationTitle": "Speaking score",
        "evaluationValue": "78 points",
        "praiseTitle": "Strength analysis",
        "praise": "Well grounded in experience.",
        "growthTipTitle": "Improvement suggestion",
        "growthTip": "Lead with the conclusion.",
        "buttonText": "Next question",
        "score": 78
    }"#;

    #[test]
    fn extracts_a_fenced_json_block() {
        let text = format!("Here is the report:\n```json\n{ANSWER_REPORT_JSON}\n```\nGood luck!");
        let extracted = extract_json_object(&text).unwrap();
        assert!(extracted.starts_with('{') && extracted.ends_with('}'));
        let report: AnswerReport = serde_json::from_str(extracted).unwrap();
        assert_eq!(report.score, 78);
    }

    #[test]
    fn extracts_a_fence_without_language_tag() {
        let text = format!("```\n{ANSWER_REPORT_JSON}\n```");
        assert!(extract_json_object(&text).is_some());
    }

    #[test]
    fn whole_text_object_is_used_as_is() {
        let extracted = extract_json_object(ANSWER_REPORT_JSON).unwrap();
        let report: AnswerReport = serde_json::from_str(extracted).unwrap();
        assert_eq!(report.evaluation_value, "78 points");
    }

    #[test]
    fn finds_a_bare_object_embedded_in_prose() {
        let text = format!("Sure! Here is your feedback. {ANSWER_REPORT_JSON} Hope that helps.");
        let extracted = extract_json_object(&text).unwrap();
        let report: AnswerReport = serde_json::from_str(extracted).unwrap();
        assert_eq!(report.title, "Question 2 analysis report");
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_the_scanner() {
        let text = r#"note: {"title": "uses { and } inside", "value": "ok \" quoted"} trailing"#;
        let extracted = extract_json_object(text).unwrap();
        let value: serde_json::Value = serde_json::from_str(extracted).unwrap();
        assert_eq!(value["title"], "uses { and } inside");
    }

    #[test]
    fn nested_objects_extract_to_the_outermost_close() {
        let text = r#"prefix {"outer": {"inner": 1}, "k": 2} suffix"#;
        let extracted = extract_json_object(text).unwrap();
        assert_eq!(extracted, r#"{"outer": {"inner": 1}, "k": 2}"#);
    }

    #[test]
    fn text_with_no_object_yields_none() {
        assert!(extract_json_object("no json here at all").is_none());
        assert!(extract_json_object("[1, 2, 3]").is_none());
        assert!(extract_json_object("{ never closed").is_none());
    }

    #[test]
    fn parse_answer_report_rejects_non_object_json() {
        assert!(matches!(
            parse_answer_report("\"just a string\""),
            Err(ReportError::Shape)
        ));
        assert!(matches!(
            parse_answer_report("plain refusal text"),
            Err(ReportError::Shape)
        ));
    }

    #[test]
    fn parse_final_report_validates_the_requested_level_only() {
        let junior = r#"{
            "title": "Report",
            "overallScore": 82,
            "overallGrade": "Great job!",
            "persona": "Adventurer",
            "radarChartData": [{"label": "Speaking boldly", "score": 80}],
            "detailedAnalysis": [{"category": "Speaking boldly", "score": 80, "comment": "ok"}],
            "finalCommentTitle": "t",
            "finalComment": "c",
            "growthGraphData": [{"question": 1, "score": 85}]
        }"#;

        let parsed = parse_final_report(Level::Elementary, junior).unwrap();
        assert!(matches!(parsed, FinalReport::Junior(_)));

        // The same payload requested at the advanced tier is a shape failure:
        // its required sections are missing.
        assert!(matches!(
            parse_final_report(Level::Advanced, junior),
            Err(ReportError::Shape)
        ));
    }

    #[tokio::test]
    async fn mock_generator_drives_the_trait_seam() {
        let mut generator = MockReportGenerator::new();
        generator
            .expect_answer_report()
            .returning(|_, _, _| {
                Box::pin(async move {
                    serde_json::from_str::<AnswerReport>(ANSWER_REPORT_JSON)
                        .map_err(|_| ReportError::Shape)
                })
            })
            .once();

        let report = generator
            .answer_report(Level::Middle, "question", "answer")
            .await
            .unwrap();
        assert_eq!(report.score, 78);
    }

    // Live integration test against the real endpoint. Ignored by default so
    // `cargo test` runs without credentials; run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn live_answer_report_for_middle_tier() {
        dotenvy::dotenv_override().ok();
        let api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY not set");
        let client = GeminiReportClient::new(api_key, "gemini-2.5-flash".to_string());

        let report = client
            .answer_report(
                Level::Middle,
                "Should students be required to wear school uniforms?",
                "I believe uniforms reduce pressure around fashion, because everyone starts the day equal.",
            )
            .await
            .expect("live call should produce a report");
        assert!(report.score <= 100);
        assert!(!report.praise.is_empty());
    }
}
