use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::config::Settings;
use crate::schemas::profile::HistoryEntry;

const RESPONSE_CONTRACT: &str = r#"{
    "syntax_errors": [
        {"line": <line_number>, "description": "<description>", "suggestion": "<suggestion>"}
    ],
    "logic_errors": [
        {"description": "<description>", "affected_lines": [<line_numbers>], "suggestion": "<suggestion>"}
    ],
    "style_issues": [
        {"line": <line_number>, "description": "<description>", "suggestion": "<suggestion>"}
    ],
    "efficiency_concerns": [
        {"description": "<description>", "affected_lines": [<line_numbers>], "suggestion": "<suggestion>"}
    ],
    "conceptual_misunderstandings": [
        {"concept": "<concept_name>", "description": "<description>", "resources": ["<resource_url>", "<resource_description>"]}
    ],
    "positive_aspects": [
        "<positive_comment>"
    ],
    "overall_feedback": "<general feedback>",
    "suggested_resources": [
        {"title": "<resource_title>", "url": "<resource_url>", "reason": "<why this is helpful>"}
    ],
    "grade_estimate": "<estimated grade out of 100>"
}"#;

/// One submission as presented to the model, including up to three prior
/// history entries for context.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub student_id: String,
    pub assignment: String,
    pub language: String,
    pub code: String,
    pub recent_history: Vec<HistoryEntry>,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
    #[error("model provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("failed to reach model provider: {0}")]
    Transport(String),
    #[error("model response carried no content")]
    MissingContent,
}

/// Seam between the pipeline and the provider; implemented by
/// [`ChatModelClient`] in production and scripted fakes in tests.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    async fn call_model(&self, request: &AnalysisRequest) -> Result<String, ModelError>;
}

/// OpenAI-compatible chat-completions client (Groq by default).
#[derive(Debug, Clone)]
pub struct ChatModelClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    request_timeout: u64,
}

impl ChatModelClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().api_key.clone(),
            base_url: settings.ai().base_url.trim_end_matches('/').to_string(),
            model: settings.ai().model.clone(),
            temperature: settings.ai().temperature,
            request_timeout: settings.ai().request_timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout { seconds: self.request_timeout }
        } else {
            ModelError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ModelCaller for ChatModelClient {
    async fn call_model(&self, request: &AnalysisRequest) -> Result<String, ModelError> {
        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": build_prompt(request)}],
            "temperature": self.temperature,
        });

        tracing::info!(
            student_id = %request.student_id,
            assignment = %request.assignment,
            language = %request.language,
            "Sending code analysis request"
        );

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider { status: status.as_u16(), message });
        }

        let body: Value = response.json().await.map_err(|err| self.classify(err))?;
        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|value| value.as_str())
            .ok_or(ModelError::MissingContent)?;

        Ok(content.to_string())
    }
}

/// Deterministic prompt: same submission and history always produce the same
/// text. History is embedded as JSON so the model sees prior grades and key
/// issues verbatim.
pub(crate) fn build_prompt(request: &AnalysisRequest) -> String {
    let history =
        serde_json::to_string(&request.recent_history).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are an expert programming teacher's assistant. Analyze the following {language} code submission for a student.\n\
         \n\
         STUDENT INFORMATION:\n\
         - Student ID: {student_id}\n\
         - Assignment: {assignment}\n\
         - Previous feedback patterns: {history}\n\
         \n\
         CODE:\n\
         ```{language}\n\
         {code}\n\
         ```\n\
         \n\
         Provide a comprehensive analysis in the following JSON format:\n\
         {contract}\n\
         \n\
         Only respond with the JSON. Do not include any other text in your response.",
        language = request.language,
        student_id = request.student_id,
        assignment = request.assignment,
        history = history,
        code = request.code,
        contract = RESPONSE_CONTRACT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> AnalysisRequest {
        AnalysisRequest {
            student_id: "S1".to_string(),
            assignment: "A1".to_string(),
            language: "python".to_string(),
            code: "print('hi')".to_string(),
            recent_history: vec![HistoryEntry {
                timestamp: "2025-01-02T10:20:30Z".to_string(),
                assignment: "A0".to_string(),
                grade_estimate: "70/100".to_string(),
                key_issues: vec!["loops".to_string()],
            }],
        }
    }

    #[test]
    fn prompt_embeds_submission_and_history() {
        let prompt = build_prompt(&sample_request());
        assert!(prompt.contains("Student ID: S1"));
        assert!(prompt.contains("Assignment: A1"));
        assert!(prompt.contains("```python\nprint('hi')\n```"));
        assert!(prompt.contains("\"grade_estimate\":\"70/100\""));
        assert!(prompt.contains("\"grade_estimate\": \"<estimated grade out of 100>\""));
        assert!(prompt.ends_with("Do not include any other text in your response."));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(build_prompt(&sample_request()), build_prompt(&sample_request()));
    }

    #[test]
    fn empty_history_serializes_as_empty_list() {
        let mut request = sample_request();
        request.recent_history.clear();
        assert!(build_prompt(&request).contains("Previous feedback patterns: []"));
    }
}
