use crate::clients::chat::{ChatMessage, ChatRequest, ChatResponse, ChatStreamChunk};
use crate::clients::scorer::ScorerError;
use crate::config::ScorerConfig;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::time::Duration;

const CONTEXT_SYSTEM_PROMPT: &str =
    "Given the first text block (a chunk) and the second text block (the full document it comes \
     from), provide: 1) one sentence that contextualizes where the chunk comes from, 2) a concise \
     outline of the full document with one line per section/chapter, and clearly indicate where \
     the chunk fits. Keep total output under half a page.";

/// Client for the context generator collaborator: summarizes where a chunk
/// sits inside its source document. Supports one-shot and streamed modes.
pub struct ContextGenerator {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl ContextGenerator {
    pub fn new(http: reqwest::Client, config: &ScorerConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn request(&self, chunk_text: &str, full_document: &str, model: &str, stream: bool) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            temperature: 0.2,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: CONTEXT_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("{}\n\n{}", chunk_text, full_document),
                },
            ],
            response_format: None,
            stream: stream.then_some(true),
            max_completion_tokens: Some(800),
        }
    }

    /// One-shot context generation.
    pub async fn generate(
        &self,
        chunk_text: &str,
        full_document: &str,
        model: &str,
    ) -> Result<String, ScorerError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&self.request(chunk_text, full_document, model, false))
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response.first_content().ok_or(ScorerError::Empty)
    }

    /// Streamed context generation: yields text deltas as they arrive.
    pub async fn stream(
        &self,
        chunk_text: &str,
        full_document: &str,
        model: &str,
    ) -> Result<BoxStream<'static, Result<String, ScorerError>>, ScorerError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&self.request(chunk_text, full_document, model, true))
            .send()
            .await?
            .error_for_status()?;

        let deltas = response
            .bytes_stream()
            .scan(String::new(), |buffer, chunk| {
                let texts: Vec<Result<String, ScorerError>> = match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        drain_sse_lines(buffer).into_iter().map(Ok).collect()
                    }
                    Err(e) => vec![Err(ScorerError::Http(e))],
                };
                futures::future::ready(Some(futures::stream::iter(texts)))
            })
            .flatten();

        Ok(deltas.boxed())
    }
}

/// Pull complete `data:` lines out of the SSE buffer, returning any text
/// deltas they carry. Incomplete trailing data stays in the buffer.
fn drain_sse_lines(buffer: &mut String) -> Vec<String> {
    let mut texts = Vec::new();

    while let Some(newline) = buffer.find('\n') {
        let line: String = buffer.drain(..=newline).collect();
        let line = line.trim();
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }
        if let Ok(event) = serde_json::from_str::<ChatStreamChunk>(data) {
            if let Some(text) = event
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta)
                .and_then(|delta| delta.content)
            {
                if !text.is_empty() {
                    texts.push(text);
                }
            }
        }
    }

    texts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_parser_extracts_deltas_and_keeps_partial_tail() {
        let mut buffer = String::from(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\
             data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\
             data: {\"choices\":[{\"delta\":{\"con",
        );
        let texts = drain_sse_lines(&mut buffer);
        assert_eq!(texts, vec!["Hel".to_string(), "lo".to_string()]);
        assert!(buffer.starts_with("data: {\"choices\""));
    }

    #[test]
    fn sse_parser_ignores_done_marker_and_blank_lines() {
        let mut buffer = String::from("\ndata: [DONE]\n\n");
        assert!(drain_sse_lines(&mut buffer).is_empty());
        assert!(buffer.is_empty());
    }
}
