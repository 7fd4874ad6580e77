use crate::clients::chat::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::ScorerConfig;
use crate::models::{CandidateChunk, ChunkScore, FewShotExample};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Neutral score assigned when the scorer cannot produce a usable number
/// for a chunk. Matches the middle of the 1..5 rating scale.
pub const FALLBACK_SCORE: f64 = 3.0;

#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("scorer request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("scorer returned an empty response")]
    Empty,
    #[error("scorer returned malformed output: {0}")]
    Malformed(String),
}

/// Seam for the external relevance scorer so the scoring pipeline can be
/// exercised with fakes.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Score a batch of candidates against the user's few-shot examples.
    /// A successful response covers every input candidate exactly once,
    /// using [`FALLBACK_SCORE`] for ids the scorer failed to mention.
    async fn score_batch(
        &self,
        candidates: &[CandidateChunk],
        examples: &[FewShotExample],
        model: &str,
    ) -> Result<Vec<ChunkScore>, ScorerError>;
}

/// HTTP implementation speaking the OpenAI-compatible chat-completions
/// protocol with a strict JSON-schema response format.
pub struct HttpRelevanceScorer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HttpRelevanceScorer {
    pub fn new(http: reqwest::Client, config: &ScorerConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

fn score_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "chunk_scores",
            "strict": true,
            "schema": {
                "type": "object",
                "additionalProperties": false,
                "required": ["scores"],
                "properties": {
                    "scores": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "additionalProperties": false,
                            "required": ["id", "score"],
                            "properties": {
                                "id": { "type": "string" },
                                "score": { "type": "number" }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Render the user's rating history as calibration context for the scorer.
pub fn build_few_shot_text(examples: &[FewShotExample]) -> String {
    if examples.is_empty() {
        return "No historical ratings available yet. Use your best estimate.".to_string();
    }

    examples
        .iter()
        .enumerate()
        .map(|(index, example)| {
            let note = match &example.annotation {
                Some(annotation) if !annotation.is_empty() => format!("\nNote: {}", annotation),
                _ => String::new(),
            };
            format!(
                "Example {}\nRating: {}\nChunk: {}{}",
                index + 1,
                example.rating,
                example.content,
                note
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, serde::Deserialize)]
struct ScoresPayload {
    scores: Vec<RawScore>,
}

#[derive(Debug, serde::Deserialize)]
struct RawScore {
    id: Uuid,
    score: f64,
}

#[async_trait]
impl RelevanceScorer for HttpRelevanceScorer {
    async fn score_batch(
        &self,
        candidates: &[CandidateChunk],
        examples: &[FewShotExample],
        model: &str,
    ) -> Result<Vec<ChunkScore>, ScorerError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let candidate_json = serde_json::to_string(candidates)
            .map_err(|e| ScorerError::Malformed(e.to_string()))?;

        let request = ChatRequest {
            model: model.to_string(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a recommendation scorer. Score each chunk from 1 to 5. \
                              Return only JSON that matches the schema."
                        .to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Historical examples:\n{}\n\nScore these chunks:\n{}",
                        build_few_shot_text(examples),
                        candidate_json
                    ),
                },
            ],
            response_format: Some(score_schema()),
            stream: None,
            max_completion_tokens: None,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let content = response.first_content().ok_or(ScorerError::Empty)?;
        let payload: ScoresPayload = serde_json::from_str(&content)
            .map_err(|e| ScorerError::Malformed(e.to_string()))?;

        let by_id: HashMap<Uuid, f64> = payload
            .scores
            .into_iter()
            .map(|raw| (raw.id, raw.score))
            .collect();

        debug!(
            scored = by_id.len(),
            requested = candidates.len(),
            "scorer batch returned"
        );

        Ok(candidates
            .iter()
            .map(|chunk| {
                let score = by_id
                    .get(&chunk.id)
                    .copied()
                    .filter(|s| s.is_finite())
                    .unwrap_or(FALLBACK_SCORE);
                ChunkScore {
                    id: chunk.id,
                    score,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn few_shot_text_mentions_every_example() {
        let examples = vec![
            FewShotExample {
                content: "first chunk".to_string(),
                rating: 5,
                annotation: Some("loved it".to_string()),
            },
            FewShotExample {
                content: "second chunk".to_string(),
                rating: 2,
                annotation: None,
            },
        ];
        let text = build_few_shot_text(&examples);
        assert!(text.contains("Rating: 5"));
        assert!(text.contains("first chunk"));
        assert!(text.contains("Note: loved it"));
        assert!(text.contains("Rating: 2"));
        assert!(!text.contains("Note: \n"));
    }

    #[test]
    fn few_shot_text_without_examples_asks_for_estimate() {
        assert!(build_few_shot_text(&[]).contains("best estimate"));
    }
}
