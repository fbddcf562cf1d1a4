//! Per-seat agent: one seat's connection to its language model.
//!
//! A [`SeatAgent`] owns the seat's conversation memory (system prompt plus
//! every exchange so far), so phase prompts only need the history delta the
//! seat has not yet been shown. Each call is bounded by a timeout and a
//! fixed retry budget with exponential backoff; a call that exhausts its
//! budget surfaces an [`AgentError`] for the phase to convert into its safe
//! default. An agent holds no game knowledge beyond what it has been told.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{AgentError, LlmError};
use crate::llm::{ChatMessage, CostTracker, GenerationRequest, LlmProvider, ModelPricing};

/// Retry and deadline policy for one seat's calls.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Total attempts per call (first try included).
    pub max_attempts: u32,
    /// Backoff before retry `n` is `base_backoff * 2^n`.
    pub base_backoff: Duration,
    /// Deadline for a single provider call.
    pub call_timeout: Duration,
    /// Pricing used for cost accounting.
    pub pricing: ModelPricing,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(2),
            call_timeout: Duration::from_secs(300),
            pricing: ModelPricing::default(),
        }
    }
}

/// One seat's agent: provider handle, conversation memory and retry policy.
pub struct SeatAgent {
    seat: usize,
    model: String,
    provider: Arc<dyn LlmProvider>,
    config: AgentConfig,
    cost: Arc<CostTracker>,
    // Tokio mutex: held across the provider await. Phases never issue two
    // concurrent calls to the same seat, so contention is nil.
    memory: Mutex<Vec<ChatMessage>>,
}

impl SeatAgent {
    /// Create an agent for `seat` with the given system instruction (rules,
    /// role context and the seat's private knowledge).
    pub fn new(
        seat: usize,
        model: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        system_instruction: impl Into<String>,
        config: AgentConfig,
        cost: Arc<CostTracker>,
    ) -> Self {
        Self {
            seat,
            model: model.into(),
            provider,
            config,
            cost,
            memory: Mutex::new(vec![ChatMessage::system(system_instruction)]),
        }
    }

    /// The seat this agent plays.
    pub fn seat(&self) -> usize {
        self.seat
    }

    /// The model identifier this seat is configured with.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` as the next user turn and return the model's reply.
    ///
    /// Transient provider errors are retried with exponential backoff up to
    /// the attempt budget; non-retryable errors fail immediately. On success
    /// both the prompt and the reply are committed to the seat's memory; on
    /// failure the prompt is not committed, so the conversation stays
    /// consistent for the next call.
    pub async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        let mut memory = self.memory.lock().await;
        let mut messages = memory.clone();
        messages.push(ChatMessage::user(prompt));

        let mut last_err: Option<LlmError> = None;
        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                let backoff = self.config.base_backoff * 2u32.saturating_pow(attempt - 1);
                tracing::debug!(seat = self.seat, attempt, ?backoff, "retrying after backoff");
                tokio::time::sleep(backoff).await;
            }

            let request = GenerationRequest::new(self.model.clone(), messages.clone());
            let result = match tokio::time::timeout(
                self.config.call_timeout,
                self.provider.generate(request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout {
                    seconds: self.config.call_timeout.as_secs(),
                }),
            };

            match result {
                Ok(response) => {
                    self.cost
                        .record(self.seat, &self.model, self.config.pricing.cost(response.usage));
                    memory.push(ChatMessage::user(prompt));
                    memory.push(ChatMessage::assistant(response.content.clone()));
                    return Ok(response.content);
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(seat = self.seat, attempt, error = %err, "transient provider error");
                    last_err = Some(err);
                }
                Err(err) => {
                    tracing::warn!(seat = self.seat, error = %err, "fatal provider error");
                    return Err(AgentError::Fatal {
                        seat: self.seat,
                        source: err,
                    });
                }
            }
        }

        Err(AgentError::RetriesExhausted {
            seat: self.seat,
            attempts: self.config.max_attempts,
            last: last_err.unwrap_or(LlmError::EmptyResponse),
        })
    }

    /// Snapshot of the seat's full conversation, for the transcript export.
    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.memory.lock().await.clone()
    }
}
