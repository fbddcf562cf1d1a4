//! LLM provider boundary: the trait seats talk through, an OpenAI-compatible
//! HTTP client, cost accounting and offline mock providers.

pub mod client;
pub mod cost;
pub mod mock;

pub use client::{
    ChatMessage, GenerationRequest, GenerationResponse, LlmProvider, OpenAiCompatClient, Usage,
};
pub use cost::{CostReport, CostTracker, ModelPricing};
pub use mock::{FailingProvider, MockProvider, Playbook, PlaybookProvider, ScriptedProvider};
