//! Error types for avalon-arena.
//!
//! Defines error types for the major subsystems:
//! - Game setup and rule configuration
//! - LLM provider interactions
//! - Per-seat agent calls (retry exhaustion, fatal provider errors)
//! - Structured response parsing

use thiserror::Error;

/// Errors that abort a game before or during orchestration.
#[derive(Debug, Error)]
pub enum GameError {
    /// No role table is defined for the requested player count.
    #[error("No role table for {num_players} players (supported: 5-10)")]
    NoRoleTable { num_players: usize },

    /// A seat has no model configured.
    #[error("No model configured for seat {seat}")]
    MissingSeatModel { seat: usize },

    /// Generic configuration problem (duplicate seats, bad counts, ...).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required role is missing from the assignment.
    #[error("Required role '{role}' not present in this game")]
    RoleNotInGame { role: &'static str },

    /// IO error while writing game artifacts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors that can occur during a single LLM provider call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing API key for the configured provider.
    #[error("Missing API key: {0} environment variable not set")]
    MissingApiKey(String),

    /// The HTTP request itself failed (connection, TLS, ...).
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// The provider rejected the request with an HTTP error.
    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    /// The provider rate-limited the request.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The response body could not be decoded.
    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    /// The response contained no choices.
    #[error("LLM response contained no content")]
    EmptyResponse,

    /// The call exceeded the configured deadline.
    #[error("LLM call timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl LlmError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Rate limits, timeouts, transport failures and 5xx responses are
    /// transient; auth errors and malformed responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::Timeout { .. } | Self::RequestFailed(_) => true,
            Self::ApiError { code, .. } => *code >= 500,
            Self::MissingApiKey(_) | Self::ParseError(_) | Self::EmptyResponse => false,
        }
    }
}

/// Errors surfaced by a seat's agent after its internal retry loop.
///
/// Phases never propagate these: every phase converts them into its safe
/// default action and records the anomaly.
#[derive(Debug, Error)]
pub enum AgentError {
    /// All retry attempts were exhausted on transient errors.
    #[error("Seat {seat}: gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        seat: usize,
        attempts: u32,
        last: LlmError,
    },

    /// The provider returned a non-retryable error.
    #[error("Seat {seat}: fatal provider error: {source}")]
    Fatal { seat: usize, source: LlmError },
}

/// A structured field in an LLM response that could not be parsed.
///
/// Never fatal: each phase substitutes its own safe default (reject on an
/// ambiguous vote, success on an ambiguous quest card, empty team on a
/// malformed proposal, previous team on a malformed confirmation).
#[derive(Debug, Error)]
pub enum ParseAnomaly {
    /// Expected labeled line (e.g. `Team:`) was missing.
    #[error("Response is missing the '{label}' line")]
    MissingLabel { label: &'static str },

    /// The team list could not be read as a list of seat ids.
    #[error("Malformed team list: {0}")]
    MalformedTeamList(String),

    /// The vote token was neither `approve` nor `reject`.
    #[error("Unrecognized vote token: {0}")]
    UnrecognizedVote(String),

    /// The quest card was neither `success` nor `fail`.
    #[error("Unrecognized quest action: {0}")]
    UnrecognizedQuestAction(String),

    /// The assassination target was not a valid seat id.
    #[error("Malformed target: {0}")]
    MalformedTarget(String),

    /// The MVP statement contained no recognizable nomination.
    #[error("No nomination found in statement")]
    NoNomination,
}
