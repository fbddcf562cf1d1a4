//! Offline providers: a canned mock for dry runs and scripted/failing
//! providers for deterministic tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::LlmError;
use crate::llm::client::{GenerationRequest, GenerationResponse, LlmProvider, Usage};

fn respond(content: impl Into<String>) -> GenerationResponse {
    GenerationResponse {
        content: content.into(),
        usage: Usage {
            prompt_tokens: 50,
            completion_tokens: 20,
        },
    }
}

/// A canned provider for running games without any API access.
///
/// Picks a plausible response by looking for the `ACTION:` marker in the
/// prompt, and infers its side from the role named in the system
/// instruction so an evil mock seat plays fail cards.
pub struct MockProvider;

impl MockProvider {
    /// Create a mock seat.
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

const EVIL_ROLE_MARKERS: &[&str] = &[
    "role is Morgana",
    "role is Mordred",
    "role is Oberon",
    "role is Assassin",
];

#[async_trait]
impl LlmProvider for MockProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let system = request
            .messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let evil = EVIL_ROLE_MARKERS.iter().any(|m| system.contains(m));
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let content = if prompt.contains("ACTION: PROPOSE_TEAM")
            || prompt.contains("ACTION: CONFIRM_TEAM")
        {
            "Team: [0, 1, 2, 3, 4]\nReasoning: I trust the first seats at the table.".to_string()
        } else if prompt.contains("ACTION: VOTE_ON_TEAM") {
            "Vote: approve\nReasoning: The team seems reasonable.".to_string()
        } else if prompt.contains("ACTION: EXECUTE_QUEST") {
            if evil {
                "Action: fail\nReasoning: For Mordred!".to_string()
            } else {
                "Action: success\nReasoning: For Arthur!".to_string()
            }
        } else if prompt.contains("ACTION: ASSASSINATE") {
            "Target: 0\nReasoning: Seat 0 knew too much.".to_string()
        } else if prompt.contains("ACTION: NOMINATE_MVP") {
            "I nominate Player 0 for steady leadership.".to_string()
        } else {
            "Hello everyone. I will watch the votes closely and say more soon.".to_string()
        };

        Ok(respond(content))
    }
}

/// A provider that replays a fixed queue of responses, optionally failing a
/// number of leading calls with a transient error first.
///
/// When the queue is exhausted it repeats the final response, so a short
/// script can drive an arbitrarily long phase.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    transient_failures: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Create a provider replaying `responses` in order.
    pub fn new(responses: Vec<&str>) -> Self {
        let last = responses.last().map(|s| s.to_string()).unwrap_or_default();
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            last: Mutex::new(last),
            transient_failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the first `n` calls with a rate-limit error before serving the
    /// script. Used to exercise the retry loop.
    pub fn with_transient_failures(self, n: usize) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Number of `generate` calls served (including failed ones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(LlmError::RateLimited("scripted transient failure".to_string()));
        }

        let mut queue = self.responses.lock().expect("script lock poisoned");
        let content = match queue.pop_front() {
            Some(next) => {
                *self.last.lock().expect("script lock poisoned") = next.clone();
                next
            }
            None => self.last.lock().expect("script lock poisoned").clone(),
        };
        Ok(respond(content))
    }
}

/// A deterministic per-seat strategy for driving whole games in tests and
/// dry runs: one fixed answer per action type, with call counters.
#[derive(Debug, Clone)]
pub struct Playbook {
    /// Team proposed whenever this seat leads.
    pub team: Vec<usize>,
    /// `approve` or `reject`.
    pub vote: &'static str,
    /// `success` or `fail`.
    pub quest_card: &'static str,
    /// Assassination target (proposal and final decision).
    pub target: usize,
    /// MVP nominee.
    pub mvp_nominee: usize,
}

impl Default for Playbook {
    fn default() -> Self {
        Self {
            team: vec![0, 1],
            vote: "approve",
            quest_card: "success",
            target: 0,
            mvp_nominee: 0,
        }
    }
}

/// A provider that answers every action type from a fixed [`Playbook`].
pub struct PlaybookProvider {
    playbook: Playbook,
    vote_calls: AtomicUsize,
    quest_calls: AtomicUsize,
}

impl PlaybookProvider {
    /// Create a provider following `playbook`.
    pub fn new(playbook: Playbook) -> Self {
        Self {
            playbook,
            vote_calls: AtomicUsize::new(0),
            quest_calls: AtomicUsize::new(0),
        }
    }

    /// Number of vote prompts this seat has received.
    pub fn vote_calls(&self) -> usize {
        self.vote_calls.load(Ordering::SeqCst)
    }

    /// Number of quest prompts this seat has received.
    pub fn quest_calls(&self) -> usize {
        self.quest_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for PlaybookProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let p = &self.playbook;

        let content = if prompt.contains("ACTION: PROPOSE_TEAM")
            || prompt.contains("ACTION: CONFIRM_TEAM")
        {
            format!("Team: {:?}\nReasoning: These seats have earned my trust.", p.team)
        } else if prompt.contains("ACTION: VOTE_ON_TEAM") {
            self.vote_calls.fetch_add(1, Ordering::SeqCst);
            format!("Vote: {}\nReasoning: My mind is made up.", p.vote)
        } else if prompt.contains("ACTION: EXECUTE_QUEST") {
            self.quest_calls.fetch_add(1, Ordering::SeqCst);
            format!("Action: {}\nReasoning: As planned.", p.quest_card)
        } else if prompt.contains("ACTION: ASSASSINATE_PROPOSAL")
            || prompt.contains("ACTION: ASSASSINATE_DECISION")
        {
            format!("Target: {}\nReasoning: The quiet ones know too much.", p.target)
        } else if prompt.contains("ACTION: NOMINATE_MVP") {
            format!("I nominate Player {} for playing the long game.", p.mvp_nominee)
        } else {
            "I have nothing to add beyond what the votes already show.".to_string()
        };

        Ok(respond(content))
    }
}

/// A provider whose every call fails terminally. Exercises safe defaults.
pub struct FailingProvider {
    calls: AtomicUsize,
}

impl FailingProvider {
    /// Create a provider that always returns a non-retryable API error.
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FailingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for FailingProvider {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::ApiError {
            code: 401,
            message: "scripted terminal failure".to_string(),
        })
    }
}
