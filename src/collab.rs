//! External collaborators: authorization decisions and post-commit notifications.

use crate::models::{BracketId, Competitor, EntrantId, MatchId, MatchKind, Ranking};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of whoever invokes an operation, as supplied by the identity layer.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
}

impl Caller {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// What the caller is trying to do.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    BuildBracket { bracket_id: BracketId },
    ReportResult { bracket_id: BracketId, match_id: MatchId },
    CommitRanking { bracket_id: BracketId },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AccessDecision {
    Allow,
    /// Surfaced to the caller verbatim as `PermissionDenied`.
    Deny(String),
}

pub trait Authorizer: Send + Sync {
    fn authorize(&self, caller: &Caller, action: &Action) -> AccessDecision;
}

/// Trusts every caller. Used when authorization happens in front of the engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _caller: &Caller, _action: &Action) -> AccessDecision {
        AccessDecision::Allow
    }
}

/// Emitted after a reported result commits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchCompleted {
    pub bracket_id: BracketId,
    pub match_id: MatchId,
    pub kind: MatchKind,
    pub round_label: String,
    pub winner: Competitor,
    /// None when the loser slot was a BYE.
    pub loser: Option<Competitor>,
    pub score: Option<serde_json::Value>,
    /// Downstream matches that received the winner or loser.
    pub advanced_to: Vec<MatchId>,
}

impl MatchCompleted {
    pub fn winner_id(&self) -> EntrantId {
        self.winner.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    MatchCompleted(MatchCompleted),
    BracketCompleted { bracket_id: BracketId, ranking: Ranking },
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivery of engine events. Failures never roll back committed state.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &EngineEvent) -> Result<(), NotifyError>;
}

/// Writes events to the log instead of delivering them.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &EngineEvent) -> Result<(), NotifyError> {
        match event {
            EngineEvent::MatchCompleted(e) => log::info!(
                "{} ({}): {} beat {}",
                e.round_label,
                e.match_id,
                e.winner.name,
                e.loser.as_ref().map_or("BYE", |c| c.name.as_str())
            ),
            EngineEvent::BracketCompleted { bracket_id, ranking } => log::info!(
                "bracket {} complete, winner {}",
                bracket_id,
                ranking.winner.as_ref().map_or("-", |c| c.name.as_str())
            ),
        }
        Ok(())
    }
}
