//! Bracket aggregate, its status, and final standings.

use crate::models::game::{Match, MatchId};
use crate::models::participant::{Competitor, SeededEntrant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a bracket.
pub type BracketId = uuid::Uuid;

/// Lifecycle of a bracket. `Complete` is terminal.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStatus {
    /// Match graph under construction, not yet persisted.
    #[default]
    Building,
    InProgress,
    Complete,
}

/// Final standings. Third and fourth stay unset without a consolation match.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub winner: Option<Competitor>,
    pub runner_up: Option<Competitor>,
    pub third_place: Option<Competitor>,
    pub fourth_place: Option<Competitor>,
}

/// Aggregate of all matches for one competition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub id: BracketId,
    pub name: String,
    pub status: BracketStatus,
    /// Next power of two >= entrant count.
    pub bracket_size: u32,
    pub rounds: u32,
    pub bye_count: u32,
    /// Entrants in seed order.
    pub entrants: Vec<SeededEntrant>,
    /// Every match of the bracket, main rounds first, consolation last.
    pub match_ids: Vec<MatchId>,
    pub final_match_id: MatchId,
    pub consolation_match_id: Option<MatchId>,
    #[serde(flatten)]
    pub ranking: Ranking,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Bracket {
    pub fn is_complete(&self) -> bool {
        self.status == BracketStatus::Complete
    }

    pub fn has_consolation(&self) -> bool {
        self.consolation_match_id.is_some()
    }
}

/// A bracket together with its match documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BracketView {
    pub bracket: Bracket,
    pub matches: Vec<Match>,
}

impl BracketView {
    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    /// Main-bracket match by round and position (the consolation match is excluded).
    pub fn match_at(&self, round: u32, position: u32) -> Option<&Match> {
        self.matches.iter().find(|m| {
            m.round == round
                && m.position == position
                && Some(m.id) != self.bracket.consolation_match_id
        })
    }

    pub fn round(&self, round: u32) -> Vec<&Match> {
        let mut ms: Vec<_> = self
            .matches
            .iter()
            .filter(|m| m.round == round && Some(m.id) != self.bracket.consolation_match_id)
            .collect();
        ms.sort_by_key(|m| m.position);
        ms
    }

    pub fn final_match(&self) -> Option<&Match> {
        self.get(self.bracket.final_match_id)
    }

    pub fn consolation_match(&self) -> Option<&Match> {
        self.get(self.bracket.consolation_match_id?)
    }
}
