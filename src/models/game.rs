//! Match node of the bracket graph: slots, status, and advancement links.

use crate::models::participant::{Competitor, EntrantId};
use crate::models::bracket::BracketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// One of the two opponent positions in a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPosition {
    Player1,
    Player2,
}

impl SlotPosition {
    pub fn other(self) -> Self {
        match self {
            SlotPosition::Player1 => SlotPosition::Player2,
            SlotPosition::Player2 => SlotPosition::Player1,
        }
    }

    /// Slot a child at `position` feeds in its parent (even -> player1, odd -> player2).
    pub fn for_child(position: u32) -> Self {
        if position % 2 == 0 {
            SlotPosition::Player1
        } else {
            SlotPosition::Player2
        }
    }
}

/// Contents of a slot.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "competitor", rename_all = "snake_case")]
pub enum Slot {
    /// Waiting for an upstream match.
    #[default]
    Open,
    /// Placeholder opponent; whoever faces it advances without playing.
    Bye,
    Filled(Competitor),
}

impl Slot {
    pub fn competitor(&self) -> Option<&Competitor> {
        match self {
            Slot::Filled(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Slot::Open)
    }
}

/// `pending` (slots not both filled) -> `scheduled` (both filled) -> `completed`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Scheduled,
    Completed,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    #[default]
    Normal,
    Final,
    Consolation,
}

/// Forward reference to a downstream match and the slot to fill there.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchLink {
    pub match_id: MatchId,
    pub slot: SlotPosition,
}

/// A single match. Created once at build time, then only updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub bracket_id: BracketId,
    /// 0 = first round.
    pub round: u32,
    /// Position within the round, left to right.
    pub position: u32,
    pub round_label: String,
    #[serde(rename = "type")]
    pub kind: MatchKind,
    pub player1: Slot,
    pub player2: Slot,
    pub status: MatchStatus,
    /// None if not yet played (or a BYE-vs-BYE walkover).
    pub winner: Option<EntrantId>,
    pub score: Option<serde_json::Value>,
    pub next_match_for_winner: Option<MatchLink>,
    pub next_match_for_loser: Option<MatchLink>,
    /// Resolved against a BYE without being played.
    #[serde(default)]
    pub walkover: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn new(
        bracket_id: BracketId,
        round: u32,
        position: u32,
        round_label: impl Into<String>,
        kind: MatchKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bracket_id,
            round,
            position,
            round_label: round_label.into(),
            kind,
            player1: Slot::Open,
            player2: Slot::Open,
            status: MatchStatus::Pending,
            winner: None,
            score: None,
            next_match_for_winner: None,
            next_match_for_loser: None,
            walkover: false,
            completed_at: None,
        }
    }

    pub fn slot(&self, pos: SlotPosition) -> &Slot {
        match pos {
            SlotPosition::Player1 => &self.player1,
            SlotPosition::Player2 => &self.player2,
        }
    }

    pub fn slot_mut(&mut self, pos: SlotPosition) -> &mut Slot {
        match pos {
            SlotPosition::Player1 => &mut self.player1,
            SlotPosition::Player2 => &mut self.player2,
        }
    }

    /// Which slot holds `entrant`, if any.
    pub fn position_of(&self, entrant: EntrantId) -> Option<SlotPosition> {
        [SlotPosition::Player1, SlotPosition::Player2]
            .into_iter()
            .find(|&pos| self.slot(pos).competitor().is_some_and(|c| c.id == entrant))
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Winner's competitor record (completed matches only).
    pub fn winning_competitor(&self) -> Option<&Competitor> {
        let pos = self.position_of(self.winner?)?;
        self.slot(pos).competitor()
    }

    /// The occupant of the slot that did not win (completed matches only).
    pub fn losing_slot(&self) -> Option<&Slot> {
        let pos = self.position_of(self.winner?)?;
        Some(self.slot(pos.other()))
    }
}
