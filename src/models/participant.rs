//! Participant, Entrant (the seedable unit) and Competitor (a slot occupant).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (used in seeding and partner lookups).
pub type ParticipantId = Uuid;

/// Unique identifier for an entrant: a single participant's id, or the
/// first-listed member's id for a Team-First pair.
pub type EntrantId = Uuid;

/// A registered player. Immutable once the bracket is built.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// Doubles partner; only read in Team-First mode.
    #[serde(default)]
    pub partner_id: Option<ParticipantId>,
    /// Pre-assigned rank (1 = best). Unranked participants seed after ranked ones.
    #[serde(default)]
    pub rank: Option<u32>,
    /// Rank agreed for this participant's doubles pair, used with `TeamRank::Explicit`.
    #[serde(default)]
    pub team_rank: Option<u32>,
}

impl Participant {
    /// Create an unranked participant without a partner.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            partner_id: None,
            rank: None,
            team_rank: None,
        }
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn with_team_rank(mut self, team_rank: u32) -> Self {
        self.team_rank = Some(team_rank);
        self
    }

    pub fn with_partner(mut self, partner_id: ParticipantId) -> Self {
        self.partner_id = Some(partner_id);
        self
    }
}

/// One seed entity: a single participant, or a doubles team treated as one unit downstream.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub id: EntrantId,
    pub name: String,
    /// Participant ids behind this entrant (1 for singles, 2 for a team).
    pub members: Vec<ParticipantId>,
    pub rank: Option<u32>,
}

impl Entrant {
    pub fn single(p: &Participant) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            members: vec![p.id],
            rank: p.rank,
        }
    }

    pub fn is_team(&self) -> bool {
        self.members.len() > 1
    }
}

/// An entrant with its final seed number (1..N).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeededEntrant {
    pub seed: u32,
    pub entrant: Entrant,
}

/// What a filled match slot holds: identity, display name and seed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: EntrantId,
    pub name: String,
    pub seed: u32,
}

impl From<&SeededEntrant> for Competitor {
    fn from(s: &SeededEntrant) -> Self {
        Self {
            id: s.entrant.id,
            name: s.entrant.name.clone(),
            seed: s.seed,
        }
    }
}
