//! Data structures for the bracket: participants, matches, bracket aggregate, errors.

mod bracket;
mod error;
mod game;
mod participant;

pub use bracket::{Bracket, BracketId, BracketStatus, BracketView, Ranking};
pub use error::{ApiResponse, EngineError, EngineResult, ErrorCode};
pub use game::{Match, MatchId, MatchKind, MatchLink, MatchStatus, Slot, SlotPosition};
pub use participant::{Competitor, Entrant, EntrantId, Participant, ParticipantId, SeededEntrant};
