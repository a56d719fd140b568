//! Single-elimination bracket engine: seeding, match-graph construction, and
//! transactional advancement of results through the graph.

pub mod collab;
pub mod config;
pub mod engine;
pub mod logic;
pub mod models;
pub mod service;
pub mod store;

pub use collab::{
    AccessDecision, Action, AllowAll, Authorizer, Caller, EngineEvent, LogNotifier, MatchCompleted,
    Notifier, NotifyError,
};
pub use config::{EngineConfig, ServerConfig};
pub use engine::{Advancement, AdvancementEngine, BracketBuilder, CompletionCommit, CompletionDetector};
pub use logic::{
    assign_seeds, build_bracket, check_completion, BracketOptions, ByePolicy, CompletionReport,
    PairingMode, SeedSlot, SeededList, SeedingConfig, TeamRank,
};
pub use models::{
    ApiResponse, Bracket, BracketId, BracketStatus, BracketView, Competitor, EngineError,
    EngineResult, Entrant, EntrantId, ErrorCode, Match, MatchId, MatchKind, MatchLink, MatchStatus,
    Participant, ParticipantId, Ranking, SeededEntrant, Slot, SlotPosition,
};
pub use service::{BracketService, BuildBracketRequest, ReportOutcome, ReportResultRequest};
pub use store::{DocumentStore, MemoryStore, StoreError};
