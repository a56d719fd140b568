//! Bracket business logic: seeding, graph construction, advancement, completion.
//! Everything here is pure over in-memory values; persistence lives in `engine`.

pub mod advancement;
pub mod builder;
pub mod completion;
pub mod seeding;

pub use advancement::{propagate, record_result, MatchGraph, RecordedResult};
pub use builder::{build_bracket, round_label, BracketOptions};
pub use completion::{check_completion, CompletionReport};
pub use seeding::{
    assign_seeds, seed_positions, ByePolicy, PairingMode, SeedSlot, SeededList, SeedingConfig,
    TeamRank,
};
