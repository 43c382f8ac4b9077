//! Escape Core: stage progression and contribution ledger
//!
//! Pure functions over plain data. Nothing in this crate performs I/O; the
//! codec at the persistence boundary is where untrusted JSON gets normalized.

pub mod contribution;
pub mod data_model;
pub mod error;
pub mod normalize;
pub mod progression;
pub mod scene;

pub use contribution::record_contribution;
pub use data_model::{decode, encode, ProgressKey, StoredProgress, TeamEscapeProgress};
pub use error::EscapeError;
pub use progression::{advance, AdvanceInput, AdvanceOutcome};
pub use scene::{ContributionLedger, SceneState, StageLedger};
