//! The attack: recovery loop, state machine and progress events.
//!
//! ```text
//! idle ──run──▶ running ──all bytes──▶ complete
//!   ▲              │ └────failure────▶ error
//!   └──cancelled───┘
//! complete / error ──reset──▶ idle
//! ```

mod engine;
mod event;
mod state;

pub use engine::{build_candidate, AttackEngine, BestCandidate, RunOutcome};
pub use event::AttackEvent;
pub use state::RecoveryState;
