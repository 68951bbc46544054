//! Conversation layer: session state and per-turn processing.

pub mod assistant;
pub mod session;
pub mod store;

pub use assistant::{ChatAssistant, FAILURE_MARKER, TurnOutcome};
pub use session::{Session, Turn};
pub use store::SessionStore;
