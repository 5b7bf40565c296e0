//! Utility types and helpers for the actor system

pub mod ids;
pub mod serde_helpers;

pub use ids::{generate_child_name, ActorId, MessageId};
pub use serde_helpers::duration_serde;
