//! Identifier generation for runs and conversation threads.
//!
//! Ids are UUIDv4 with a short purpose prefix (`run-`, `thread-`) so log
//! lines and session maps stay greppable without a lookup table.

use uuid::Uuid;

/// Generates prefixed unique identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Unique id for one graph invocation, e.g.
    /// `run-7f9c0a1e-5b3d-4d9e-9c1f-2a6b8d4e0f13`.
    #[must_use]
    pub fn generate_run_id(&self) -> String {
        format!("run-{}", Uuid::new_v4())
    }

    /// Unique id for a conversation thread.
    #[must_use]
    pub fn generate_thread_id(&self) -> String {
        format!("thread-{}", Uuid::new_v4())
    }
}
