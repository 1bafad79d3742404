//! Element id generation
//!
//! Graph operations never read the clock: fresh ids come from an injected
//! generator so edits stay deterministic under test.

use uuid::Uuid;

/// Source of fresh element ids
///
/// Implementations only need to be unique for the session; the graph model
/// still skips any candidate that is already in use.
pub trait IdGenerator {
    /// Produce a new id beginning with `prefix` (e.g. `"p"` for processes)
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Monotonic counter ids: `e-1`, `p-2`, `f-3`, ...
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    issued: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue numbering after `issued` ids
    pub fn starting_after(issued: u64) -> Self {
        Self { issued }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, prefix: &str) -> String {
        self.issued += 1;
        format!("{}-{}", prefix, self.issued)
    }
}

/// Random ids: `p-<uuid v4>`
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids_are_monotonic() {
        let mut ids = SequentialIds::new();
        assert_eq!(ids.next_id("e"), "e-1");
        assert_eq!(ids.next_id("p"), "p-2");
        assert_eq!(ids.next_id("f"), "f-3");
    }

    #[test]
    fn test_sequential_ids_resume() {
        let mut ids = SequentialIds::starting_after(41);
        assert_eq!(ids.next_id("s"), "s-42");
    }

    #[test]
    fn test_uuid_ids_are_prefixed_and_distinct() {
        let mut ids = UuidIds;
        let a = ids.next_id("f");
        let b = ids.next_id("f");
        assert!(a.starts_with("f-"));
        assert_ne!(a, b);
    }
}
