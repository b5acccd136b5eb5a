//! Round-robin cursors for example lists

use std::collections::HashMap;

/// Per-location round-robin positions.
///
/// Locations are JSON pointers into the example. The registry is owned by
/// whoever wants rotation to persist (a CLI session, a test), and the
/// example data itself is never modified.
#[derive(Debug, Clone, Default)]
pub struct CursorRegistry {
    positions: HashMap<String, usize>,
}

impl CursorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next position for a list of `len` items at `location`
    /// and moves the cursor on. `None` for an empty list.
    pub fn advance(&mut self, location: &str, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let position = self.positions.entry(location.to_string()).or_insert(0);
        let current = *position % len;
        *position = (current + 1) % len;
        Some(current)
    }

    /// Current position at `location` without advancing
    pub fn peek(&self, location: &str) -> usize {
        self.positions.get(location).copied().unwrap_or(0)
    }

    /// Forgets every cursor
    pub fn reset(&mut self) {
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
