// This module provides arena-based compilation session management using the bumpalo crate.
// CompilationSession is the per-compilation-unit hub: it owns a reference to the arena
// that backs short-lived scratch structures (for example the node mapping built while a
// template is copied into a graph) and it accumulates statistics about what the lowering
// passes did. Sessions are single-threaded by construction (interior mutability through
// RefCell); concurrent compilations each create their own session and share nothing but
// the template cache. SessionStats counts lowered and skipped nodes, template
// instantiations and a per-operation breakdown, and renders as a human-readable report.

//! Arena-based compilation session management.
//!
//! All scratch data created while rewriting a graph is tied to the session
//! lifetime, so it is released in one go when the compilation unit finishes.

use bumpalo::Bump;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// Hash map whose storage lives in the session arena.
pub type ArenaMap<'arena, K, V> = hashbrown::HashMap<K, V, hashbrown::DefaultHashBuilder, &'arena Bump>;

/// Arena-based compilation session.
///
/// One session is created per compilation unit. It is deliberately `!Sync`:
/// the graph it accompanies is rewritten by a single pass at a time.
pub struct CompilationSession<'arena> {
    /// Arena allocator for compilation scratch objects.
    arena: &'arena Bump,

    /// Session statistics for debugging and optimization.
    stats: RefCell<SessionStats>,

    /// Name of the unit being compiled.
    current_unit: RefCell<Option<String>>,
}

impl<'arena> CompilationSession<'arena> {
    /// Create a new compilation session with the given arena.
    pub fn new(arena: &'arena Bump) -> Self {
        Self {
            arena,
            stats: RefCell::new(SessionStats::default()),
            current_unit: RefCell::new(None),
        }
    }

    /// Get access to the arena allocator.
    pub fn arena(&self) -> &'arena Bump {
        self.arena
    }

    /// Create an empty hash map backed by the session arena.
    pub fn scratch_map<K, V>(&self) -> ArenaMap<'arena, K, V> {
        hashbrown::HashMap::new_in(self.arena)
    }

    /// Set the unit being compiled.
    pub fn set_current_unit(&self, name: &str) {
        *self.current_unit.borrow_mut() = Some(name.to_string());
    }

    /// Name of the unit being compiled, if any.
    pub fn current_unit(&self) -> Option<String> {
        self.current_unit.borrow().clone()
    }

    /// Record that a node was replaced by a lowered subgraph.
    pub fn record_node_lowered(&self, operation: &str) {
        let mut stats = self.stats.borrow_mut();
        stats.nodes_lowered += 1;
        *stats
            .operation_counts
            .entry(operation.to_string())
            .or_insert(0) += 1;
    }

    /// Record that a node was visited but left untouched.
    pub fn record_node_skipped(&self) {
        self.stats.borrow_mut().nodes_skipped += 1;
    }

    /// Record a template copy into the graph.
    pub fn record_template_instantiated(&self, nodes_created: usize) {
        let mut stats = self.stats.borrow_mut();
        stats.templates_instantiated += 1;
        stats.nodes_created += nodes_created;
    }

    /// Get compilation statistics.
    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }
}

/// Compilation session statistics.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    /// Nodes replaced by a lowered subgraph.
    pub nodes_lowered: usize,

    /// Nodes visited but not rewritten (already safe or no check required).
    pub nodes_skipped: usize,

    /// Number of template instantiations.
    pub templates_instantiated: usize,

    /// Nodes added to graphs by instantiations.
    pub nodes_created: usize,

    /// Count of lowered nodes per operation.
    pub operation_counts: HashMap<String, usize>,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lowering Session Statistics:")?;
        writeln!(f, "  Nodes lowered: {}", self.nodes_lowered)?;
        writeln!(f, "  Nodes skipped: {}", self.nodes_skipped)?;
        writeln!(f, "  Templates instantiated: {}", self.templates_instantiated)?;
        writeln!(f, "  Nodes created: {}", self.nodes_created)?;

        if !self.operation_counts.is_empty() {
            writeln!(f, "  Operation breakdown:")?;
            let mut sorted: Vec<_> = self.operation_counts.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

            for (operation, count) in sorted {
                writeln!(f, "    {}: {}", operation, count)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compilation_session_creation() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);

        let stats = session.stats();
        assert_eq!(stats.nodes_lowered, 0);
        assert_eq!(stats.templates_instantiated, 0);
        assert!(session.current_unit().is_none());
    }

    #[test]
    fn test_scratch_map_uses_arena() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);
        let before = arena.allocated_bytes();

        let mut map = session.scratch_map::<u32, u32>();
        for i in 0..64 {
            map.insert(i, i * 2);
        }
        assert_eq!(map.get(&10), Some(&20));
        assert!(arena.allocated_bytes() > before);
    }

    #[test]
    fn test_session_statistics() {
        let arena = Bump::new();
        let session = CompilationSession::new(&arena);

        session.record_node_lowered("sdiv");
        session.record_node_lowered("urem");
        session.record_node_lowered("sdiv");
        session.record_node_skipped();
        session.record_template_instantiated(4);

        let stats = session.stats();
        assert_eq!(stats.nodes_lowered, 3);
        assert_eq!(stats.nodes_skipped, 1);
        assert_eq!(stats.templates_instantiated, 1);
        assert_eq!(stats.nodes_created, 4);
        assert_eq!(stats.operation_counts["sdiv"], 2);

        let output = format!("{}", stats);
        assert!(output.contains("Nodes lowered: 3"));
        assert!(output.contains("sdiv: 2"));
    }
}
