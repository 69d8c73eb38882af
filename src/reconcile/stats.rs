//! Per-call reconcile statistics.

bitflags::bitflags! {
    /// Kinds of host mutation performed during one reconcile call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mutations: u8 {
        const NONE = 0;
        const CREATE = 1 << 0;
        const INSERT = 1 << 1;
        const MOVE = 1 << 2;
        const REMOVE = 1 << 3;
        const TEXT = 1 << 4;
        const PROPS = 1 << 5;
    }
}

/// Counters collected by the reconciler during one call.
///
/// `created` counts host nodes (a materialized subtree of three nodes counts
/// three). `inserted` counts subtree roots attached to a parent, `moved` counts
/// already mounted nodes that were repositioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchStats {
    pub created: usize,
    pub patched: usize,
    pub inserted: usize,
    pub moved: usize,
    pub removed: usize,
    pub text_updates: usize,
    pub prop_updates: usize,
    pub key_index_builds: usize,
    pub mutations: Mutations,
}

impl PatchStats {
    /// True if no host mutation happened.
    pub fn is_noop(&self) -> bool {
        self.mutations.is_empty()
    }

    pub(crate) fn record(&mut self, kind: Mutations) {
        self.mutations |= kind;
        if kind.contains(Mutations::CREATE) {
            self.created += 1;
        }
        if kind.contains(Mutations::INSERT) {
            self.inserted += 1;
        }
        if kind.contains(Mutations::MOVE) {
            self.moved += 1;
        }
        if kind.contains(Mutations::REMOVE) {
            self.removed += 1;
        }
        if kind.contains(Mutations::TEXT) {
            self.text_updates += 1;
        }
        if kind.contains(Mutations::PROPS) {
            self.prop_updates += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_noop() {
        assert!(PatchStats::default().is_noop());
    }

    #[test]
    fn test_record() {
        let mut stats = PatchStats::default();
        stats.record(Mutations::CREATE);
        stats.record(Mutations::CREATE);
        stats.record(Mutations::MOVE);
        assert_eq!(stats.created, 2);
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.mutations, Mutations::CREATE | Mutations::MOVE);
        assert!(!stats.is_noop());
    }

    #[test]
    fn test_patched_alone_is_noop() {
        let stats = PatchStats {
            patched: 4,
            key_index_builds: 1,
            ..Default::default()
        };
        assert!(stats.is_noop());
    }
}
