//! Fan-in join over a fixed number of slots

/// Counts down a fixed set of slots and reports completion exactly once
///
/// Each slot can be settled once; settling it again is ignored. The call that
/// settles the last outstanding slot is the only one that returns `true`.
#[derive(Debug, Clone)]
pub struct CompletionJoin {
    settled: Vec<bool>,
    outstanding: usize,
    fired: bool,
}

impl CompletionJoin {
    /// Join over `slots` slots
    ///
    /// A join with no slots is complete from the start and never fires.
    pub fn new(slots: usize) -> Self {
        Self {
            settled: vec![false; slots],
            outstanding: slots,
            fired: slots == 0,
        }
    }

    /// Settle one slot, returning `true` if this completed the join
    pub fn settle(&mut self, slot: usize) -> bool {
        match self.settled.get_mut(slot) {
            Some(settled) if !*settled => *settled = true,
            _ => return false,
        }
        self.outstanding -= 1;

        if self.outstanding == 0 && !self.fired {
            self.fired = true;
            return true;
        }
        false
    }

    /// Whether a slot has settled
    pub fn is_settled(&self, slot: usize) -> bool {
        self.settled.get(slot).copied().unwrap_or(false)
    }

    /// Whether every slot has settled
    pub fn is_complete(&self) -> bool {
        self.outstanding == 0
    }

    /// Slots still waiting
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Total number of slots
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    /// Whether the join has no slots
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_on_last_slot_in_any_order() {
        let mut join = CompletionJoin::new(3);

        assert!(!join.settle(2));
        assert!(!join.settle(0));
        assert_eq!(join.outstanding(), 1);
        assert!(join.settle(1));

        assert!(join.is_complete());
        assert!(!join.settle(1));
    }

    #[test]
    fn test_duplicate_and_out_of_range_settles_are_ignored() {
        let mut join = CompletionJoin::new(2);

        assert!(!join.settle(0));
        assert!(!join.settle(0));
        assert!(!join.settle(7));

        assert_eq!(join.outstanding(), 1);
        assert!(join.is_settled(0));
        assert!(!join.is_settled(1));
        assert!(join.settle(1));
    }

    #[test]
    fn test_empty_join_is_complete() {
        let mut join = CompletionJoin::new(0);
        assert!(join.is_complete());
        assert!(join.is_empty());
        assert!(!join.settle(0));
    }
}
