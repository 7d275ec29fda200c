use std::collections::BTreeSet;

use crate::{OperationId, RemoteOperation};

/// Ticker changes needed to match the latest operation list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickerDiff {
    pub start: Vec<OperationId>,
    pub stop: Vec<OperationId>,
}

/// Operation ids whose elapsed-time display is currently ticking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickerSet {
    active: BTreeSet<OperationId>,
}

impl TickerSet {
    /// Running operations with a start time tick; everything else stops.
    pub fn sync(&mut self, operations: &[RemoteOperation]) -> TickerDiff {
        let wanted: BTreeSet<OperationId> = operations
            .iter()
            .filter(|operation| operation.is_running() && operation.start_ms.is_some())
            .map(|operation| operation.id.clone())
            .collect();

        let diff = TickerDiff {
            start: wanted.difference(&self.active).cloned().collect(),
            stop: self.active.difference(&wanted).cloned().collect(),
        };
        self.active = wanted;
        diff
    }

    pub fn is_ticking(&self, operation_id: &str) -> bool {
        self.active.contains(operation_id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
