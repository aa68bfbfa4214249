use std::collections::HashMap;

use crate::ast::ast::NodeId;

use super::scope::SymbolId;

/// Which symbol each name-bearing node resolved to.
///
/// Filled by the checker, read by the lowering pass. A node is bound once.
#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: HashMap<NodeId, SymbolId>,
}

impl BindingTable {
    pub fn new() -> Self {
        BindingTable::default()
    }

    pub fn bind(&mut self, node: NodeId, symbol: SymbolId) {
        let previous = self.bindings.insert(node, symbol);
        debug_assert!(
            previous.is_none() || previous == Some(symbol),
            "node {} bound twice",
            node
        );
    }

    pub fn lookup(&self, node: NodeId) -> Option<SymbolId> {
        self.bindings.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
