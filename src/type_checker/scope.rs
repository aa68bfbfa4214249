//! Lexical scopes and the symbol arena.
//!
//! Scopes are never dropped during a unit: the lowering pass and the
//! `--dump-scopes` output both read the full history after checking.

use std::{collections::HashMap, fmt::Display};

use super::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Index into the lowering pass's table of stack slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageSlot(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub identifier: String,
    pub ty: Type,
    pub kind: SymbolKind,
    /// Absent until the first write.
    pub storage: Option<StorageSlot>,
    pub scope: ScopeId,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub bindings: HashMap<String, SymbolId>,
}

#[derive(Debug, Default)]
pub struct ScopeManager {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    current: Option<ScopeId>,
}

impl ScopeManager {
    pub fn new() -> Self {
        ScopeManager::default()
    }

    /// Opens a child of the current scope and makes it current.
    pub fn enter_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            id,
            parent: self.current,
            bindings: HashMap::new(),
        });
        self.current = Some(id);

        log::trace!("entered scope {} (parent {:?})", id.0, self.scopes[id.0 as usize].parent);
        id
    }

    /// Leaves the current scope, returning it. The parent becomes current.
    ///
    /// Leaving the root leaves no scope current; callers keep enter and exit
    /// balanced.
    pub fn exit_scope(&mut self) -> Option<ScopeId> {
        let exited = self.current?;
        self.current = self.scopes[exited.0 as usize].parent;

        log::trace!("exited scope {}", exited.0);
        Some(exited)
    }

    pub fn current(&self) -> Option<ScopeId> {
        self.current
    }

    /// Adds a variable to the current scope. `None` when the name is already
    /// bound in that exact scope or no scope is open.
    pub fn add_symbol(&mut self, identifier: &str, ty: Type) -> Option<SymbolId> {
        self.add_symbol_of_kind(identifier, ty, SymbolKind::Variable)
    }

    pub fn add_symbol_of_kind(
        &mut self,
        identifier: &str,
        ty: Type,
        kind: SymbolKind,
    ) -> Option<SymbolId> {
        let scope = self.current?;
        if self.scopes[scope.0 as usize].bindings.contains_key(identifier) {
            return None;
        }

        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            identifier: identifier.to_string(),
            ty,
            kind,
            storage: None,
            scope,
        });
        self.scopes[scope.0 as usize]
            .bindings
            .insert(identifier.to_string(), id);

        log::debug!("symbol '{}' added to scope {}", identifier, scope.0);
        Some(id)
    }

    /// Nearest declaration of `identifier`, walking outward from the
    /// current scope.
    pub fn find_symbol(&self, identifier: &str) -> Option<SymbolId> {
        let mut cursor = self.current;

        while let Some(scope_id) = cursor {
            let scope = &self.scopes[scope_id.0 as usize];
            if let Some(symbol) = scope.bindings.get(identifier) {
                return Some(*symbol);
            }
            cursor = scope.parent;
        }

        None
    }

    /// Declaration of `identifier` in the current scope only.
    pub fn find_local(&self, identifier: &str) -> Option<SymbolId> {
        let scope = self.current?;
        self.scopes[scope.0 as usize]
            .bindings
            .get(identifier)
            .copied()
    }

    /// Whether `scope` is `ancestor` or nested somewhere inside it.
    pub fn is_within(&self, scope: ScopeId, ancestor: ScopeId) -> bool {
        let mut cursor = Some(scope);

        while let Some(scope_id) = cursor {
            if scope_id == ancestor {
                return true;
            }
            cursor = self.scopes.get(scope_id.0 as usize).and_then(|s| s.parent);
        }

        false
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

impl Display for ScopeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for scope in self.scopes.iter() {
            match scope.parent {
                Some(parent) => writeln!(f, "scope {} (parent {})", scope.id.0, parent.0)?,
                None => writeln!(f, "scope {} (root)", scope.id.0)?,
            }

            let mut bindings = scope.bindings.iter().collect::<Vec<_>>();
            bindings.sort_by_key(|(_, symbol)| **symbol);

            for (name, symbol) in bindings {
                writeln!(f, "  {}: {}", name, self.symbol(*symbol).ty)?;
            }
        }

        Ok(())
    }
}
