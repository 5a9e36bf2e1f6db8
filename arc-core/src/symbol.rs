//! Symbol table: `label -> address` for labels, `name -> value` for
//! `.equ` constants. Both live in the same map since pass 2 treats them
//! identically — a resolved integer substituted into an expression.
//!
//! Mirrors the insertion-order + name->index split the teacher's
//! `LabelTable` (`asm.rs`) uses for its string table, generalized to
//! store the resolved value alongside the name instead of deferring it
//! to a second pass over a parallel `Vec`.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    order: Vec<String>,
    values: HashMap<String, i64>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            order: Vec::new(),
            values: HashMap::new(),
        }
    }

    /// Defines or redefines `name`. Redefinition keeps the original
    /// insertion position (this only matters for listing order; the
    /// assembler itself doesn't forbid redefinition since `.equ` inside
    /// a loop-unrolled macro-like block is a normal pattern).
    pub fn define(&mut self, name: String, value: i64) {
        if !self.values.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// `(name, value)` pairs in definition order, for listing.
    pub fn iter_in_order(&self) -> impl Iterator<Item = (&str, i64)> {
        self.order
            .iter()
            .map(move |name| (name.as_str(), self.values[name]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter_in_order() {
            writeln!(f, "{name}\t{value:08x}")?;
        }
        Ok(())
    }
}
