//! Pointer variables: the edges of the struct graph
//!
//! A [`Variable`] is a pointer-typed value, either a field of a struct (it has an
//! owner) or a free local pointer. It holds its targets by [`Address`] only; the
//! graph resolves them through the registry whenever they are needed.
//!
//! # Target history
//!
//! Each re-point pushes onto a bounded [`TargetHistory`]. Removing the current
//! target falls back to the entry below it, which is how stepping backward
//! restores an earlier pointer value without asking the execution engine again.
//! When the history is full the oldest entry is evicted.

use super::address::Address;
use super::geometry::{ArrowGeometry, Endpoint, Point, Rect};
use std::collections::VecDeque;
use std::fmt;
use tracing::trace;

/// Default bound on a variable's target history
pub const DEFAULT_HISTORY_CAPACITY: usize = 16;

/// Identity of a variable: its owner (if any) and its source identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableKey {
    pub owner: Option<Address>,
    pub label: String,
}

impl VariableKey {
    pub fn new(owner: Option<Address>, label: &str) -> Self {
        VariableKey {
            owner,
            label: label.to_string(),
        }
    }

    pub fn free(label: &str) -> Self {
        Self::new(None, label)
    }

    pub fn field(owner: Address, label: &str) -> Self {
        Self::new(Some(owner), label)
    }
}

impl fmt::Display for VariableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            Some(owner) => write!(f, "{}->{}", owner, self.label),
            None => write!(f, "{}", self.label),
        }
    }
}

/// Bounded stack of structs a variable has pointed to, most recent last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHistory {
    entries: VecDeque<Address>,
    capacity: usize,
}

impl TargetHistory {
    pub fn new(capacity: usize) -> Self {
        TargetHistory {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, addr: Address) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(addr);
    }

    /// Remove the most recent occurrence of `addr`
    pub fn remove(&mut self, addr: Address) -> bool {
        match self.entries.iter().rposition(|&a| a == addr) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove every occurrence of `addr`
    pub fn purge(&mut self, addr: Address) -> usize {
        let before = self.entries.len();
        self.entries.retain(|&a| a != addr);
        before - self.entries.len()
    }

    pub fn top(&self) -> Option<Address> {
        self.entries.back().copied()
    }

    /// The entry just below the top
    pub fn below_top(&self) -> Option<Address> {
        let len = self.entries.len();
        if len >= 2 {
            self.entries.get(len - 2).copied()
        } else {
            None
        }
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.entries.contains(&addr)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries.iter().copied()
    }
}

/// A pointer value drawn as an arrow from its owner (or a free anchor) to its target
#[derive(Debug, Clone)]
pub struct Variable {
    key: VariableKey,
    history: TargetHistory,
    /// Current target; either `None` or the top of `history`
    target: Option<Address>,
    /// Raw pointer value last reported by the program, resolved or not
    raw_address: Option<Address>,
    /// Where a free variable's arrow starts
    anchor: Point,
    geometry: ArrowGeometry,
}

impl Variable {
    pub fn new(key: VariableKey, anchor: Point, history_capacity: usize) -> Self {
        Variable {
            key,
            history: TargetHistory::new(history_capacity),
            target: None,
            raw_address: None,
            anchor,
            geometry: ArrowGeometry::compute(anchor, Endpoint::Dangling),
        }
    }

    pub fn key(&self) -> &VariableKey {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.key.label
    }

    pub fn owner(&self) -> Option<Address> {
        self.key.owner
    }

    pub fn target(&self) -> Option<Address> {
        self.target
    }

    pub fn raw_address(&self) -> Option<Address> {
        self.raw_address
    }

    pub(crate) fn set_raw_address(&mut self, raw: Option<Address>) {
        self.raw_address = raw;
    }

    pub fn is_dangling(&self) -> bool {
        self.target.is_none()
    }

    pub fn is_self_reference(&self) -> bool {
        self.target.is_some() && self.target == self.key.owner
    }

    pub fn history(&self) -> &TargetHistory {
        &self.history
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn geometry(&self) -> &ArrowGeometry {
        &self.geometry
    }

    /// Re-target to `target`, remembering it on the history stack.
    ///
    /// Geometry is stale until the next [`Variable::update_position`].
    pub fn point_struct(&mut self, target: Address) {
        self.history.push(target);
        self.target = Some(target);
        self.raw_address = Some(target);
    }

    /// Forget `target`; if it was current, fall back to the previous history entry
    pub fn remove_struct(&mut self, target: Address) {
        let was_current = self.target == Some(target);
        self.history.remove(target);
        if was_current {
            self.target = self.history.top();
            self.raw_address = self.target;
        }
    }

    /// Drop every history entry for `target` (it no longer exists)
    pub(crate) fn purge_struct(&mut self, target: Address) {
        self.history.purge(target);
        if self.target == Some(target) {
            self.target = None;
        }
    }

    /// Point at nothing while keeping the history
    pub fn detach(&mut self) {
        self.target = None;
    }

    /// Point back at the top of the history after a detach
    pub(crate) fn reattach(&mut self) -> bool {
        match self.history.top() {
            Some(top) if self.target.is_none() => {
                self.target = Some(top);
                self.raw_address = Some(top);
                true
            }
            _ => false,
        }
    }

    /// Recompute the arrow from the source anchor and the target's box.
    ///
    /// This is the only place geometry changes. `target_bounds` must be the bounds
    /// of the struct at [`Variable::target`], or `None` when dangling.
    pub fn update_position(&mut self, source: Point, target_bounds: Option<Rect>) {
        let end = match (self.target, target_bounds) {
            (Some(_), Some(bounds)) if self.is_self_reference() => Endpoint::SelfLoop(bounds),
            (Some(_), Some(bounds)) => Endpoint::Struct(bounds),
            _ => Endpoint::Dangling,
        };
        self.geometry = ArrowGeometry::compute(source, end);
        trace!(variable = %self.key, style = ?self.geometry.style, "arrow recomputed");
    }

    pub fn bounding_rect(&self) -> Rect {
        self.geometry.bounding_rect()
    }

    pub fn hit_test(&self, p: Point, tolerance: f64) -> bool {
        self.geometry.hit_test(p, tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::geometry::ArrowStyle;

    fn var() -> Variable {
        Variable::new(VariableKey::free("p"), Point::new(0.0, 0.0), 4)
    }

    #[test]
    fn test_point_then_remove_restores_previous() {
        let mut v = var();
        v.point_struct(Address(0x10));
        v.point_struct(Address(0x20));
        v.remove_struct(Address(0x20));
        assert_eq!(v.target(), Some(Address(0x10)));
        v.remove_struct(Address(0x10));
        assert_eq!(v.target(), None);
        assert!(v.is_dangling());
    }

    #[test]
    fn test_remove_non_current_keeps_target() {
        let mut v = var();
        v.point_struct(Address(0x10));
        v.point_struct(Address(0x20));
        v.remove_struct(Address(0x10));
        assert_eq!(v.target(), Some(Address(0x20)));
        assert_eq!(v.history().len(), 1);
    }

    #[test]
    fn test_repeated_target_pops_one_occurrence() {
        let mut v = var();
        v.point_struct(Address(0x10));
        v.point_struct(Address(0x10));
        v.remove_struct(Address(0x10));
        assert_eq!(v.target(), Some(Address(0x10)));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut v = var();
        for raw in 1..=6 {
            v.point_struct(Address(raw));
        }
        assert_eq!(v.history().len(), 4);
        assert_eq!(v.history().iter().collect::<Vec<_>>(), vec![
            Address(3),
            Address(4),
            Address(5),
            Address(6)
        ]);
    }

    #[test]
    fn test_detach_and_reattach() {
        let mut v = var();
        v.point_struct(Address(0x10));
        v.detach();
        assert!(v.is_dangling());
        assert!(v.reattach());
        assert_eq!(v.target(), Some(Address(0x10)));
        assert!(!v.reattach());
    }

    #[test]
    fn test_purge_clears_all_occurrences() {
        let mut v = var();
        v.point_struct(Address(0x10));
        v.point_struct(Address(0x20));
        v.point_struct(Address(0x10));
        v.purge_struct(Address(0x10));
        assert_eq!(v.target(), None);
        assert_eq!(v.history().iter().collect::<Vec<_>>(), vec![Address(0x20)]);
    }

    #[test]
    fn test_update_position_is_idempotent() {
        let mut v = var();
        v.point_struct(Address(0x10));
        let bounds = Rect::new(10.0, 0.0, 8.0, 4.0);
        v.update_position(Point::new(0.0, 2.0), Some(bounds));
        let first = v.geometry().clone();
        v.update_position(Point::new(0.0, 2.0), Some(bounds));
        assert_eq!(&first, v.geometry());
        assert_eq!(first.style, ArrowStyle::Solid);
    }

    #[test]
    fn test_self_reference_renders_loop() {
        let owner = Address(0x10);
        let mut v = Variable::new(VariableKey::field(owner, "next"), Point::default(), 4);
        v.point_struct(owner);
        assert!(v.is_self_reference());
        let bounds = Rect::new(0.0, 0.0, 18.0, 6.0);
        v.update_position(Point::new(18.0, 4.5), Some(bounds));
        assert_eq!(v.geometry().style, ArrowStyle::SelfLoop);
        assert!(v.geometry().length() > 0.0);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(VariableKey::free("head").to_string(), "head");
        assert_eq!(
            VariableKey::field(Address(0x10), "next").to_string(),
            "0x00000010->next"
        );
    }
}
