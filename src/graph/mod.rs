//! The struct/pointer graph
//!
//! This module owns every [`Struct`] and [`Variable`] of a debug session:
//! - [`address`]: the [`Address`] identity type
//! - [`registry`]: [`AddressRegistry`], the arena of live structs keyed by address
//! - [`node`]: struct nodes and their fields
//! - [`variable`]: pointer variables (edges) with a bounded target history
//! - [`geometry`]: arrow shapes, bounding boxes and hit-testing
//! - [`delta`]: the [`DeltaBatch`] produced by one execution step
//!
//! # Invariants
//!
//! After every public mutation:
//! - every variable's current target resolves to a live struct
//! - every owned variable's owner is live
//! - every arrow's geometry matches its current endpoints
//!
//! Destroying a struct detaches the variables pointing at it *before* the node is
//! removed, so there is never a moment with a dangling edge.
//!
//! # Placement
//!
//! Newly created structs take the lowest free slot of a fixed grid and free
//! variables the lowest free slot of the left gutter. Positions only change
//! afterwards through [`StructGraph::move_struct`].

pub mod address;
pub mod delta;
pub mod errors;
pub mod geometry;
pub mod node;
pub mod registry;
pub mod variable;

pub use address::Address;
pub use delta::{DeltaBatch, StructSpec, VariableRef, VariableUpdate};
pub use errors::GraphError;
pub use geometry::{ArrowGeometry, ArrowStyle, Point, Rect};
pub use node::{Field, FieldValue, Struct};
pub use registry::AddressRegistry;
pub use variable::{TargetHistory, Variable, VariableKey, DEFAULT_HISTORY_CAPACITY};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Where new structs and free variables are placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Structs per grid row
    pub columns: usize,
    pub column_width: f64,
    pub column_gap: f64,
    pub row_height: f64,
    /// Left edge of the struct grid
    pub origin_x: f64,
    /// Where free variable arrows start
    pub free_anchor_x: f64,
    pub free_anchor_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            columns: 3,
            column_width: 32.0,
            column_gap: 8.0,
            row_height: 10.0,
            origin_x: 20.0,
            free_anchor_x: 12.0,
            free_anchor_gap: 3.0,
        }
    }
}

impl LayoutConfig {
    fn slot_position(&self, slot: usize) -> Point {
        let columns = self.columns.max(1);
        let (row, col) = (slot / columns, slot % columns);
        Point::new(
            self.origin_x + col as f64 * (self.column_width + self.column_gap),
            1.0 + row as f64 * self.row_height,
        )
    }

    fn free_anchor(&self, slot: usize) -> Point {
        Point::new(self.free_anchor_x, 2.0 + slot as f64 * self.free_anchor_gap)
    }
}

/// What one [`StructGraph::apply_delta`] changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub created: usize,
    pub updated: usize,
    pub destroyed: usize,
    /// Variables whose current target differs from before the batch
    pub retargeted: usize,
    /// Variables left dangling after the batch
    pub dangling: usize,
    /// Variables whose arrows changed and need repainting
    pub redrawn: Vec<VariableKey>,
    /// Union of the old and new bounding boxes of every redrawn arrow
    pub dirty_region: Option<Rect>,
}

/// Owner of all structs and variables of a debug session
#[derive(Debug, Clone)]
pub struct StructGraph {
    registry: AddressRegistry,
    variables: BTreeMap<VariableKey, Variable>,
    struct_slots: FxHashMap<Address, usize>,
    anchor_slots: FxHashMap<VariableKey, usize>,
    layout: LayoutConfig,
    history_capacity: usize,
}

impl Default for StructGraph {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), DEFAULT_HISTORY_CAPACITY)
    }
}

impl StructGraph {
    pub fn new(layout: LayoutConfig, history_capacity: usize) -> Self {
        StructGraph {
            registry: AddressRegistry::new(),
            variables: BTreeMap::new(),
            struct_slots: FxHashMap::default(),
            anchor_slots: FxHashMap::default(),
            layout,
            history_capacity,
        }
    }

    pub fn registry(&self) -> &AddressRegistry {
        &self.registry
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn resolve(&self, address: Address) -> Option<&Struct> {
        self.registry.resolve(address)
    }

    /// Live structs in address order
    pub fn structs(&self) -> impl Iterator<Item = &Struct> {
        self.registry.iter()
    }

    /// Variables ordered by key (free variables first)
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variable(&self, key: &VariableKey) -> Option<&Variable> {
        self.variables.get(key)
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn dangling_count(&self) -> usize {
        self.variables.values().filter(|v| v.is_dangling()).count()
    }

    /// Create the struct at `address`, or update its fields in place if it is live.
    ///
    /// Pointer fields become variables owned by the struct. Their targets are
    /// resolved now; a target that is not live leaves the variable dangling.
    pub fn upsert_struct(
        &mut self,
        address: Address,
        type_name: &str,
        fields: Vec<Field>,
    ) -> Result<&Struct, GraphError> {
        self.place_struct(address, type_name, fields)?;
        self.sync_owned_variables(address);
        self.refresh_touching(address);
        self.registry
            .resolve(address)
            .ok_or(GraphError::UnknownStruct(address))
    }

    /// Remove the struct at `address`; unknown addresses are ignored.
    ///
    /// Every variable targeting it is detached first, then the variables it owns
    /// go away with it.
    pub fn destroy_struct(&mut self, address: Address) -> bool {
        if !self.registry.contains(address) {
            return false;
        }
        let affected = self.detach_from(address);
        self.remove_struct_node(address);
        for key in affected {
            self.refresh(&key);
        }
        true
    }

    /// Create or re-target the variable `label` under `owner` (or free when `None`).
    ///
    /// An unresolved target is not an error: the variable becomes dangling.
    pub fn upsert_variable(
        &mut self,
        owner: Option<Address>,
        label: &str,
        target: Option<Address>,
    ) -> Result<&Variable, GraphError> {
        if let Some(owner) = owner {
            if !self.registry.contains(owner) {
                return Err(GraphError::UnknownOwner {
                    owner,
                    label: label.to_string(),
                });
            }
        }
        let key = VariableKey::new(owner, label);
        self.retarget(&key, target);
        self.refresh(&key);
        Ok(&self.variables[&key])
    }

    /// Drop a variable that went out of scope
    pub fn remove_variable(&mut self, key: &VariableKey) -> Option<Variable> {
        self.anchor_slots.remove(key);
        self.variables.remove(key)
    }

    /// Move a struct and recompute every arrow touching it
    pub fn move_struct(&mut self, address: Address, position: Point) -> bool {
        match self.registry.resolve_mut(address) {
            Some(node) => node.set_position(position),
            None => return false,
        }
        self.refresh_touching(address);
        true
    }

    /// Apply one step's changes as a unit.
    ///
    /// The batch is validated against the set of addresses that will be live
    /// afterwards before anything is touched; an invalid batch leaves the graph
    /// exactly as it was.
    pub fn apply_delta(&mut self, batch: &DeltaBatch) -> Result<BatchReport, GraphError> {
        self.validate(batch)?;

        let before_targets: FxHashMap<VariableKey, Option<Address>> = self
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), v.target()))
            .collect();
        let before_shapes: FxHashMap<VariableKey, ArrowGeometry> = self
            .variables
            .iter()
            .map(|(k, v)| (k.clone(), v.geometry().clone()))
            .collect();

        let mut report = BatchReport::default();

        for &addr in &batch.destroyed_addresses {
            if self.registry.contains(addr) {
                self.detach_from(addr);
                self.remove_struct_node(addr);
                report.destroyed += 1;
            }
        }

        for spec in &batch.created_structs {
            if self.place_struct(spec.address, &spec.type_name, spec.fields.clone())? {
                report.created += 1;
            } else {
                report.updated += 1;
            }
        }
        for spec in &batch.created_structs {
            self.sync_owned_variables(spec.address);
        }

        for update in &batch.variable_updates {
            self.retarget(&update.key(), update.target);
        }

        for removed in &batch.removed_variables {
            self.remove_variable(&removed.key());
        }

        self.reconcile_dangling();

        let keys: Vec<VariableKey> = self.variables.keys().cloned().collect();
        for key in &keys {
            self.refresh(key);
        }

        for (key, var) in &self.variables {
            if before_targets.get(key).copied().flatten() != var.target() {
                report.retargeted += 1;
            }
            let old_shape = before_shapes.get(key);
            if old_shape != Some(var.geometry()) {
                let mut region = var.bounding_rect();
                if let Some(old) = old_shape {
                    region = region.union(&old.bounding_rect());
                }
                report.dirty_region = Some(match report.dirty_region {
                    Some(dirty) => dirty.union(&region),
                    None => region,
                });
                report.redrawn.push(key.clone());
            }
        }
        // Removed variables leave their old arrows to erase
        for (key, shape) in &before_shapes {
            if !self.variables.contains_key(key) {
                let region = shape.bounding_rect();
                report.dirty_region = Some(match report.dirty_region {
                    Some(dirty) => dirty.union(&region),
                    None => region,
                });
            }
        }
        report.dangling = self.dangling_count();

        debug!(
            line = batch.new_line,
            created = report.created,
            updated = report.updated,
            destroyed = report.destroyed,
            retargeted = report.retargeted,
            dangling = report.dangling,
            "applied delta batch"
        );
        debug_assert!(self.check_consistency().is_ok());

        Ok(report)
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.registry.clear();
        self.variables.clear();
        self.struct_slots.clear();
        self.anchor_slots.clear();
    }

    /// Topmost variable whose arrow passes within `tolerance` of `point`
    pub fn variable_at(&self, point: Point, tolerance: f64) -> Option<&Variable> {
        self.variables
            .values()
            .rev()
            .find(|v| v.hit_test(point, tolerance))
    }

    pub fn struct_at(&self, point: Point) -> Option<&Struct> {
        self.registry.iter().find(|s| s.bounds().contains(point))
    }

    /// Smallest box enclosing every struct and arrow
    pub fn extent(&self) -> Option<Rect> {
        let boxes = self.registry.iter().map(|s| s.bounds());
        let arrows = self.variables.values().map(|v| v.bounding_rect());
        boxes.chain(arrows).reduce(|a, b| a.union(&b))
    }

    /// Check every graph invariant, describing the first violation found
    pub fn check_consistency(&self) -> Result<(), String> {
        for (key, var) in &self.variables {
            if let Some(owner) = key.owner {
                if !self.registry.contains(owner) {
                    return Err(format!("variable {} has a dead owner", key));
                }
            }
            if let Some(target) = var.target() {
                if !self.registry.contains(target) {
                    return Err(format!("variable {} targets dead struct {}", key, target));
                }
                if var.history().top() != Some(target) {
                    return Err(format!("variable {} target is not its history top", key));
                }
            }
            let mut fresh = var.clone();
            fresh.update_position(self.source_point(var), self.target_bounds(var));
            if fresh.geometry() != var.geometry() {
                return Err(format!("variable {} has stale geometry", key));
            }
        }
        Ok(())
    }

    /// Insert or update a struct node.
    ///
    /// An update drops the variables of pointer fields it removed; every other
    /// owned variable is kept. Returns `true` when the struct was newly created.
    fn place_struct(
        &mut self,
        address: Address,
        type_name: &str,
        fields: Vec<Field>,
    ) -> Result<bool, GraphError> {
        if let Some(node) = self.registry.resolve_mut(address) {
            let before: Vec<String> = node
                .pointer_fields()
                .map(|(name, _)| name.to_string())
                .collect();
            node.update_fields(type_name, fields);
            let dropped: Vec<VariableKey> = before
                .iter()
                .filter(|name| !node.field(name).is_some_and(|f| f.value.is_pointer()))
                .map(|name| VariableKey::field(address, name))
                .collect();
            for key in dropped {
                self.remove_variable(&key);
            }
            return Ok(false);
        }
        let slot = lowest_free(self.struct_slots.values().copied());
        let position = self.layout.slot_position(slot);
        self.registry
            .register(Struct::new(address, type_name.to_string(), fields, position))?;
        self.struct_slots.insert(address, slot);
        Ok(true)
    }

    /// Point the owned variables of `address` at its pointer field values
    fn sync_owned_variables(&mut self, address: Address) {
        let pointers: Vec<(String, Option<Address>)> = match self.registry.resolve(address) {
            Some(node) => node
                .pointer_fields()
                .map(|(name, target)| (name.to_string(), target))
                .collect(),
            None => return,
        };

        for (name, target) in pointers {
            let key = VariableKey::field(address, &name);
            self.retarget(&key, target);
        }
    }

    /// Apply the re-pointing rules to one variable, creating it if needed
    fn retarget(&mut self, key: &VariableKey, target: Option<Address>) {
        if !self.variables.contains_key(key) {
            let anchor = match key.owner {
                Some(_) => Point::default(),
                None => {
                    let slot = lowest_free(self.anchor_slots.values().copied());
                    self.anchor_slots.insert(key.clone(), slot);
                    self.layout.free_anchor(slot)
                }
            };
            self.variables.insert(
                key.clone(),
                Variable::new(key.clone(), anchor, self.history_capacity),
            );
        }
        let live = target.filter(|&addr| self.registry.contains(addr));
        let Some(var) = self.variables.get_mut(key) else {
            return;
        };

        match live {
            Some(t) => match var.target() {
                Some(cur) if cur == t => {}
                None if var.history().top() == Some(t) => {
                    var.reattach();
                }
                Some(cur) if var.history().below_top() == Some(t) => {
                    // Back to the previous target: pop instead of growing the history
                    var.remove_struct(cur);
                }
                _ => var.point_struct(t),
            },
            None => {
                match target {
                    None => {
                        if let Some(cur) = var.target() {
                            var.remove_struct(cur);
                        }
                    }
                    Some(raw) => {
                        warn!(variable = %key, target = %raw, "pointer target is not live");
                    }
                }
                var.detach();
                var.set_raw_address(target);
            }
        }
    }

    /// Detach and purge every reference to `address`, returning the affected variables
    fn detach_from(&mut self, address: Address) -> Vec<VariableKey> {
        let mut affected = Vec::new();
        for (key, var) in self.variables.iter_mut() {
            if var.target() == Some(address) || var.history().contains(address) {
                var.purge_struct(address);
                affected.push(key.clone());
            }
        }
        affected.retain(|k| k.owner != Some(address));
        affected
    }

    /// Unregister a struct and the variables it owns
    fn remove_struct_node(&mut self, address: Address) {
        let owned: Vec<VariableKey> = self
            .variables
            .keys()
            .filter(|k| k.owner == Some(address))
            .cloned()
            .collect();
        for key in owned {
            self.remove_variable(&key);
        }
        self.registry.unregister(address);
        self.struct_slots.remove(&address);
    }

    /// Re-resolve dangling variables whose raw pointer value is now live
    fn reconcile_dangling(&mut self) {
        let pending: Vec<(VariableKey, Address)> = self
            .variables
            .iter()
            .filter(|(_, v)| v.is_dangling())
            .filter_map(|(k, v)| v.raw_address().map(|raw| (k.clone(), raw)))
            .filter(|(_, raw)| self.registry.contains(*raw))
            .collect();
        for (key, raw) in pending {
            self.retarget(&key, Some(raw));
        }
    }

    /// Recompute every arrow that starts or ends at `address`
    fn refresh_touching(&mut self, address: Address) {
        let keys: Vec<VariableKey> = self
            .variables
            .iter()
            .filter(|(k, v)| k.owner == Some(address) || v.target() == Some(address))
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            self.refresh(&key);
        }
    }

    fn refresh(&mut self, key: &VariableKey) {
        let Some(var) = self.variables.get(key) else {
            return;
        };
        let source = self.source_point(var);
        let bounds = self.target_bounds(var);
        if let Some(var) = self.variables.get_mut(key) {
            var.update_position(source, bounds);
        }
    }

    fn source_point(&self, var: &Variable) -> Point {
        let Some(owner) = var.owner().and_then(|o| self.registry.resolve(o)) else {
            return var.anchor();
        };
        owner.field_anchor(var.label()).unwrap_or_else(|| {
            let bounds = owner.bounds();
            Point::new(bounds.right(), bounds.center().y)
        })
    }

    fn target_bounds(&self, var: &Variable) -> Option<Rect> {
        var.target()
            .and_then(|t| self.registry.resolve(t))
            .map(|s| s.bounds())
    }

    fn validate(&self, batch: &DeltaBatch) -> Result<(), GraphError> {
        let destroyed: FxHashSet<Address> = batch.destroyed_addresses.iter().copied().collect();
        let mut created: FxHashSet<Address> = FxHashSet::default();
        for spec in &batch.created_structs {
            if !created.insert(spec.address) {
                return Err(GraphError::DuplicateAddress(spec.address));
            }
        }
        let live_after = |addr: Address| {
            created.contains(&addr) || (self.registry.contains(addr) && !destroyed.contains(&addr))
        };
        for update in &batch.variable_updates {
            if let Some(owner) = update.owner {
                if !live_after(owner) {
                    return Err(GraphError::UnknownOwner {
                        owner,
                        label: update.label.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn lowest_free(used: impl Iterator<Item = usize>) -> usize {
    let used: FxHashSet<usize> = used.collect();
    (0..).find(|slot| !used.contains(slot)).unwrap_or(used.len())
}
