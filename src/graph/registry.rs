//! Address registry: the arena of live structs, keyed by address
//!
//! The registry is the single source of truth for identity. Variables never hold
//! a struct directly; they keep an [`Address`] and resolve it here on demand.

use super::address::Address;
use super::errors::GraphError;
use super::node::Struct;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct AddressRegistry {
    structs: FxHashMap<Address, Struct>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, address: Address) -> Option<&Struct> {
        self.structs.get(&address)
    }

    pub(crate) fn resolve_mut(&mut self, address: Address) -> Option<&mut Struct> {
        self.structs.get_mut(&address)
    }

    /// Register a new struct. An address that is already live must be destroyed first.
    pub fn register(&mut self, node: Struct) -> Result<(), GraphError> {
        let address = node.address();
        if self.structs.contains_key(&address) {
            return Err(GraphError::DuplicateAddress(address));
        }
        self.structs.insert(address, node);
        Ok(())
    }

    /// Remove the struct at `address`, if any
    pub fn unregister(&mut self, address: Address) -> Option<Struct> {
        self.structs.remove(&address)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.structs.contains_key(&address)
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    /// Live addresses in ascending order
    pub fn addresses(&self) -> Vec<Address> {
        let mut addrs: Vec<Address> = self.structs.keys().copied().collect();
        addrs.sort();
        addrs
    }

    /// Live structs in address order
    pub fn iter(&self) -> impl Iterator<Item = &Struct> {
        let mut nodes: Vec<&Struct> = self.structs.values().collect();
        nodes.sort_by_key(|s| s.address());
        nodes.into_iter()
    }

    pub fn clear(&mut self) {
        self.structs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::geometry::Point;

    fn node(raw: u64) -> Struct {
        Struct::new(Address(raw), "struct node".to_string(), Vec::new(), Point::default())
    }

    #[test]
    fn test_register_and_resolve() {
        let mut reg = AddressRegistry::new();
        reg.register(node(0x10)).unwrap();
        assert!(reg.resolve(Address(0x10)).is_some());
        assert!(reg.resolve(Address(0x20)).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let mut reg = AddressRegistry::new();
        reg.register(node(0x10)).unwrap();
        let err = reg.register(node(0x10)).unwrap_err();
        assert_eq!(err, GraphError::DuplicateAddress(Address(0x10)));
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut reg = AddressRegistry::new();
        assert!(reg.unregister(Address(0x10)).is_none());
        reg.register(node(0x10)).unwrap();
        assert!(reg.unregister(Address(0x10)).is_some());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_addresses_sorted() {
        let mut reg = AddressRegistry::new();
        for raw in [0x30, 0x10, 0x20] {
            reg.register(node(raw)).unwrap();
        }
        assert_eq!(reg.addresses(), vec![Address(0x10), Address(0x20), Address(0x30)]);
        let order: Vec<_> = reg.iter().map(|s| s.address()).collect();
        assert_eq!(order, reg.addresses());
    }
}
