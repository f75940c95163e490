//! Memory address identity
//!
//! An [`Address`] is the opaque identity of a block of debugged-program memory.
//! It is written as hex (`0x10`) in traces and on screen, but a bare integer is
//! accepted too. Address `0` is NULL and never names a live struct.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of one block of debugged-program memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "AddressRepr", into = "String")]
pub struct Address(pub u64);

impl Address {
    pub const NULL: Address = Address(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else {
            s.parse::<u64>()
        };
        parsed
            .map(Address)
            .map_err(|e| format!("Invalid address '{}': {}", s, e))
    }
}

impl From<u64> for Address {
    fn from(raw: u64) -> Self {
        Address(raw)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        format!("0x{:x}", addr.0)
    }
}

/// Either spelling an address may take in a trace file
#[derive(Deserialize)]
#[serde(untagged)]
enum AddressRepr {
    Int(u64),
    Text(String),
}

impl TryFrom<AddressRepr> for Address {
    type Error = String;

    fn try_from(repr: AddressRepr) -> Result<Self, Self::Error> {
        match repr {
            AddressRepr::Int(n) => Ok(Address(n)),
            AddressRepr::Text(s) => s.parse(),
        }
    }
}
