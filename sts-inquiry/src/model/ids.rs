//! Identifier newtypes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Station id, assigned by the landscape source and stable across refreshes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Aid(pub u32);

/// Region id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rid(pub u32);

/// Super region id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Urid(pub u32);

/// Number of parallel server instances occupancy is tracked against.
pub const N_INSTANCES: usize = 2;

/// A server instance, numbered from 1.
///
/// Construction is checked so that occupancy lookups never index past
/// [`N_INSTANCES`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Instance(u8);

/// All instances in ascending order.
pub const INSTANCES: [Instance; N_INSTANCES] = [Instance(1), Instance(2)];

impl Instance {
    /// Create an instance from its 1-based number.
    ///
    /// Returns `None` if the number is outside `1..=N_INSTANCES`.
    pub fn new(number: u8) -> Option<Self> {
        if (1..=N_INSTANCES as u8).contains(&number) {
            Some(Self(number))
        } else {
            None
        }
    }

    /// The 1-based instance number.
    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based slot index into per-instance arrays.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for Instance {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Instance::new(value).ok_or_else(|| format!("instance {} out of range", value))
    }
}

impl From<Instance> for u8 {
    fn from(instance: Instance) -> Self {
        instance.0
    }
}

impl FromStr for Instance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid instance '{}'", s))?;
        Instance::try_from(number)
    }
}

macro_rules! impl_id_display {
    ($($ty:ident),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

impl_id_display!(Aid, Rid, Urid, Instance);
