mod state;

pub use self::state::{BodyStateProvider, RigidBodyState, SharedBodyState};

use std::fmt;

/// One of the two attachment slots of a two-body constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodySlot {
    /// Slot 0, filled by the first attachment
    First,

    /// Slot 1, filled by the second attachment
    Second,
}

impl BodySlot {
    /// Returns the slot index (0 or 1)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            BodySlot::First => 0,
            BodySlot::Second => 1,
        }
    }

    /// Returns the slot for an index, or `None` past the second slot
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(BodySlot::First),
            1 => Some(BodySlot::Second),
            _ => None,
        }
    }
}

impl fmt::Display for BodySlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BodySlot::First => write!(f, "body 1"),
            BodySlot::Second => write!(f, "body 2"),
        }
    }
}
