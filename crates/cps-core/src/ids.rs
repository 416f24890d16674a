//! Strongly typed identifier wrappers.
//!
//! Agents are addressed by name on the bus but by a dense `AgentId` index
//! everywhere inside the core, so the scheduler, tracker and agent table can
//! use the id directly as a `Vec` index or map key.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of an agent in the coordinator's agent table.
    pub struct AgentId(u32);
}

typed_id! {
    /// Sequence number handed out by the reply tracker for every request.
    ///
    /// Echoed back in structured completion notices so a late reply to an
    /// abandoned request cannot clear the flag of a newer one.
    pub struct CorrelationId(u64);
}

impl CorrelationId {
    /// The id following `self`.
    #[inline]
    pub fn next(self) -> CorrelationId {
        CorrelationId(self.0 + 1)
    }
}
