//! Cross-boundary object handles.

use std::fmt;

/// Which side owns the object a handle denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Native code holds a reference to a managed object.
    NativeHeldManaged,
    /// Managed code holds a reference to a native object.
    ManagedHeldNative,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::NativeHeldManaged => "native-held managed",
            Direction::ManagedHeldNative => "managed-held native",
        }
    }
}

const DIRECTION_BIT: u64 = 1 << 63;
const GENERATION_MASK: u32 = 0x7fff_ffff;

/// Stable indirect identifier substituting for a direct object reference.
///
/// A handle is an index into one of the two handle tables plus the slot's
/// generation at the time of allocation. When a slot is released its
/// generation is incremented, so a handle that outlives its object can
/// never resolve to whatever object reuses the slot.
///
/// Handles cross the boundary as a single `u64`:
/// `id | generation << 32 | direction << 63`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    /// Slot index; `0` is reserved for null.
    pub id: u32,
    /// Slot generation (31 bits on the wire).
    pub generation: u32,
    pub direction: Direction,
}

impl Handle {
    /// The null handle for managed objects held by native code.
    pub const NULL: Handle = Handle {
        id: 0,
        generation: 0,
        direction: Direction::NativeHeldManaged,
    };

    pub fn new(id: u32, generation: u32, direction: Direction) -> Self {
        Self {
            id,
            generation: generation & GENERATION_MASK,
            direction,
        }
    }

    /// The null handle for a given direction.
    pub fn null(direction: Direction) -> Self {
        Self::new(0, 0, direction)
    }

    pub fn is_null(&self) -> bool {
        self.id == 0
    }

    /// Pack into the wire representation.
    pub fn to_bits(self) -> u64 {
        let dir = match self.direction {
            Direction::NativeHeldManaged => 0,
            Direction::ManagedHeldNative => DIRECTION_BIT,
        };
        u64::from(self.id) | (u64::from(self.generation & GENERATION_MASK) << 32) | dir
    }

    /// Unpack from the wire representation.
    pub fn from_bits(bits: u64) -> Self {
        let direction = if bits & DIRECTION_BIT != 0 {
            Direction::ManagedHeldNative
        } else {
            Direction::NativeHeldManaged
        };
        Self {
            id: bits as u32,
            generation: ((bits >> 32) as u32) & GENERATION_MASK,
            direction,
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.direction {
            Direction::NativeHeldManaged => 'M',
            Direction::ManagedHeldNative => 'N',
        };
        write!(f, "Handle({tag}#{}@{})", self.id, self.generation)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.id, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip() {
        let h = Handle::new(42, 7, Direction::ManagedHeldNative);
        assert_eq!(Handle::from_bits(h.to_bits()), h);

        let h = Handle::new(u32::MAX, GENERATION_MASK, Direction::NativeHeldManaged);
        assert_eq!(Handle::from_bits(h.to_bits()), h);
    }

    #[test]
    fn null_handles() {
        assert!(Handle::NULL.is_null());
        assert_eq!(Handle::NULL.to_bits(), 0);
        assert!(Handle::null(Direction::ManagedHeldNative).is_null());
    }

    #[test]
    fn generation_wraps_into_31_bits() {
        let h = Handle::new(1, u32::MAX, Direction::NativeHeldManaged);
        assert_eq!(h.generation, GENERATION_MASK);
    }
}
