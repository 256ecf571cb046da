//! Deterministic hash-based identity for types and bridge entry points.
//!
//! [`TypeHash`] is a 64-bit hash computed from names and signatures. Both
//! generated artifacts embed these values, so the native stub and the
//! managed bridge function for one member agree on an entry id without any
//! registration step at run time.
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants so that a type, a
//! method and a constructor sharing a name never share a hash.
//!
//! # Examples
//!
//! ```
//! use hostbridge_core::TypeHash;
//!
//! let float = TypeHash::from_name("float");
//! assert_eq!(float, TypeHash::from_name("float"));
//!
//! let owner = TypeHash::from_name("Vector3");
//! let a = TypeHash::from_method(owner, "Scale", &[float]);
//! let b = TypeHash::from_method(owner, "Scale", &[float, float]);
//! assert_ne!(a, b);
//! ```

use std::fmt;
use xxhash_rust::const_xxh64;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for chained components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for instance and static method hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for constructor hashes.
    pub const CONSTRUCTOR: u64 = 0x9a7f3d5e2b8c4601;

    /// Domain marker for field/property getters.
    pub const GETTER: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for field/property setters.
    pub const SETTER: u64 = 0x3e9f5d2a8c7b1403;

    /// Domain marker for the per-class release entry.
    pub const RELEASE: u64 = 0x1a095090689d4647;

    /// Domain marker for delegate signatures.
    pub const SIGNATURE: u64 = 0x8648dbbc94d49b8d;

    /// Marker mixed into `out` parameter identities.
    pub const OUT_PARAM: u64 = 0x510e527fade682d1;

    /// Marker mixed into `ref` parameter identities.
    pub const REF_PARAM: u64 = 0x9b05688c2b3e6c1f;

    /// Parameter position mixing constants.
    ///
    /// Each position gets its own constant so that parameter order matters.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x0f1e2d3c4b5a6978,
        0x89abcdef01234567,
    ];
}

/// A deterministic 64-bit hash identifying a type or a bridge entry point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a fully qualified type name.
    ///
    /// Usable in constants, which is how generated bindings name their
    /// types.
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ const_xxh64::xxh64(name.as_bytes(), 0))
    }

    /// Create a method hash from owner, name and parameter type hashes.
    ///
    /// Parameter order matters: `(int, float)` and `(float, int)` differ.
    #[inline]
    pub fn from_method(owner: TypeHash, name: &str, param_hashes: &[TypeHash]) -> Self {
        let seed = hash_constants::METHOD ^ owner.0 ^ xxh64(name.as_bytes(), 0);
        TypeHash(mix_params(seed, param_hashes))
    }

    /// Create a constructor hash from owner and parameter type hashes.
    #[inline]
    pub fn from_constructor(owner: TypeHash, param_hashes: &[TypeHash]) -> Self {
        TypeHash(mix_params(hash_constants::CONSTRUCTOR ^ owner.0, param_hashes))
    }

    /// Create the getter entry hash for a field or property.
    #[inline]
    pub fn from_getter(owner: TypeHash, member: &str) -> Self {
        TypeHash(hash_constants::GETTER ^ owner.0 ^ xxh64(member.as_bytes(), 0))
    }

    /// Create the setter entry hash for a field or property.
    #[inline]
    pub fn from_setter(owner: TypeHash, member: &str) -> Self {
        TypeHash(hash_constants::SETTER ^ owner.0 ^ xxh64(member.as_bytes(), 0))
    }

    /// Create the release (finalize) entry hash for a class.
    #[inline]
    pub fn from_release(owner: TypeHash) -> Self {
        TypeHash(hash_constants::RELEASE ^ owner.0.rotate_left(17))
    }

    /// Create a hash for a callback signature (parameter and return types).
    ///
    /// Two delegate types with the same signature share this hash, which is
    /// how the generator emits one function-pointer type per signature.
    #[inline]
    pub fn from_signature(param_hashes: &[TypeHash], return_hash: TypeHash) -> Self {
        let seed = hash_constants::SIGNATURE ^ return_hash.0.rotate_left(29);
        TypeHash(mix_params(seed, param_hashes))
    }

    /// Check if this is the empty hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the raw hash value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

fn mix_params(seed: u64, param_hashes: &[TypeHash]) -> u64 {
    let mut hash = seed;
    for (i, param) in param_hashes.iter().enumerate() {
        let marker = hash_constants::PARAM_MARKERS
            .get(i)
            .copied()
            .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
        // wrapping_mul keeps parameter order significant (XOR alone is commutative)
        hash = hash
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(marker ^ param.0);
    }
    hash
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl From<u64> for TypeHash {
    fn from(value: u64) -> Self {
        TypeHash(value)
    }
}
