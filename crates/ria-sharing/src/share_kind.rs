// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! How a code element is visible to the client project.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Bit-flag classification of a code element's visibility to the client.
///
/// [`UNKNOWN`](Self::UNKNOWN) means there was no evidence either way and is
/// distinct from [`NOT_SHARED`](Self::NOT_SHARED), which is a confirmed
/// answer. Callers decide per use which of the two to treat conservatively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeMemberShareKind(u8);

impl CodeMemberShareKind {
    /// No information was available.
    pub const UNKNOWN: Self = Self(0);
    /// Confirmed not visible to the client.
    pub const NOT_SHARED: Self = Self(1);
    /// Compiled into the client from a shared source file.
    pub const SHARED_BY_SOURCE: Self = Self(2);
    /// Visible through an assembly the client references.
    pub const SHARED_BY_REFERENCE: Self = Self(4);
    /// Either kind of sharing.
    pub const SHARED: Self = Self(2 | 4);

    /// Raw flag bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Rebuilds a kind from raw bits, dropping undefined bits.
    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Whether every flag of `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any sharing flag is set, which means the client already has it.
    pub fn is_shared(self) -> bool {
        self.0 & Self::SHARED.0 != 0
    }

    /// Whether this is the no-evidence sentinel.
    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }
}

impl BitOr for CodeMemberShareKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for CodeMemberShareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::UNKNOWN => "Unknown",
            Self::NOT_SHARED => "NotShared",
            Self::SHARED_BY_SOURCE => "SharedBySource",
            Self::SHARED_BY_REFERENCE => "SharedByReference",
            Self::SHARED => "Shared",
            _ => return write!(f, "CodeMemberShareKind({:#05b})", self.0),
        };
        f.write_str(name)
    }
}
