use core::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};

/// Lifetime tier of an injectable and of a container.
///
/// Scopes are totally ordered from the broadest to the strictest:
/// `Global < Connection < Call < Transient`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Scope {
    Global,
    Connection,
    Call,
    Transient,
}

impl Scope {
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Connection => "connection",
            Scope::Call => "call",
            Scope::Transient => "transient",
        }
    }

    #[inline]
    #[must_use]
    pub const fn priority(&self) -> u8 {
        *self as u8
    }

    #[inline]
    #[must_use]
    pub const fn all() -> [Self; 4] {
        use Scope::{Call, Connection, Global, Transient};

        [Global, Connection, Call, Transient]
    }

    /// Returns the stricter of the two scopes
    #[inline]
    #[must_use]
    pub fn strictest(self, other: Self) -> Self {
        self.max(other)
    }

    /// A container of `self` scope keeps instances declared with `declared` scope
    #[inline]
    #[must_use]
    pub fn can_cache(self, declared: Self) -> bool {
        self >= declared
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
