//! Normalized binding identifier.
//!
//! Style-sheet identifiers treat `_` and `-` as the same character, so
//! `$main_color` and `$main-color` name one binding. Normalization happens
//! once, when a `Name` is built; every table is keyed by the hyphenated form.

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::sync::Arc;

/// A binding identifier in its normalized (hyphenated) spelling.
///
/// Cheap to clone. Hashes exactly like the underlying `str`, so tables keyed
/// by `Name` can be probed with an already-normalized `&str`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<str>);

impl Name {
    /// Build a name, folding every `_` into `-`.
    pub fn new(raw: &str) -> Self {
        Name(Arc::from(Self::normalize(raw).as_ref()))
    }

    /// Normalize a raw identifier without allocating when it is already hyphenated.
    #[inline]
    pub fn normalize(raw: &str) -> Cow<'_, str> {
        if raw.contains('_') {
            Cow::Owned(raw.replace('_', "-"))
        } else {
            Cow::Borrowed(raw)
        }
    }

    /// The normalized spelling.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(raw: &str) -> Self {
        Name::new(raw)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", &*self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
