//! Resolved CSS selectors.

use smallvec::SmallVec;
use std::fmt;

/// A comma-separated selector list with all parent (`&`) references resolved.
///
/// Almost every rule has a single complex selector, so the members are kept
/// inline until a second one shows up.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SelectorList {
    members: SmallVec<[String; 1]>,
}

impl SelectorList {
    /// Build a selector list from its complex selectors, in source order.
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectorList {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// The complex selectors, in source order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Resolve a nested rule against this one: every child member is
    /// prefixed with every parent member (`.a, .b` + `p` = `.a p, .b p`).
    #[must_use]
    pub fn nest(&self, child: &SelectorList) -> SelectorList {
        let members = self
            .members
            .iter()
            .flat_map(|parent| {
                child.members.iter().map(move |c| {
                    if c.contains('&') {
                        c.replace('&', parent)
                    } else {
                        format!("{parent} {c}")
                    }
                })
            })
            .collect();
        SelectorList { members }
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.members.join(", "))
    }
}
