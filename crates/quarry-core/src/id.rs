//! Identifiers for the two sides of a match.

use std::fmt;

/// One of the two sides of an adversarial match.
///
/// The controlled entity is a single agent; the opposing group is a
/// multi-agent team driven by one controller (which may coordinate its
/// members through a [`Messenger`](crate::Messenger)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// The single controlled entity.
    Entity,
    /// The opposing multi-agent group.
    Group,
}

impl Side {
    /// Both sides, entity first.
    pub const ALL: [Side; 2] = [Side::Entity, Side::Group];

    /// Short lowercase label, used for thread names and log fields.
    pub fn label(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
