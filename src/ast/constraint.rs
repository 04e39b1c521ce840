//! Property constraint capabilities
//!
//! Constraints are attached to a property when it is resolved. The guard
//! emitter dispatches on these capabilities only, never on type names.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constraint {
    /// Reference values must not be null
    NonNull,
    /// Numeric values must be >= 0
    NonNegative,
}

impl Constraint {
    /// All constraints, in the order their guards are emitted
    pub const ALL: [Constraint; 2] = [Constraint::NonNull, Constraint::NonNegative];

    fn bit(self) -> u8 {
        match self {
            Constraint::NonNull => 1 << 0,
            Constraint::NonNegative => 1 << 1,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::NonNull => write!(f, "non-null"),
            Constraint::NonNegative => write!(f, "non-negative"),
        }
    }
}

/// Ordered set of constraints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ConstraintSet(u8);

impl ConstraintSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn of(constraint: Constraint) -> Self {
        Self(constraint.bit())
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.insert(constraint);
        self
    }

    pub fn insert(&mut self, constraint: Constraint) {
        self.0 |= constraint.bit();
    }

    pub fn contains(&self, constraint: Constraint) -> bool {
        self.0 & constraint.bit() != 0
    }

    pub fn union(self, other: ConstraintSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate in guard emission order
    pub fn iter(&self) -> impl Iterator<Item = Constraint> + '_ {
        Constraint::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Constraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut set = ConstraintSet::empty();
        for c in iter {
            set.insert(c);
        }
        set
    }
}
