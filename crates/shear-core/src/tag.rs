//! Subdomain tag sets and the closed [`Role`] enum derived from them.
//!
//! Tags are free-form strings used for predicate-based selection of
//! subdomains. Four of them are *role tags*; every subdomain taking part
//! in time integration carries exactly one, and [`TagSet::role`] maps it
//! onto a [`Role`] so that physics dispatch is a `match`, never a string
//! comparison.

use crate::error::RoleError;
use smallvec::SmallVec;
use std::fmt;

/// Role tag for element (bulk) subdomains.
pub const VOLUME: &str = "volume";
/// Role tag for glue between two subdomains on the same process.
pub const GLUE_LOCAL: &str = "glue-local";
/// Role tag for glue whose neighbor lives on another process.
pub const GLUE_PARALLEL: &str = "glue-parallel";
/// Role tag for glue on the domain exterior.
pub const GLUE_BOUNDARY: &str = "glue-boundary";

/// Every role tag, in dispatch order.
pub const ROLE_TAGS: [&str; 4] = [VOLUME, GLUE_LOCAL, GLUE_PARALLEL, GLUE_BOUNDARY];

/// Which flavor of coupling surface a glue subdomain is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlueKind {
    /// Same-process neighbor; traces are copied directly.
    Local,
    /// Cross-process neighbor; traces travel through the communicator.
    Parallel,
    /// Domain exterior; boundary conditions replace the neighbor.
    Boundary,
}

impl GlueKind {
    /// The role tag for this glue kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Local => GLUE_LOCAL,
            Self::Parallel => GLUE_PARALLEL,
            Self::Boundary => GLUE_BOUNDARY,
        }
    }
}

/// The four subdomain roles known to the rate-accumulation protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Elements carrying time-evolved state.
    Volume,
    /// A coupling interface of the given kind.
    Glue(GlueKind),
}

impl Role {
    /// The role tag identifying this role.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Volume => VOLUME,
            Self::Glue(kind) => kind.tag(),
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            VOLUME => Some(Self::Volume),
            GLUE_LOCAL => Some(Self::Glue(GlueKind::Local)),
            GLUE_PARALLEL => Some(Self::Glue(GlueKind::Parallel)),
            GLUE_BOUNDARY => Some(Self::Glue(GlueKind::Boundary)),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An ordered, duplicate-free set of tags.
///
/// Backed by a `SmallVec` since subdomains rarely carry more than a
/// handful of tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: SmallVec<[String; 4]>,
}

impl TagSet {
    /// An empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tag set holding the tag of `role`.
    pub fn for_role(role: Role) -> Self {
        let mut set = Self::new();
        set.insert(role.tag());
        set
    }

    /// Add a tag. Returns `false` if it was already present.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Whether `tag` is in the set.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Iterate over the tags in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Resolve the set's role.
    ///
    /// Exactly one role tag must be present.
    pub fn role(&self) -> Result<Role, RoleError> {
        let mut found: Option<Role> = None;
        for tag in self.iter() {
            if let Some(role) = Role::from_tag(tag) {
                if let Some(first) = found {
                    return Err(RoleError::Ambiguous {
                        first: first.tag(),
                        second: role.tag(),
                    });
                }
                found = Some(role);
            }
        }
        found.ok_or_else(|| RoleError::Unrecognized {
            tags: self.iter().map(str::to_owned).collect(),
        })
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, tag) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{tag}")?;
        }
        write!(f, "]")
    }
}
