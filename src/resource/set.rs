/*!
 * Resource Sets
 * Compact bitmask over the fixed resource id space
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{ResourceId, RESOURCE_COUNT};
use serde::{Serialize, Serializer};
use std::fmt;

/// Set of resource ids, one bit per resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ResourceSet(u8);

impl ResourceSet {
    pub const EMPTY: Self = Self(0);

    /// Validate and build a request set.
    ///
    /// A request must name at least one and fewer than `RESOURCE_COUNT`
    /// resources, all in range. Duplicates collapse.
    pub fn try_from_ids(ids: &[ResourceId]) -> SchedulerResult<Self> {
        if ids.is_empty() {
            return Err(SchedulerError::InvalidResourceRequest(
                "empty request".into(),
            ));
        }
        if ids.len() >= RESOURCE_COUNT {
            return Err(SchedulerError::InvalidResourceRequest(format!(
                "count {} out of range",
                ids.len()
            )));
        }

        let mut set = Self::EMPTY;
        for &id in ids {
            if usize::from(id) >= RESOURCE_COUNT {
                return Err(SchedulerError::InvalidResourceRequest(format!(
                    "resource {} out of range",
                    id
                )));
            }
            set.insert(id);
        }
        Ok(set)
    }

    #[inline(always)]
    const fn bit(id: ResourceId) -> u8 {
        1 << id
    }

    #[inline]
    pub fn insert(&mut self, id: ResourceId) {
        debug_assert!(usize::from(id) < RESOURCE_COUNT);
        self.0 |= Self::bit(id);
    }

    #[inline]
    pub fn contains(&self, id: ResourceId) -> bool {
        usize::from(id) < RESOURCE_COUNT && self.0 & Self::bit(id) != 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Ids in ascending order
    pub fn iter(&self) -> impl Iterator<Item = ResourceId> + '_ {
        (0..RESOURCE_COUNT as ResourceId).filter(move |&id| self.contains(id))
    }

    pub fn to_vec(&self) -> Vec<ResourceId> {
        self.iter().collect()
    }
}

impl FromIterator<ResourceId> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceId>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for id in iter {
            if usize::from(id) < RESOURCE_COUNT {
                set.insert(id);
            }
        }
        set
    }
}

/// Space separated ids, or `none`
impl fmt::Display for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for id in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", id)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for ResourceSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}
