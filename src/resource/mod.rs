/*!
 * Resource Pool
 * Fixed set of exclusive resources with all-or-nothing acquisition
 */

mod set;

pub use set::ResourceSet;

use crate::core::types::{ResourceId, TaskId, RESOURCE_COUNT};

/// Availability of the fixed resource set.
///
/// Each slot is either free or held by exactly one task; a request is
/// granted only when every resource it names is free.
#[derive(Debug, Clone, Default)]
pub struct ResourcePool {
    holders: [Option<TaskId>; RESOURCE_COUNT],
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every resource in `request` is free
    #[inline]
    pub fn is_free(&self, request: ResourceSet) -> bool {
        request.iter().all(|id| self.holders[usize::from(id)].is_none())
    }

    /// Atomically take every resource in `request` for `owner`.
    ///
    /// Returns false and changes nothing if any of them is held.
    pub fn try_grant(&mut self, request: ResourceSet, owner: TaskId) -> bool {
        if !self.is_free(request) {
            return false;
        }
        for id in request.iter() {
            self.holders[usize::from(id)] = Some(owner);
        }
        true
    }

    /// Mark every resource in `ids` free, whoever held it
    pub fn release(&mut self, ids: ResourceSet) {
        for id in ids.iter() {
            self.holders[usize::from(id)] = None;
        }
    }

    /// Current holder of a resource
    pub fn holder(&self, id: ResourceId) -> Option<TaskId> {
        self.holders.get(usize::from(id)).copied().flatten()
    }

    /// Resources currently held by `owner`
    pub fn held_by(&self, owner: TaskId) -> ResourceSet {
        self.holders
            .iter()
            .enumerate()
            .filter(|(_, holder)| **holder == Some(owner))
            .map(|(id, _)| id as ResourceId)
            .collect()
    }

    /// Resources held by anyone
    pub fn held(&self) -> ResourceSet {
        self.holders
            .iter()
            .enumerate()
            .filter(|(_, holder)| holder.is_some())
            .map(|(id, _)| id as ResourceId)
            .collect()
    }

    pub fn free_count(&self) -> usize {
        self.holders.iter().filter(|h| h.is_none()).count()
    }
}
