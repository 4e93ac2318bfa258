/// Append-only memo table from description to native object

use crate::error::Result;
use crate::igfx_debug;

/// Ordered list of (description, object) pairs
///
/// Lookup is a linear structural scan in insertion order; the first match
/// wins. Misses append. Entries are never evicted, so the number of entries is
/// the number of distinct descriptions the application has exercised.
pub struct ObjectCache<D, O> {
    name: &'static str,
    entries: Vec<(D, O)>,
}

impl<D: PartialEq + Clone + std::fmt::Debug, O: Clone> ObjectCache<D, O> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn find(&self, desc: &D) -> Option<&O> {
        self.entries
            .iter()
            .find(|(entry_desc, _)| entry_desc == desc)
            .map(|(_, object)| object)
    }

    /// Return the object for `desc`, creating and appending it on a miss
    ///
    /// A failed creation leaves the cache unchanged.
    pub fn find_or_create<F>(&mut self, desc: &D, create: F) -> Result<O>
    where
        F: FnOnce(&D) -> Result<O>,
    {
        if let Some(object) = self.find(desc) {
            return Ok(object.clone());
        }

        let object = create(desc)?;
        self.entries.push((desc.clone(), object.clone()));
        igfx_debug!(
            "igfx::ObjectCache",
            "{} cache miss, created entry #{}: {:?}",
            self.name,
            self.entries.len(),
            desc
        );
        Ok(object)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &D> + '_ {
        self.entries.iter().map(|(desc, _)| desc)
    }

    /// Drop every entry (device teardown)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
