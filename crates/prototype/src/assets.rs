//! # Assets
//!
//! Interns asset names into small stable handles that can live inside state
//! rows. Content loading is not done here; a handle only names an asset.

use std::collections::HashMap;

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

bitflags! {
    /// How an asset's content comes to be.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AssetFlags: u32 {
        /// Generated at runtime rather than read from disk.
        const PROCEDURAL = 1 << 0;
        /// Content changes after creation.
        const DYNAMIC = 1 << 1;
    }
}

/// Handle to an interned asset name. Zero means "no asset".
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct AssetHandle(pub u32);

impl AssetHandle {
    /// No asset.
    pub const NONE: Self = Self(0);

    /// Returns true for [`Self::NONE`].
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

struct AssetEntry {
    name: String,
    flags: AssetFlags,
}

/// Asset name registry.
#[derive(Default)]
pub struct Assets {
    entries: Vec<AssetEntry>,
    by_name: HashMap<String, AssetHandle>,
}

impl Assets {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `name`, interning it on first use.
    ///
    /// Flags given on later calls are merged into the recorded flags.
    pub fn asset(&mut self, name: &str, flags: AssetFlags) -> AssetHandle {
        if let Some(&handle) = self.by_name.get(name) {
            self.entries[handle.0 as usize - 1].flags |= flags;
            return handle;
        }
        let handle = AssetHandle(self.entries.len() as u32 + 1);
        self.entries.push(AssetEntry {
            name: name.to_owned(),
            flags,
        });
        self.by_name.insert(name.to_owned(), handle);
        tracing::debug!(asset = name, handle = handle.0, ?flags, "interned asset");
        handle
    }

    /// Looks up a previously interned name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<AssetHandle> {
        self.by_name.get(name).copied()
    }

    fn entry(&self, handle: AssetHandle) -> Option<&AssetEntry> {
        self.entries.get((handle.0 as usize).checked_sub(1)?)
    }

    /// Name of an interned asset.
    #[must_use]
    pub fn name(&self, handle: AssetHandle) -> Option<&str> {
        self.entry(handle).map(|e| e.name.as_str())
    }

    /// Flags of an interned asset.
    #[must_use]
    pub fn flags(&self, handle: AssetHandle) -> Option<AssetFlags> {
        self.entry(handle).map(|e| e.flags)
    }

    /// Number of interned assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
