/*
 * Copyright 2026 the inodefs authors
 *
 * This file is part of inodefs.
 *
 * inodefs is free software: you can redistribute it and/or modify it under the
 * terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or (at your option) any later
 * version.
 *
 * inodefs is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
 * A PARTICULAR PURPOSE. See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * inodefs. If not, see <https://www.gnu.org/licenses/>.
 */

//! A directory is a single 512-byte data block holding up to 7 entries: no
//! overflow block, no subdirectory of entries. Lookup is a linear scan by
//! byte-exact name.

use std::mem::size_of;
use std::slice;

use crate::block_store::{BlockId, BlockStore};
use crate::inode::FileType;
use crate::layout::{BLOCK_SIZE, DIR_ENTRIES_PER_BLOCK, MAX_NAME_LEN};

/// One entry in a directory block: a NUL-terminated name, the inode it
/// names, and its type. Free iff `inode_number == 0` (inode 0 is the root,
/// which can never appear as a child entry, so the sentinel is unambiguous).
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub(crate) struct DirectoryEntry {
    name: [u8; MAX_NAME_LEN + 1],
    inode_number: u8,
    kind: u8,
}

const _: () = assert!(size_of::<DirectoryEntry>() == 66);

impl DirectoryEntry {
    fn empty() -> Self {
        Self {
            name: [0; MAX_NAME_LEN + 1],
            inode_number: 0,
            kind: 0,
        }
    }

    pub(crate) fn is_free(&self) -> bool {
        self.inode_number == 0
    }

    pub(crate) fn name(&self) -> &str {
        let nul = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        std::str::from_utf8(&self.name[..nul]).unwrap_or("")
    }

    pub(crate) fn inode_number(&self) -> u8 {
        self.inode_number
    }

    pub(crate) fn file_type(&self) -> FileType {
        FileType::from_entry_kind(self.kind)
    }

    fn set(&mut self, name: &str, inode_number: u8, kind: FileType) {
        let mut buf = [0u8; MAX_NAME_LEN + 1];
        buf[..name.len()].copy_from_slice(name.as_bytes());
        self.name = buf;
        self.inode_number = inode_number;
        self.kind = kind.to_entry_kind();
    }

    fn clear(&mut self) {
        *self = Self::empty();
    }
}

/// A public, read-only snapshot of a directory entry, returned by
/// [`crate::Fs::read_dir`].
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub inode_number: u8,
    pub is_directory: bool,
}

/// The 512-byte contents of a directory's data block: 7 entries plus
/// reserved padding.
#[repr(C, packed)]
pub(crate) struct DirectoryBlock {
    entries: [DirectoryEntry; DIR_ENTRIES_PER_BLOCK],
    _reserved: [u8; 50],
}

const _: () = assert!(size_of::<DirectoryBlock>() == BLOCK_SIZE);

/// Why a free-slot search failed.
pub(crate) enum SlotError {
    /// The requested name already exists in this directory.
    Duplicate,
    /// All 7 entries are occupied.
    Full,
}

impl DirectoryBlock {
    /// A fresh, empty directory block (no entries).
    pub(crate) fn empty() -> Self {
        Self {
            entries: [DirectoryEntry::empty(); DIR_ENTRIES_PER_BLOCK],
            _reserved: [0; 50],
        }
    }

    pub(crate) fn read(store: &BlockStore, block: BlockId) -> Self {
        let mut raw = [0u8; BLOCK_SIZE];
        store.read(block, &mut raw);
        let mut dir = Self::empty();
        let dst = unsafe {
            slice::from_raw_parts_mut(&mut dir as *mut Self as *mut u8, size_of::<Self>())
        };
        dst.copy_from_slice(&raw);
        dir
    }

    pub(crate) fn write(&self, store: &mut BlockStore, block: BlockId) {
        let mut raw = [0u8; BLOCK_SIZE];
        let src = unsafe {
            slice::from_raw_parts(self as *const Self as *const u8, size_of::<Self>())
        };
        raw.copy_from_slice(src);
        store.write(block, &raw);
    }

    pub(crate) fn entries(&self) -> &[DirectoryEntry; DIR_ENTRIES_PER_BLOCK] {
        &self.entries
    }

    /// Linear scan for an entry with this exact, byte-exact name.
    pub(crate) fn find(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| !e.is_free() && e.name() == name)
    }

    /// Finds a slot to create `name` in: fails if the name is already used
    /// by any entry, or if all 7 slots are occupied.
    pub(crate) fn find_slot_for(&self, name: &str) -> Result<usize, SlotError> {
        if self.find(name).is_some() {
            return Err(SlotError::Duplicate);
        }
        self.entries
            .iter()
            .position(DirectoryEntry::is_free)
            .ok_or(SlotError::Full)
    }

    /// Whether any entry is occupied (used to forbid removing a non-empty
    /// directory).
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.iter().all(DirectoryEntry::is_free)
    }

    pub(crate) fn insert(&mut self, slot: usize, name: &str, inode_number: u8, kind: FileType) {
        self.entries[slot].set(name, inode_number, kind);
    }

    pub(crate) fn remove(&mut self, slot: usize) {
        self.entries[slot].clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_block_is_empty() {
        let dir = DirectoryBlock::empty();
        assert!(dir.is_empty());
        assert_eq!(dir.find("a"), None);
    }

    #[test]
    fn insert_find_remove() {
        let mut dir = DirectoryBlock::empty();
        let slot = dir.find_slot_for("a").unwrap();
        dir.insert(slot, "a", 3, FileType::Regular);
        assert!(!dir.is_empty());
        assert_eq!(dir.find("a"), Some(slot));
        dir.remove(slot);
        assert!(dir.is_empty());
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut dir = DirectoryBlock::empty();
        let slot = dir.find_slot_for("a").unwrap();
        dir.insert(slot, "a", 3, FileType::Regular);
        assert!(matches!(dir.find_slot_for("a"), Err(SlotError::Duplicate)));
    }

    #[test]
    fn capacity_is_exactly_seven() {
        let mut dir = DirectoryBlock::empty();
        for i in 0..7 {
            let name = format!("f{i}");
            let slot = dir.find_slot_for(&name).unwrap();
            dir.insert(slot, &name, (i + 1) as u8, FileType::Regular);
        }
        assert!(matches!(dir.find_slot_for("f7"), Err(SlotError::Full)));
    }

    #[test]
    fn write_then_read_roundtrips() {
        let mut store = BlockStore::create();
        let block = store.allocate().unwrap();
        let mut dir = DirectoryBlock::empty();
        let slot = dir.find_slot_for("hello").unwrap();
        dir.insert(slot, "hello", 9, FileType::Directory);
        dir.write(&mut store, block);

        let read_back = DirectoryBlock::read(&store, block);
        assert_eq!(read_back.find("hello"), Some(slot));
        assert_eq!(read_back.entries()[slot].inode_number(), 9);
        assert_eq!(read_back.entries()[slot].file_type(), FileType::Directory);
    }
}
