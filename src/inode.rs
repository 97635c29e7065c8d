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

//! The inode table: 256 64-byte inodes packed 8-per-block across blocks
//! 1..=32, immediately after the superblock.

use std::mem::size_of;
use std::slice;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::block_store::{BlockId, BlockStore};
use crate::layout::{BLOCK_SIZE, INODES_PER_BLOCK, INODE_SIZE, INODE_TABLE_START_BLOCK};

/// The type of a filesystem object.
///
/// On disk this is expressed two different ways for historical reasons: a
/// directory entry carries an explicit one-byte tag, while an inode encodes
/// it in the magnitude of `fileMode` (directories use mode `1777`, regular
/// files use mode `777`, and "is directory" means `fileMode >= 1000`). This
/// enum is the single place either representation is produced or consumed;
/// no other code compares a mode or a tag byte directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
}

impl FileType {
    const DIRECTORY_MODE: i32 = 1777;
    const REGULAR_MODE: i32 = 777;

    pub(crate) fn from_mode(mode: i32) -> Self {
        if mode >= 1000 {
            Self::Directory
        } else {
            Self::Regular
        }
    }

    pub(crate) fn to_mode(self) -> i32 {
        match self {
            Self::Directory => Self::DIRECTORY_MODE,
            Self::Regular => Self::REGULAR_MODE,
        }
    }

    pub(crate) fn from_entry_kind(kind: u8) -> Self {
        if kind == 1 {
            Self::Directory
        } else {
            Self::Regular
        }
    }

    pub(crate) fn to_entry_kind(self) -> u8 {
        match self {
            Self::Regular => 0,
            Self::Directory => 1,
        }
    }
}

/// On-disk inode, exactly 64 bytes. Field order and widths are part of the
/// image format and must not change.
#[repr(C, packed)]
#[derive(Clone, Copy)]
pub(crate) struct Inode {
    file_size: i32,
    device_id: i32,
    user_id: i32,
    group_id: i32,
    file_mode: i32,
    link_count: i32,
    change_time: i64,
    modification_time: i64,
    access_time: i64,
    direct_blocks: [u16; 6],
    indirect_block: u16,
    double_indirect_block: u16,
}

const _: () = assert!(size_of::<Inode>() == INODE_SIZE);

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as i64
}

impl Inode {
    /// A zeroed, unallocated inode: every pointer is `0`, every counter `0`.
    pub(crate) fn empty() -> Self {
        Self {
            file_size: 0,
            device_id: 0,
            user_id: 0,
            group_id: 0,
            file_mode: 0,
            link_count: 0,
            change_time: 0,
            modification_time: 0,
            access_time: 0,
            direct_blocks: [0; 6],
            indirect_block: 0,
            double_indirect_block: 0,
        }
    }

    /// A freshly-allocated inode of the given type, timestamped now.
    pub(crate) fn new(kind: FileType) -> Self {
        let t = now();
        Self {
            file_size: 0,
            device_id: 0,
            user_id: 0,
            group_id: 0,
            file_mode: kind.to_mode(),
            link_count: 1,
            change_time: t,
            modification_time: t,
            access_time: t,
            direct_blocks: [0; 6],
            indirect_block: 0,
            double_indirect_block: 0,
        }
    }

    pub(crate) fn file_type(&self) -> FileType {
        let mode = self.file_mode;
        FileType::from_mode(mode)
    }

    pub(crate) fn is_directory(&self) -> bool {
        self.file_type() == FileType::Directory
    }

    pub(crate) fn file_size(&self) -> u32 {
        let size = self.file_size;
        size.max(0) as u32
    }

    pub(crate) fn set_file_size(&mut self, size: u32) {
        self.file_size = size as i32;
    }

    pub(crate) fn touch_modified(&mut self) {
        self.modification_time = now();
        self.change_time = now();
    }

    pub(crate) fn change_time(&self) -> i64 {
        self.change_time
    }

    pub(crate) fn modification_time(&self) -> i64 {
        self.modification_time
    }

    pub(crate) fn access_time(&self) -> i64 {
        self.access_time
    }

    pub(crate) fn direct_block(&self, i: usize) -> BlockId {
        let blocks = self.direct_blocks;
        BlockId(blocks[i])
    }

    pub(crate) fn set_direct_block(&mut self, i: usize, id: BlockId) {
        let mut blocks = self.direct_blocks;
        blocks[i] = id.0;
        self.direct_blocks = blocks;
    }

    pub(crate) fn indirect_block(&self) -> BlockId {
        BlockId(self.indirect_block)
    }

    pub(crate) fn set_indirect_block(&mut self, id: BlockId) {
        self.indirect_block = id.0;
    }

    pub(crate) fn double_indirect_block(&self) -> BlockId {
        BlockId(self.double_indirect_block)
    }

    pub(crate) fn set_double_indirect_block(&mut self, id: BlockId) {
        self.double_indirect_block = id.0;
    }

    fn table_location(inode_num: u8) -> (BlockId, usize) {
        let i = inode_num as usize;
        let block = BlockId((INODE_TABLE_START_BLOCK + i / INODES_PER_BLOCK) as u16);
        let slot = i % INODES_PER_BLOCK;
        (block, slot)
    }

    /// Reads inode `inode_num` out of the packed inode table.
    pub(crate) fn get(store: &BlockStore, inode_num: u8) -> Self {
        let (block, slot) = Self::table_location(inode_num);
        let mut raw = [0u8; BLOCK_SIZE];
        store.read(block, &mut raw);
        let bytes = &raw[slot * INODE_SIZE..(slot + 1) * INODE_SIZE];
        let mut inode = Self::empty();
        let dst = unsafe {
            slice::from_raw_parts_mut(&mut inode as *mut Self as *mut u8, INODE_SIZE)
        };
        dst.copy_from_slice(bytes);
        inode
    }

    /// Splices `self` into inode_num's slot and writes the whole block back.
    pub(crate) fn put(&self, store: &mut BlockStore, inode_num: u8) {
        let (block, slot) = Self::table_location(inode_num);
        let mut raw = [0u8; BLOCK_SIZE];
        store.read(block, &mut raw);
        let src = unsafe {
            slice::from_raw_parts(self as *const Self as *const u8, INODE_SIZE)
        };
        raw[slot * INODE_SIZE..(slot + 1) * INODE_SIZE].copy_from_slice(src);
        store.write(block, &raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_mode_roundtrip() {
        assert_eq!(FileType::from_mode(1777), FileType::Directory);
        assert_eq!(FileType::from_mode(777), FileType::Regular);
        assert_eq!(FileType::Directory.to_mode(), 1777);
        assert_eq!(FileType::Regular.to_mode(), 777);
    }

    #[test]
    fn file_type_entry_kind_roundtrip() {
        assert_eq!(FileType::from_entry_kind(0), FileType::Regular);
        assert_eq!(FileType::from_entry_kind(1), FileType::Directory);
        assert_eq!(FileType::Regular.to_entry_kind(), 0);
        assert_eq!(FileType::Directory.to_entry_kind(), 1);
    }

    #[test]
    fn inode_table_get_put_roundtrip() {
        let mut store = BlockStore::create();
        let mut inode = Inode::new(FileType::Regular);
        inode.set_file_size(42);
        inode.set_direct_block(0, BlockId(99));
        inode.put(&mut store, 5);

        let read_back = Inode::get(&store, 5);
        assert_eq!(read_back.file_size(), 42);
        assert_eq!(read_back.direct_block(0), BlockId(99));
        assert!(!read_back.is_directory());
    }

    #[test]
    fn different_inodes_occupy_distinct_slots() {
        let mut store = BlockStore::create();
        let mut a = Inode::new(FileType::Regular);
        a.set_file_size(1);
        a.put(&mut store, 0);
        let mut b = Inode::new(FileType::Directory);
        b.set_file_size(2);
        b.put(&mut store, 1);

        assert_eq!(Inode::get(&store, 0).file_size(), 1);
        assert_eq!(Inode::get(&store, 1).file_size(), 2);
        assert!(Inode::get(&store, 1).is_directory());
    }

    #[test]
    fn inodes_in_different_blocks_do_not_clobber() {
        let mut store = BlockStore::create();
        let mut a = Inode::new(FileType::Regular);
        a.set_file_size(7);
        a.put(&mut store, 0);
        let mut b = Inode::new(FileType::Regular);
        b.set_file_size(8);
        // Inode 8 lives in the second inode-table block, slot 0.
        b.put(&mut store, 8);

        assert_eq!(Inode::get(&store, 0).file_size(), 7);
        assert_eq!(Inode::get(&store, 8).file_size(), 8);
    }
}
