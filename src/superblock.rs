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

//! Block 0: the superblock. Holds the inode-allocation bitmap (a borrowed
//! overlay view, never an independent allocation) and a handful of
//! descriptive counters.

use std::mem::size_of;
use std::slice;

use crate::bitmap::Bitmap;
use crate::block_store::{BlockId, BlockStore};
use crate::layout::{BLOCK_SIZE, SUPERBLOCK_BLOCK, TOTAL_INODES};

/// On-disk superblock. 512 bytes, matching one block exactly: a 32-byte
/// (256-bit) inode bitmap, three `u64` counters, a 16-byte volume id, and
/// the remainder as reserved padding.
#[repr(C, packed)]
pub(crate) struct Superblock {
    inode_bitmap: [u8; 32],
    free_blocks: u64,
    total_blocks: u64,
    block_size: u64,
    volume_id: [u8; 16],
    _reserved: [u8; 440],
}

const _: () = assert!(size_of::<Superblock>() == BLOCK_SIZE);

impl Superblock {
    /// Builds a freshly-formatted superblock: bit 0 (the root inode) set,
    /// counters reflecting a brand new image, and a random volume id.
    pub(crate) fn new(free_blocks: u64, total_blocks: u64, volume_id: [u8; 16]) -> Self {
        let mut sb = Self {
            inode_bitmap: [0; 32],
            free_blocks,
            total_blocks,
            block_size: BLOCK_SIZE as u64,
            volume_id,
            _reserved: [0; 440],
        };
        sb.inode_bitmap_mut()
            .set(0)
            .expect("bit 0 is always in range");
        sb
    }

    /// Reads the superblock out of block 0.
    pub(crate) fn read(store: &BlockStore) -> Self {
        let mut sb: Self = unsafe { std::mem::zeroed() };
        let dst = unsafe {
            slice::from_raw_parts_mut(&mut sb as *mut Self as *mut u8, size_of::<Self>())
        };
        store.read(BlockId(SUPERBLOCK_BLOCK as u16), dst.try_into().unwrap());
        sb
    }

    /// Writes this superblock back into block 0.
    pub(crate) fn write(&self, store: &mut BlockStore) {
        let src = unsafe {
            slice::from_raw_parts(self as *const Self as *const u8, size_of::<Self>())
        };
        store.write(BlockId(SUPERBLOCK_BLOCK as u16), src.try_into().unwrap());
    }

    /// A view over the 256-bit inode-allocation bitmap embedded in this
    /// superblock.
    pub(crate) fn inode_bitmap_mut(&mut self) -> Bitmap<'_> {
        Bitmap::overlay(&mut self.inode_bitmap, TOTAL_INODES)
    }

    pub(crate) fn inode_bitmap(&self) -> &[u8; 32] {
        &self.inode_bitmap
    }

    pub(crate) fn free_blocks(&self) -> u64 {
        self.free_blocks
    }

    pub(crate) fn set_free_blocks(&mut self, n: u64) {
        self.free_blocks = n;
    }

    pub(crate) fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    pub(crate) fn volume_id(&self) -> [u8; 16] {
        self.volume_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_superblock_has_root_bit_set() {
        let mut sb = Superblock::new(100, 200, [7; 16]);
        assert!(sb.inode_bitmap_mut().test(0).unwrap());
        assert!(!sb.inode_bitmap_mut().test(1).unwrap());
    }

    #[test]
    fn write_then_read_roundtrips() {
        let mut store = BlockStore::create();
        let mut sb = Superblock::new(111, 222, [9; 16]);
        sb.inode_bitmap_mut().set(5).unwrap();
        sb.write(&mut store);

        let read_back = Superblock::read(&store);
        assert_eq!(read_back.free_blocks(), 111);
        assert_eq!(read_back.total_blocks(), 222);
        assert_eq!(read_back.volume_id(), [9; 16]);
        assert!(read_back.inode_bitmap()[0] & 0b0010_0001 == 0b0010_0001);
    }
}
