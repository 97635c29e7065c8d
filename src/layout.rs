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

//! Fixed image geometry. The format has no runtime configuration surface:
//! every size below is a structural constant of the on-disk layout.

/// The size of one block, in bytes.
pub(crate) const BLOCK_SIZE: usize = 512;

/// The total number of blocks in an image.
pub(crate) const TOTAL_BLOCKS: usize = 65536;

/// The total size of an image, in bytes.
pub(crate) const IMAGE_SIZE: usize = TOTAL_BLOCKS * BLOCK_SIZE;

/// The number of blocks reserved for the free block map at the tail of the
/// image.
pub(crate) const FBM_BLOCKS: usize = 16;

/// The block index of the first FBM block.
pub(crate) const FBM_START_BLOCK: usize = TOTAL_BLOCKS - FBM_BLOCKS;

/// The byte offset of the FBM within the image buffer.
pub(crate) const FBM_OFFSET: usize = FBM_START_BLOCK * BLOCK_SIZE;

/// The block index of the superblock.
pub(crate) const SUPERBLOCK_BLOCK: usize = 0;

/// The block index of the first inode-table block.
pub(crate) const INODE_TABLE_START_BLOCK: usize = 1;

/// The number of blocks making up the inode table.
pub(crate) const INODE_TABLE_BLOCKS: usize = 32;

/// The size of one on-disk inode, in bytes.
pub(crate) const INODE_SIZE: usize = 64;

/// The number of inodes packed into one inode-table block.
pub(crate) const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;

/// The total number of inodes an image can hold.
pub(crate) const TOTAL_INODES: usize = INODE_TABLE_BLOCKS * INODES_PER_BLOCK;

/// The inode number of the root directory.
pub(crate) const ROOT_INODE: u8 = 0;

/// The first block index of the data region (just past the inode table).
pub(crate) const DATA_REGION_START_BLOCK: usize =
    INODE_TABLE_START_BLOCK + INODE_TABLE_BLOCKS;

/// The number of direct block pointers in an inode.
pub(crate) const DIRECT_POINTERS: usize = 6;

/// The number of block ids held by one indirect block (512 bytes / 2-byte ids).
pub(crate) const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 2;

/// The first logical block index covered by the single-indirect pointer.
pub(crate) const INDIRECT_START: u64 = DIRECT_POINTERS as u64;

/// The first logical block index covered by the double-indirect pointer.
pub(crate) const DOUBLE_INDIRECT_START: u64 =
    INDIRECT_START + POINTERS_PER_BLOCK as u64;

/// One past the last logical block index reachable through the double-indirect
/// pointer.
pub(crate) const DOUBLE_INDIRECT_END: u64 =
    DOUBLE_INDIRECT_START + (POINTERS_PER_BLOCK * POINTERS_PER_BLOCK) as u64;

/// The maximum number of entries held by one directory block.
pub(crate) const DIR_ENTRIES_PER_BLOCK: usize = 7;

/// The maximum length of one path component, in bytes (excluding the NUL
/// terminator).
pub(crate) const MAX_NAME_LEN: usize = 63;

/// The number of descriptor-table slots.
pub(crate) const MAX_DESCRIPTORS: usize = 256;
