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

//! Maps a file's logical byte offsets onto physical blocks through the
//! direct, single-indirect and double-indirect pointer tree, and reads,
//! writes and frees through that map.
//!
//! Logical block boundaries: `[0, 6)` direct, `[6, 262)` single-indirect,
//! `[262, 65798)` double-indirect. An indirect block holds 256 `u16` block
//! ids; the double-indirect block holds 256 ids of such blocks.

use crate::block_store::{BlockId, BlockStore};
use crate::error::{FsError, FsResult};
use crate::inode::Inode;
use crate::layout::{
    BLOCK_SIZE, DIRECT_POINTERS, DOUBLE_INDIRECT_END, DOUBLE_INDIRECT_START, INDIRECT_START,
    POINTERS_PER_BLOCK,
};

fn read_pointers(store: &BlockStore, id: BlockId) -> [u16; POINTERS_PER_BLOCK] {
    let mut raw = [0u8; BLOCK_SIZE];
    store.read(id, &mut raw);
    let mut ptrs = [0u16; POINTERS_PER_BLOCK];
    for (i, p) in ptrs.iter_mut().enumerate() {
        *p = u16::from_ne_bytes([raw[i * 2], raw[i * 2 + 1]]);
    }
    ptrs
}

fn write_pointers(store: &mut BlockStore, id: BlockId, ptrs: &[u16; POINTERS_PER_BLOCK]) {
    let mut raw = [0u8; BLOCK_SIZE];
    for (i, p) in ptrs.iter().enumerate() {
        let b = p.to_ne_bytes();
        raw[i * 2] = b[0];
        raw[i * 2 + 1] = b[1];
    }
    store.write(id, &raw);
}

/// Resolves logical block `lb` to a physical block, without allocating.
/// Returns `None` if `lb` is out of range or any pointer on the path to it
/// is unallocated.
fn resolve_read(store: &BlockStore, inode: &Inode, lb: u64) -> Option<BlockId> {
    if lb < INDIRECT_START {
        let id = inode.direct_block(lb as usize);
        return (!id.is_none()).then_some(id);
    }
    if lb < DOUBLE_INDIRECT_START {
        let indirect = inode.indirect_block();
        if indirect.is_none() {
            return None;
        }
        let idx = (lb - INDIRECT_START) as usize;
        let id = BlockId(read_pointers(store, indirect)[idx]);
        return (!id.is_none()).then_some(id);
    }
    if lb < DOUBLE_INDIRECT_END {
        let double = inode.double_indirect_block();
        if double.is_none() {
            return None;
        }
        let offset = lb - DOUBLE_INDIRECT_START;
        let outer_idx = (offset / POINTERS_PER_BLOCK as u64) as usize;
        let inner_idx = (offset % POINTERS_PER_BLOCK as u64) as usize;
        let outer_id = BlockId(read_pointers(store, double)[outer_idx]);
        if outer_id.is_none() {
            return None;
        }
        let id = BlockId(read_pointers(store, outer_id)[inner_idx]);
        return (!id.is_none()).then_some(id);
    }
    None
}

/// Resolves logical block `lb` to a physical block, allocating the leaf
/// block and any indirect/double-indirect table blocks on the path to it
/// that don't exist yet.
fn ensure(store: &mut BlockStore, inode: &mut Inode, lb: u64) -> FsResult<BlockId> {
    if lb < INDIRECT_START {
        let existing = inode.direct_block(lb as usize);
        if !existing.is_none() {
            return Ok(existing);
        }
        let id = store.allocate().ok_or(FsError::Capacity)?;
        inode.set_direct_block(lb as usize, id);
        return Ok(id);
    }

    if lb < DOUBLE_INDIRECT_START {
        let idx = (lb - INDIRECT_START) as usize;
        let mut indirect = inode.indirect_block();
        if indirect.is_none() {
            indirect = store.allocate().ok_or(FsError::Capacity)?;
            write_pointers(store, indirect, &[0u16; POINTERS_PER_BLOCK]);
            inode.set_indirect_block(indirect);
        }
        let mut ptrs = read_pointers(store, indirect);
        let existing = BlockId(ptrs[idx]);
        if !existing.is_none() {
            return Ok(existing);
        }
        let id = store.allocate().ok_or(FsError::Capacity)?;
        ptrs[idx] = id.0;
        write_pointers(store, indirect, &ptrs);
        return Ok(id);
    }

    if lb < DOUBLE_INDIRECT_END {
        let offset = lb - DOUBLE_INDIRECT_START;
        let outer_idx = (offset / POINTERS_PER_BLOCK as u64) as usize;
        let inner_idx = (offset % POINTERS_PER_BLOCK as u64) as usize;

        let mut double = inode.double_indirect_block();
        if double.is_none() {
            double = store.allocate().ok_or(FsError::Capacity)?;
            write_pointers(store, double, &[0u16; POINTERS_PER_BLOCK]);
            inode.set_double_indirect_block(double);
        }

        let mut outer_ptrs = read_pointers(store, double);
        let mut outer_id = BlockId(outer_ptrs[outer_idx]);
        if outer_id.is_none() {
            outer_id = store.allocate().ok_or(FsError::Capacity)?;
            write_pointers(store, outer_id, &[0u16; POINTERS_PER_BLOCK]);
            outer_ptrs[outer_idx] = outer_id.0;
            write_pointers(store, double, &outer_ptrs);
        }

        let mut inner_ptrs = read_pointers(store, outer_id);
        let existing = BlockId(inner_ptrs[inner_idx]);
        if !existing.is_none() {
            return Ok(existing);
        }
        let id = store.allocate().ok_or(FsError::Capacity)?;
        inner_ptrs[inner_idx] = id.0;
        write_pointers(store, outer_id, &inner_ptrs);
        return Ok(id);
    }

    Err(FsError::Capacity)
}

/// Reads up to `buf.len()` bytes starting at `offset`, clamped to the
/// inode's current file size. Stops early — a short read, not an error — if
/// it reaches a logical block with no physical block behind it.
pub(crate) fn read_at(store: &BlockStore, inode: &Inode, offset: u64, buf: &mut [u8]) -> usize {
    let size = inode.file_size() as u64;
    if offset >= size {
        return 0;
    }
    let to_read = (buf.len() as u64).min(size - offset) as usize;
    let mut done = 0usize;
    while done < to_read {
        let pos = offset + done as u64;
        let lb = pos / BLOCK_SIZE as u64;
        let in_block = (pos % BLOCK_SIZE as u64) as usize;
        let chunk = (BLOCK_SIZE - in_block).min(to_read - done);

        let Some(id) = resolve_read(store, inode, lb) else {
            break;
        };
        let mut raw = [0u8; BLOCK_SIZE];
        store.read(id, &mut raw);
        buf[done..done + chunk].copy_from_slice(&raw[in_block..in_block + chunk]);
        done += chunk;
    }
    done
}

/// Writes `buf` starting at `offset`, allocating blocks as needed and
/// extending `inode`'s file size to `max(file_size, offset + written)`. A
/// write that runs out of space persists everything it managed to write
/// and returns that count; only a write that manages zero bytes is an
/// error.
pub(crate) fn write_at(
    store: &mut BlockStore,
    inode: &mut Inode,
    offset: u64,
    buf: &[u8],
) -> FsResult<usize> {
    let mut written = 0usize;
    while written < buf.len() {
        let pos = offset + written as u64;
        let lb = pos / BLOCK_SIZE as u64;
        let in_block = (pos % BLOCK_SIZE as u64) as usize;
        let chunk = (BLOCK_SIZE - in_block).min(buf.len() - written);

        let id = match ensure(store, inode, lb) {
            Ok(id) => id,
            Err(_) => break,
        };

        let mut raw = [0u8; BLOCK_SIZE];
        if in_block != 0 || chunk != BLOCK_SIZE {
            store.read(id, &mut raw);
        }
        raw[in_block..in_block + chunk].copy_from_slice(&buf[written..written + chunk]);
        store.write(id, &raw);
        written += chunk;
    }

    let new_size = (offset + written as u64).max(inode.file_size() as u64);
    inode.set_file_size(new_size as u32);

    if written == 0 && !buf.is_empty() {
        return Err(FsError::Capacity);
    }
    Ok(written)
}

/// Frees every data block reachable from `inode`: direct blocks, the
/// indirect block's leaves and the indirect block itself, and the
/// double-indirect block's inner tables, their leaves, and the
/// double-indirect block itself. Iterates outer-then-inner, the order that
/// actually matches the pointer tree's own nesting.
pub(crate) fn free_all(store: &mut BlockStore, inode: &Inode) {
    for i in 0..DIRECT_POINTERS {
        let id = inode.direct_block(i);
        if !id.is_none() {
            store.release(id);
        }
    }

    let indirect = inode.indirect_block();
    if !indirect.is_none() {
        for p in read_pointers(store, indirect) {
            let id = BlockId(p);
            if !id.is_none() {
                store.release(id);
            }
        }
        store.release(indirect);
    }

    let double = inode.double_indirect_block();
    if !double.is_none() {
        for outer_raw in read_pointers(store, double) {
            let outer_id = BlockId(outer_raw);
            if outer_id.is_none() {
                continue;
            }
            for p in read_pointers(store, outer_id) {
                let id = BlockId(p);
                if !id.is_none() {
                    store.release(id);
                }
            }
            store.release(outer_id);
        }
        store.release(double);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inode::FileType;

    #[test]
    fn direct_write_then_read_roundtrip() {
        let mut store = BlockStore::create();
        let mut inode = Inode::new(FileType::Regular);
        let payload = b"hello, inodefs";
        let written = write_at(&mut store, &mut inode, 0, payload).unwrap();
        assert_eq!(written, payload.len());
        assert_eq!(inode.file_size() as usize, payload.len());

        let mut buf = [0u8; 14];
        let read = read_at(&store, &inode, 0, &mut buf);
        assert_eq!(read, payload.len());
        assert_eq!(&buf, payload);
    }

    #[test]
    fn write_spans_direct_to_indirect_boundary() {
        let mut store = BlockStore::create();
        let mut inode = Inode::new(FileType::Regular);
        // Six direct blocks cover bytes [0, 3072). Write across the
        // boundary into the first indirect-mapped block.
        let payload = vec![0xab; BLOCK_SIZE * 2];
        let offset = (BLOCK_SIZE * 5) as u64;
        let written = write_at(&mut store, &mut inode, offset, &payload).unwrap();
        assert_eq!(written, payload.len());
        assert!(!inode.indirect_block().is_none());

        let mut buf = vec![0u8; payload.len()];
        let read = read_at(&store, &inode, offset, &mut buf);
        assert_eq!(read, payload.len());
        assert_eq!(buf, payload);
    }

    #[test]
    fn ensure_allocates_through_double_indirect() {
        let mut store = BlockStore::create();
        let mut inode = Inode::new(FileType::Regular);
        let lb = DOUBLE_INDIRECT_START + (POINTERS_PER_BLOCK as u64) + 3;
        let id = ensure(&mut store, &mut inode, lb).unwrap();
        assert!(!id.is_none());
        assert!(!inode.double_indirect_block().is_none());
        assert_eq!(resolve_read(&store, &inode, lb), Some(id));
        // Requesting the same logical block again returns the same
        // physical block rather than allocating a second one.
        assert_eq!(ensure(&mut store, &mut inode, lb).unwrap(), id);
    }

    #[test]
    fn read_past_file_size_is_empty() {
        let store = BlockStore::create();
        let inode = Inode::new(FileType::Regular);
        let mut buf = [0u8; 8];
        assert_eq!(read_at(&store, &inode, 0, &mut buf), 0);
    }

    #[test]
    fn read_stops_short_at_unallocated_block() {
        let mut store = BlockStore::create();
        let mut inode = Inode::new(FileType::Regular);
        write_at(&mut store, &mut inode, 0, b"only one block").unwrap();
        // Claim a larger size than is actually backed by blocks.
        inode.set_file_size((BLOCK_SIZE * 3) as u32);

        let mut buf = vec![0u8; BLOCK_SIZE * 3];
        let read = read_at(&store, &inode, 0, &mut buf);
        assert_eq!(read, BLOCK_SIZE);
    }

    #[test]
    fn free_all_releases_direct_indirect_and_double_indirect_blocks() {
        let mut store = BlockStore::create();
        let mut inode = Inode::new(FileType::Regular);
        let before = store.get_free_blocks();

        write_at(&mut store, &mut inode, 0, b"direct").unwrap();
        let lb = DOUBLE_INDIRECT_START + 1;
        ensure(&mut store, &mut inode, lb).unwrap();
        assert!(store.get_free_blocks() < before);

        free_all(&mut store, &inode);
        assert_eq!(store.get_free_blocks(), before);
    }

    #[test]
    fn write_that_exhausts_space_persists_partial_bytes() {
        let mut store = BlockStore::create();
        let mut inode = Inode::new(FileType::Regular);
        while store.allocate().is_some() {}

        let err = write_at(&mut store, &mut inode, 0, b"x").unwrap_err();
        assert!(matches!(err, FsError::Capacity));
        assert_eq!(inode.file_size(), 0);
    }
}
