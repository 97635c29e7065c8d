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

//! The descriptor table: open files, never persisted to the image. 256
//! slots of `(inode_number, position)`, tracked by a 256-bit allocation
//! bitmap rather than by `Option` — the same borrowed-bit-view shape the
//! superblock's inode bitmap and the block store's FBM use, just
//! heap-owned instead of overlaid on a serialized block.

use crate::bitmap::OwnedBitmap;
use crate::error::{FsError, FsResult};
use crate::layout::MAX_DESCRIPTORS;

/// A handle to an open file. Opaque outside this crate; meaningless once
/// closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fd(pub(crate) u8);

#[derive(Clone, Copy)]
struct Slot {
    inode_number: u8,
    position: u64,
}

pub(crate) struct DescriptorTable {
    slots: Vec<Slot>,
    bitmap: OwnedBitmap,
}

impl DescriptorTable {
    pub(crate) fn new() -> Self {
        Self {
            slots: vec![
                Slot {
                    inode_number: 0,
                    position: 0
                };
                MAX_DESCRIPTORS
            ],
            bitmap: OwnedBitmap::new(MAX_DESCRIPTORS),
        }
    }

    fn checked(&mut self, fd: Fd) -> FsResult<usize> {
        let slot = fd.0 as usize;
        if slot >= MAX_DESCRIPTORS || !self.bitmap.view().test(slot).unwrap_or(false) {
            return Err(FsError::State);
        }
        Ok(slot)
    }

    /// Allocates the lowest-numbered free slot for `inode_number`, with the
    /// read/write position starting at 0.
    pub(crate) fn open(&mut self, inode_number: u8) -> FsResult<Fd> {
        let slot = self.bitmap.view().ffz().ok_or(FsError::Capacity)?;
        self.bitmap.view().set(slot).expect("ffz only returns in-range bits");
        self.slots[slot] = Slot {
            inode_number,
            position: 0,
        };
        Ok(Fd(slot as u8))
    }

    /// Frees `fd`. Fails if it isn't currently open.
    pub(crate) fn close(&mut self, fd: Fd) -> FsResult<()> {
        let slot = self.checked(fd)?;
        self.bitmap.view().reset(slot).expect("checked above");
        self.slots[slot] = Slot {
            inode_number: 0,
            position: 0,
        };
        Ok(())
    }

    pub(crate) fn inode_number(&mut self, fd: Fd) -> FsResult<u8> {
        let slot = self.checked(fd)?;
        Ok(self.slots[slot].inode_number)
    }

    pub(crate) fn position(&mut self, fd: Fd) -> FsResult<u64> {
        let slot = self.checked(fd)?;
        Ok(self.slots[slot].position)
    }

    pub(crate) fn set_position(&mut self, fd: Fd, position: u64) -> FsResult<()> {
        let slot = self.checked(fd)?;
        self.slots[slot].position = position;
        Ok(())
    }

    /// Closes every descriptor currently open on `inode_number`. Used when
    /// removing a file out from under still-open handles.
    pub(crate) fn close_all_for_inode(&mut self, inode_number: u8) {
        for slot in 0..MAX_DESCRIPTORS {
            if self.bitmap.view().test(slot).unwrap_or(false)
                && self.slots[slot].inode_number == inode_number
            {
                self.bitmap.view().reset(slot).expect("in range");
                self.slots[slot] = Slot {
                    inode_number: 0,
                    position: 0,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_close_roundtrip() {
        let mut table = DescriptorTable::new();
        let fd = table.open(7).unwrap();
        assert_eq!(table.inode_number(fd).unwrap(), 7);
        assert_eq!(table.position(fd).unwrap(), 0);
        table.close(fd).unwrap();
        assert!(matches!(table.inode_number(fd), Err(FsError::State)));
    }

    #[test]
    fn close_zeroes_the_slot() {
        let mut table = DescriptorTable::new();
        let fd = table.open(7).unwrap();
        table.set_position(fd, 512).unwrap();
        table.close(fd).unwrap();
        assert_eq!(table.slots[fd.0 as usize].inode_number, 0);
        assert_eq!(table.slots[fd.0 as usize].position, 0);
    }

    #[test]
    fn seek_position_persists_until_closed() {
        let mut table = DescriptorTable::new();
        let fd = table.open(3).unwrap();
        table.set_position(fd, 512).unwrap();
        assert_eq!(table.position(fd).unwrap(), 512);
    }

    #[test]
    fn exhausts_after_256_opens() {
        let mut table = DescriptorTable::new();
        for _ in 0..MAX_DESCRIPTORS {
            table.open(1).unwrap();
        }
        assert!(matches!(table.open(1), Err(FsError::Capacity)));
    }

    #[test]
    fn double_close_fails() {
        let mut table = DescriptorTable::new();
        let fd = table.open(5).unwrap();
        table.close(fd).unwrap();
        assert!(matches!(table.close(fd), Err(FsError::State)));
    }

    #[test]
    fn close_all_for_inode_closes_every_matching_descriptor() {
        let mut table = DescriptorTable::new();
        let a = table.open(9).unwrap();
        let b = table.open(9).unwrap();
        let other = table.open(2).unwrap();

        table.close_all_for_inode(9);

        assert!(matches!(table.inode_number(a), Err(FsError::State)));
        assert!(matches!(table.inode_number(b), Err(FsError::State)));
        assert_eq!(table.inode_number(other).unwrap(), 2);
    }
}
