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

//! [`Fs`]: the mounted handle tying the block store, inode table, directory
//! layer, file-data addressing and descriptor table together into the
//! public, POSIX-flavored surface of this crate.

use std::path::Path;

use crate::block_store::{BlockId, BlockStore};
use crate::data;
use crate::descriptor::{DescriptorTable, Fd};
use crate::directory::{DirEntry, DirectoryBlock, SlotError};
use crate::error::{FsError, FsResult};
use crate::inode::{FileType, Inode};
use crate::layout::{BLOCK_SIZE, INODE_TABLE_BLOCKS, INODE_TABLE_START_BLOCK, ROOT_INODE, SUPERBLOCK_BLOCK};
use crate::path;
use crate::superblock::Superblock;

/// The reference point a [`Fs::seek`] offset is relative to.
#[derive(Debug, Clone, Copy)]
pub enum Whence {
    Set,
    Cur,
    End,
}

/// A mounted filesystem image. Holds the whole 32 MiB image in memory;
/// mutations are visible to subsequent operations on this handle
/// immediately but only reach disk when [`Fs::serialize`] is called.
pub struct Fs {
    store: BlockStore,
    descriptors: DescriptorTable,
}

fn map_slot_error(e: SlotError) -> FsError {
    match e {
        SlotError::Duplicate => FsError::Argument,
        SlotError::Full => FsError::Capacity,
    }
}

impl Fs {
    /// Lays out a brand new image: superblock, inode table and an empty
    /// root directory, then immediately writes it to `path`. The returned
    /// handle is mounted and ready to use; its image is durable on disk the
    /// moment this call returns.
    pub fn format(path: impl AsRef<Path>) -> FsResult<Self> {
        let mut store = BlockStore::create();
        store.request(BlockId(SUPERBLOCK_BLOCK as u16));
        for b in INODE_TABLE_START_BLOCK..INODE_TABLE_START_BLOCK + INODE_TABLE_BLOCKS {
            store.request(BlockId(b as u16));
        }

        let root_block = store.allocate().ok_or(FsError::Capacity)?;
        DirectoryBlock::empty().write(&mut store, root_block);

        let mut root_inode = Inode::new(FileType::Directory);
        root_inode.set_direct_block(0, root_block);
        root_inode.set_file_size(BLOCK_SIZE as u32);
        root_inode.put(&mut store, ROOT_INODE);

        let volume_id = uuid::Uuid::new_v4().into_bytes();
        let mut sb = Superblock::new(store.get_free_blocks(), store.get_total_blocks(), volume_id);
        sb.write(&mut store);

        let fs = Self {
            store,
            descriptors: DescriptorTable::new(),
        };
        fs.serialize(&path)?;
        Ok(fs)
    }

    /// Loads an existing image from `path` into memory.
    pub fn mount(path: impl AsRef<Path>) -> FsResult<Self> {
        let store = BlockStore::open(path)?;
        Ok(Self {
            store,
            descriptors: DescriptorTable::new(),
        })
    }

    /// Drops this handle. Any mutation since the last [`Fs::serialize`] is
    /// discarded.
    pub fn unmount(self) -> FsResult<()> {
        Ok(())
    }

    /// Writes the whole in-memory image to `path`.
    pub fn serialize(&self, path: impl AsRef<Path>) -> FsResult<()> {
        self.store.serialize(path)?;
        Ok(())
    }

    fn allocate_inode(&mut self) -> FsResult<u8> {
        let mut sb = Superblock::read(&self.store);
        let slot = sb.inode_bitmap_mut().ffz().ok_or(FsError::Capacity)?;
        sb.inode_bitmap_mut().set(slot).expect("ffz only returns in-range bits");
        sb.write(&mut self.store);
        Ok(slot as u8)
    }

    fn free_inode(&mut self, inode_num: u8) {
        let mut sb = Superblock::read(&self.store);
        let _ = sb.inode_bitmap_mut().reset(inode_num as usize);
        sb.write(&mut self.store);
        Inode::empty().put(&mut self.store, inode_num);
    }

    /// Creates `path` as a new, empty file or directory. The parent must
    /// already exist and must not already contain an entry of that name.
    pub fn create(&mut self, path: &str, kind: FileType) -> FsResult<()> {
        let resolved = path::resolve_parent(&self.store, path)?;
        let slot = resolved
            .parent_dir
            .find_slot_for(&resolved.name)
            .map_err(map_slot_error)?;

        let dir_block = if kind == FileType::Directory {
            let b = self.store.allocate().ok_or(FsError::Capacity)?;
            DirectoryBlock::empty().write(&mut self.store, b);
            Some(b)
        } else {
            None
        };

        let inode_num = match self.allocate_inode() {
            Ok(n) => n,
            Err(e) => {
                if let Some(b) = dir_block {
                    self.store.release(b);
                }
                return Err(e);
            }
        };

        let mut inode = Inode::new(kind);
        if let Some(b) = dir_block {
            inode.set_direct_block(0, b);
            inode.set_file_size(BLOCK_SIZE as u32);
        }
        inode.put(&mut self.store, inode_num);

        let mut parent_dir = resolved.parent_dir;
        parent_dir.insert(slot, &resolved.name, inode_num, kind);
        parent_dir.write(&mut self.store, resolved.parent_inode.direct_block(0));
        Ok(())
    }

    /// Opens `path`, returning a descriptor positioned at offset 0. The
    /// target must be a regular file; opening a directory is rejected.
    pub fn open(&mut self, path: &str) -> FsResult<Fd> {
        let resolved = path::resolve_parent(&self.store, path)?;
        let idx = resolved.parent_dir.find(&resolved.name).ok_or(FsError::NotFound)?;
        let entry = resolved.parent_dir.entries()[idx];
        if entry.file_type() != FileType::Regular {
            return Err(FsError::WrongType);
        }
        self.descriptors.open(entry.inode_number())
    }

    /// Closes `fd`. Fails if it isn't currently open.
    pub fn close(&mut self, fd: Fd) -> FsResult<()> {
        self.descriptors.close(fd)
    }

    /// Reads from `fd`'s current position, advancing it by the number of
    /// bytes actually read.
    pub fn read(&mut self, fd: Fd, buf: &mut [u8]) -> FsResult<usize> {
        let inode_num = self.descriptors.inode_number(fd)?;
        let inode = Inode::get(&self.store, inode_num);
        if inode.is_directory() {
            return Err(FsError::WrongType);
        }
        let pos = self.descriptors.position(fd)?;
        let n = data::read_at(&self.store, &inode, pos, buf);
        self.descriptors.set_position(fd, pos + n as u64)?;
        Ok(n)
    }

    /// Writes to `fd`'s current position, advancing it by the number of
    /// bytes actually written and extending the file's size as needed.
    pub fn write(&mut self, fd: Fd, buf: &[u8]) -> FsResult<usize> {
        let inode_num = self.descriptors.inode_number(fd)?;
        let mut inode = Inode::get(&self.store, inode_num);
        if inode.is_directory() {
            return Err(FsError::WrongType);
        }
        let pos = self.descriptors.position(fd)?;
        let n = data::write_at(&mut self.store, &mut inode, pos, buf)?;
        inode.touch_modified();
        inode.put(&mut self.store, inode_num);
        self.descriptors.set_position(fd, pos + n as u64)?;
        Ok(n)
    }

    /// Repositions `fd`. The result is clamped to `[0, file_size]`: seeking
    /// before the start of the file lands at `0`, seeking past the end
    /// lands at `file_size`.
    pub fn seek(&mut self, fd: Fd, offset: i64, whence: Whence) -> FsResult<u64> {
        let inode_num = self.descriptors.inode_number(fd)?;
        let cur = self.descriptors.position(fd)?;
        let file_size = Inode::get(&self.store, inode_num).file_size() as i64;
        let base: i64 = match whence {
            Whence::Set => 0,
            Whence::Cur => cur as i64,
            Whence::End => file_size,
        };
        let new_pos = base.checked_add(offset).unwrap_or(i64::MIN).clamp(0, file_size);
        self.descriptors.set_position(fd, new_pos as u64)?;
        Ok(new_pos as u64)
    }

    /// Removes `path`. A directory may only be removed if it's empty.
    /// Forcibly closes any descriptor still open on the removed file.
    pub fn remove(&mut self, path: &str) -> FsResult<()> {
        let resolved = path::resolve_parent(&self.store, path)?;
        let idx = resolved.parent_dir.find(&resolved.name).ok_or(FsError::NotFound)?;
        let inode_num = resolved.parent_dir.entries()[idx].inode_number();

        if inode_num == ROOT_INODE {
            return Err(FsError::State);
        }

        let inode = Inode::get(&self.store, inode_num);
        if inode.is_directory() {
            let block = inode.direct_block(0);
            if !DirectoryBlock::read(&self.store, block).is_empty() {
                return Err(FsError::State);
            }
            self.store.release(block);
        } else {
            data::free_all(&mut self.store, &inode);
        }

        self.free_inode(inode_num);
        self.descriptors.close_all_for_inode(inode_num);

        let mut parent_dir = resolved.parent_dir;
        parent_dir.remove(idx);
        parent_dir.write(&mut self.store, resolved.parent_inode.direct_block(0));
        Ok(())
    }

    /// Moves the entry named by `src` to `dst`, which must not already
    /// exist.
    pub fn rename(&mut self, src: &str, dst: &str) -> FsResult<()> {
        let src_resolved = path::resolve_parent(&self.store, src)?;
        let src_idx = src_resolved
            .parent_dir
            .find(&src_resolved.name)
            .ok_or(FsError::NotFound)?;
        let entry = src_resolved.parent_dir.entries()[src_idx];
        let inode_num = entry.inode_number();
        let kind = entry.file_type();

        let dst_resolved = path::resolve_parent(&self.store, dst)?;
        let dst_slot = dst_resolved
            .parent_dir
            .find_slot_for(&dst_resolved.name)
            .map_err(map_slot_error)?;

        if src_resolved.parent_num == dst_resolved.parent_num {
            let mut dir = src_resolved.parent_dir;
            dir.remove(src_idx);
            dir.insert(dst_slot, &dst_resolved.name, inode_num, kind);
            dir.write(&mut self.store, src_resolved.parent_inode.direct_block(0));
        } else {
            let mut src_dir = src_resolved.parent_dir;
            src_dir.remove(src_idx);
            src_dir.write(&mut self.store, src_resolved.parent_inode.direct_block(0));

            let mut dst_dir = dst_resolved.parent_dir;
            dst_dir.insert(dst_slot, &dst_resolved.name, inode_num, kind);
            dst_dir.write(&mut self.store, dst_resolved.parent_inode.direct_block(0));
        }
        Ok(())
    }

    /// Lists the entries of the directory at `path` (`"/"` for the root).
    pub fn read_dir(&mut self, path: &str) -> FsResult<Vec<DirEntry>> {
        let dir = if path == "/" {
            let root = Inode::get(&self.store, ROOT_INODE);
            DirectoryBlock::read(&self.store, root.direct_block(0))
        } else {
            let resolved = path::resolve_parent(&self.store, path)?;
            let idx = resolved.parent_dir.find(&resolved.name).ok_or(FsError::NotFound)?;
            let entry = resolved.parent_dir.entries()[idx];
            if entry.file_type() != FileType::Directory {
                return Err(FsError::WrongType);
            }
            let inode = Inode::get(&self.store, entry.inode_number());
            DirectoryBlock::read(&self.store, inode.direct_block(0))
        };

        Ok(dir
            .entries()
            .iter()
            .filter(|e| !e.is_free())
            .map(|e| DirEntry {
                name: e.name().to_owned(),
                inode_number: e.inode_number(),
                is_directory: e.file_type() == FileType::Directory,
            })
            .collect())
    }
}
