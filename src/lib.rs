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

//! A single-file, inode-based filesystem image.
//!
//! An image is one host file laid out as a fixed array of 512-byte blocks: a
//! superblock, a packed inode table, a pool of data blocks, and a free block
//! map (FBM) bitmap occupying the image's last 16 blocks. [`Fs`] mounts an
//! image and exposes POSIX-flavored operations (create, open, read, write,
//! seek, remove, rename, directory listing) on top of it.
//!
//! The filesystem is single-threaded and non-reentrant: callers must not
//! invoke two operations on the same [`Fs`] concurrently. There is no
//! journaling or crash recovery, no permission enforcement (mode bits are
//! stored but never checked), and no hard or soft links.

mod bitmap;
mod block_store;
mod data;
mod descriptor;
mod directory;
mod error;
mod fs;
mod inode;
mod layout;
mod path;
mod superblock;

pub use descriptor::Fd;
pub use directory::DirEntry;
pub use error::{FsError, FsResult};
pub use fs::{Fs, Whence};
pub use inode::FileType;
