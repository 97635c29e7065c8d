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

//! Error taxonomy shared by every public operation.

use std::fmt;
use std::io;

/// An error returned by a filesystem operation.
#[derive(Debug)]
pub enum FsError {
    /// A null/invalid path, empty string, bad type, or out-of-range descriptor.
    Argument,
    /// A path component does not exist.
    NotFound,
    /// A directory was expected where a file was found, or vice versa.
    WrongType,
    /// No free inode, no free data block, directory full, or no free descriptor.
    Capacity,
    /// The descriptor isn't open, or the operation would remove the root or a
    /// non-empty directory.
    State,
    /// The underlying host file failed to read or write.
    Io(io::Error),
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument => write!(f, "invalid argument"),
            Self::NotFound => write!(f, "no such file or directory"),
            Self::WrongType => write!(f, "unexpected file type"),
            Self::Capacity => write!(f, "no space left"),
            Self::State => write!(f, "invalid filesystem state for this operation"),
            Self::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FsError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Result type returned by every public operation.
pub type FsResult<T> = Result<T, FsError>;
