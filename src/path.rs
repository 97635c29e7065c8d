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

//! Resolves an absolute, `/`-separated path to its parent directory, one
//! component at a time. Iterative, not recursive, so traversal depth never
//! grows the call stack.

use crate::block_store::BlockStore;
use crate::directory::DirectoryBlock;
use crate::error::{FsError, FsResult};
use crate::inode::{FileType, Inode};
use crate::layout::{MAX_NAME_LEN, ROOT_INODE};

/// What a path resolved down to: the parent directory's inode number, its
/// inode, a copy of its directory block, and the final path component —
/// looked up in neither; callers decide create-vs-lookup semantics from
/// here.
pub(crate) struct Resolved {
    pub(crate) parent_num: u8,
    pub(crate) parent_inode: Inode,
    pub(crate) parent_dir: DirectoryBlock,
    pub(crate) name: String,
}

fn validate_component(component: &str) -> FsResult<()> {
    if component.is_empty() || component.len() > MAX_NAME_LEN {
        return Err(FsError::Argument);
    }
    Ok(())
}

/// Splits `path` into its components, validating each one. Fails on a
/// malformed path (empty, or not starting with `/`) or an over-length
/// component.
fn split(path: &str) -> FsResult<Vec<&str>> {
    if path.is_empty() || !path.starts_with('/') {
        return Err(FsError::Argument);
    }
    let components: Vec<&str> = path[1..].split('/').collect();
    for c in &components {
        validate_component(c)?;
    }
    Ok(components)
}

/// Walks `path` down to its parent directory. The final component is
/// returned unresolved (it may or may not exist, depending on the caller).
pub(crate) fn resolve_parent(store: &BlockStore, path: &str) -> FsResult<Resolved> {
    let components = split(path)?;

    let mut current_num = ROOT_INODE;
    let mut current_inode = Inode::get(store, current_num);
    let mut current_dir = DirectoryBlock::read(store, current_inode.direct_block(0));

    let (intermediate, last) = components.split_at(components.len() - 1);
    let name = last[0].to_owned();

    for component in intermediate {
        let idx = current_dir.find(component).ok_or(FsError::NotFound)?;
        let entry = current_dir.entries()[idx];
        if entry.file_type() != FileType::Directory {
            return Err(FsError::WrongType);
        }
        current_num = entry.inode_number();
        current_inode = Inode::get(store, current_num);
        current_dir = DirectoryBlock::read(store, current_inode.direct_block(0));
    }

    Ok(Resolved {
        parent_num: current_num,
        parent_inode: current_inode,
        parent_dir: current_dir,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_store::BlockId;
    use crate::inode::FileType;

    fn fresh_root() -> BlockStore {
        let mut store = BlockStore::create();
        assert!(store.request(BlockId(0)));
        for _ in 0..32 {
            store.allocate().unwrap();
        }
        let root_block = store.allocate().unwrap();
        let mut root_inode = Inode::new(FileType::Directory);
        root_inode.set_file_size(512);
        root_inode.set_direct_block(0, root_block);
        root_inode.put(&mut store, ROOT_INODE);
        DirectoryBlock::empty().write(&mut store, root_block);
        store
    }

    #[test]
    fn rejects_empty_and_relative_paths() {
        let store = fresh_root();
        assert!(matches!(resolve_parent(&store, ""), Err(FsError::Argument)));
        assert!(matches!(
            resolve_parent(&store, "a/b"),
            Err(FsError::Argument)
        ));
    }

    #[test]
    fn rejects_overlong_component() {
        let store = fresh_root();
        let long = "a".repeat(64);
        let path = format!("/{long}");
        assert!(matches!(
            resolve_parent(&store, &path),
            Err(FsError::Argument)
        ));
    }

    #[test]
    fn resolves_top_level_name_against_root() {
        let store = fresh_root();
        let resolved = resolve_parent(&store, "/a").unwrap();
        assert_eq!(resolved.parent_num, ROOT_INODE);
        assert_eq!(resolved.name, "a");
    }

    #[test]
    fn missing_intermediate_component_fails() {
        let store = fresh_root();
        assert!(matches!(
            resolve_parent(&store, "/missing/b"),
            Err(FsError::NotFound)
        ));
    }

    #[test]
    fn intermediate_component_must_be_directory() {
        let mut store = fresh_root();
        let root_block = Inode::get(&store, ROOT_INODE).direct_block(0);
        let mut root_dir = DirectoryBlock::read(&store, root_block);
        let slot = root_dir.find_slot_for("f").unwrap();

        let mut file_inode = Inode::new(FileType::Regular);
        file_inode.set_file_size(0);
        file_inode.put(&mut store, 1);
        root_dir.insert(slot, "f", 1, FileType::Regular);
        root_dir.write(&mut store, root_block);

        assert!(matches!(
            resolve_parent(&store, "/f/x"),
            Err(FsError::WrongType)
        ));
    }
}
