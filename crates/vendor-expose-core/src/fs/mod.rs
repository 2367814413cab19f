//! Filesystem primitives shared by the exposure methods and the registry.

pub mod link;
pub mod sweep;
pub mod tree;
pub mod tree_hash;

pub use link::{create_dir_symlink, relative_link_target};
pub use sweep::{prune_empty_parents, sweep_unclaimed};
pub use tree::{
    copy_tree, entry_exists, is_symlink, remove_path, remove_path_if_exists, remove_symlink,
    replace_with, resolves_within, symlinked_ancestor, unique_temp_path,
};
pub use tree_hash::{hash_tree, trees_match};
