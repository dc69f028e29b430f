//! Virtual filesystem: byte store trait, in-memory store, permission
//! rules, glob expansion, and the sandbox facade.

mod glob;
mod memory;
mod perms;
mod store;
mod vfs;

pub use glob::brace_expand;
pub use memory::MemoryStore;
pub use perms::{Access, RuleSet};
pub use store::{DirEntry, FileStore, FileType, Metadata};
pub use vfs::VirtualFs;
