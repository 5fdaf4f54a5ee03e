//! Instruction metadata registry.
//!
//! Side tables of per-instruction facts that do not live on the instruction
//! itself. The only category the LSU consults is the memory-access table:
//! instructions that carry a [`MdToken`] resolve it here to a [`MemAccess`]
//! describing the byte ranges they touch. The registry is populated before
//! simulation starts and is read-only afterwards; the LSU shares it through
//! an `Rc` handle.

use std::collections::HashMap;

use crate::lsu::access::MemAccess;

/// Token an instruction carries to look up its registry entries.
pub type MdToken = u32;

/// Registry of per-instruction metadata, keyed by token.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    mem_accesses: HashMap<MdToken, MemAccess>,
    next_token: MdToken,
}

impl MetadataRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a memory access and returns the token that resolves it.
    pub fn add_mem_access(&mut self, access: MemAccess) -> MdToken {
        let token = self.next_token;
        self.next_token += 1;
        self.mem_accesses.insert(token, access);
        token
    }

    /// Appends a sub-access to an already registered entry.
    ///
    /// Used for compound instructions whose accesses are discovered one at a
    /// time. The entry must exist.
    pub fn append_mem_access(&mut self, token: MdToken, is_store: bool, addr: u64, size: u32) {
        let entry = self
            .mem_accesses
            .get_mut(&token)
            .expect("no memory access registered under token");
        entry.append(is_store, addr, size);
    }

    /// Looks up the memory access registered under `token`.
    pub fn mem_access(&self, token: MdToken) -> Option<&MemAccess> {
        self.mem_accesses.get(&token)
    }

    /// Number of registered memory accesses.
    pub fn len(&self) -> usize {
        self.mem_accesses.len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.mem_accesses.is_empty()
    }
}
