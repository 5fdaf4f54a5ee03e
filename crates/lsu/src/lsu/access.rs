//! Memory-access descriptors.
//!
//! A [`MemAccess`] describes the byte range touched by one memory instruction
//! and whether it writes memory. Compound instructions (one instruction, many
//! accesses) bundle additional sub-accesses behind a shared handle; the bundle
//! keeps both the union interval for coarse overlap pruning and the individual
//! sub-accesses for precise alias checks.

use std::fmt;
use std::sync::Arc;

/// A single contiguous byte-range access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubAccess {
    /// Whether this access writes memory.
    pub is_store: bool,
    /// Start address of the access.
    pub addr: u64,
    /// Access size in bytes.
    pub size: u32,
}

impl SubAccess {
    /// Returns true if the two byte ranges `[addr, addr+size)` overlap.
    #[inline]
    pub fn overlaps(&self, other: &SubAccess) -> bool {
        self.addr < other.addr + other.size as u64 && other.addr < self.addr + self.size as u64
    }
}

/// Extra sub-accesses of a compound instruction.
///
/// The first element is always the access the [`MemAccess`] was created with.
/// `extended_addr`/`extended_size` form the smallest interval covering every
/// sub-access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundledAccesses {
    /// Left edge of the union interval.
    pub extended_addr: u64,
    /// Length of the union interval in bytes.
    pub extended_size: u64,
    /// All sub-accesses, oldest first.
    pub accesses: Vec<SubAccess>,
}

impl BundledAccesses {
    fn new(seed: SubAccess) -> Self {
        Self {
            extended_addr: seed.addr,
            extended_size: seed.size as u64,
            accesses: vec![seed],
        }
    }
}

/// Memory access performed by one instruction.
///
/// The registry and the memory group that dispatched the instruction may both
/// hold a copy; the bundle is shared behind an [`Arc`] so cloning stays cheap
/// and the sub-access list outlives whichever holder is dropped first.
#[derive(Clone, Debug)]
pub struct MemAccess {
    access: SubAccess,
    bundle: Option<Arc<BundledAccesses>>,
}

impl MemAccess {
    /// Creates a descriptor for a single access.
    pub fn new(is_store: bool, addr: u64, size: u32) -> Self {
        Self {
            access: SubAccess {
                is_store,
                addr,
                size,
            },
            bundle: None,
        }
    }

    /// Start address of the first access.
    #[inline]
    pub fn addr(&self) -> u64 {
        self.access.addr
    }

    /// Size in bytes of the first access.
    #[inline]
    pub fn size(&self) -> u32 {
        self.access.size
    }

    /// Returns true if any sub-access writes memory.
    pub fn is_store(&self) -> bool {
        match &self.bundle {
            Some(bundle) => bundle.accesses.iter().any(|a| a.is_store),
            None => self.access.is_store,
        }
    }

    /// Left edge of the covering interval.
    pub fn extended_start(&self) -> u64 {
        match &self.bundle {
            Some(bundle) => bundle.extended_addr,
            None => self.access.addr,
        }
    }

    /// One past the right edge of the covering interval.
    pub fn extended_end(&self) -> u64 {
        match &self.bundle {
            Some(bundle) => bundle.extended_addr + bundle.extended_size,
            None => self.access.addr + self.access.size as u64,
        }
    }

    /// All sub-accesses, including the original.
    pub fn sub_accesses(&self) -> &[SubAccess] {
        match &self.bundle {
            Some(bundle) => &bundle.accesses,
            None => std::slice::from_ref(&self.access),
        }
    }

    /// Adds a sub-access and widens the covering interval.
    ///
    /// The bundle is materialized lazily: the first append seeds it with the
    /// original access, so `sub_accesses` always lists every range touched.
    pub fn append(&mut self, is_store: bool, addr: u64, size: u32) {
        let bundle = self
            .bundle
            .get_or_insert_with(|| Arc::new(BundledAccesses::new(self.access)));
        let bundle = Arc::make_mut(bundle);

        if addr < bundle.extended_addr {
            bundle.extended_addr = addr;
        }
        let new_end = addr + size as u64;
        if new_end > bundle.extended_addr + bundle.extended_size {
            bundle.extended_size = new_end - bundle.extended_addr;
        }

        bundle.accesses.push(SubAccess {
            is_store,
            addr,
            size,
        });
    }

    /// Precise overlap test against another descriptor.
    ///
    /// The union intervals prune the common disjoint case; only when they
    /// intersect are the individual sub-access pairs compared. Collapsing to
    /// the union alone would report false aliases for sparse bundles, so the
    /// per-pair scan is load-bearing, not an optimization.
    pub fn overlaps(&self, other: &MemAccess) -> bool {
        if self.extended_end() <= other.extended_start()
            || other.extended_end() <= self.extended_start()
        {
            return false;
        }
        self.sub_accesses()
            .iter()
            .any(|a| other.sub_accesses().iter().any(|b| a.overlaps(b)))
    }
}

impl fmt::Display for MemAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ {:#018x} - {:#018x} ], IsStore: {}",
            self.access.addr,
            self.access.addr + self.access.size as u64,
            self.access.is_store
        )
    }
}
