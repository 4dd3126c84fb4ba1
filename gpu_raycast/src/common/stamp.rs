use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a tracked input (voxel grid, transfer function).
/// Every constructed object receives a fresh id. Owners implement `Clone`
/// by hand so that clones get one too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn fresh() -> ObjectId {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity and modification counter of an input.
///
/// Caches compare stamps to decide whether derived data
/// (textures, lookup tables) is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub id: ObjectId,
    pub mtime: u64,
}

impl Stamp {
    pub fn new() -> Stamp {
        Stamp {
            id: ObjectId::fresh(),
            mtime: 0,
        }
    }

    /// Stamp for a copy of the owner, new identity, same counter.
    pub fn renewed(&self) -> Stamp {
        Stamp {
            id: ObjectId::fresh(),
            mtime: self.mtime,
        }
    }

    /// Mark the owner as modified.
    pub fn modified(&mut self) {
        self.mtime += 1;
    }
}

impl Default for Stamp {
    fn default() -> Self {
        Self::new()
    }
}
