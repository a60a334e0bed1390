// border.rs - Shared edge buffers wiring neighboring chunks together

use std::sync::{Arc, Mutex, MutexGuard};

/// One shared edge allocation. Cells travel as bytes (0 = dead, 1 = alive)
/// so the scanline side channel can reuse the same allocation for glyph
/// traffic. The barrier protocol keeps every buffer single-writer and
/// single-reader within a round; the mutex only makes that discipline safe.
pub type SharedBuf = Arc<Mutex<Vec<u8>>>;

pub fn shared_buf(len: usize) -> SharedBuf {
    Arc::new(Mutex::new(vec![0; len]))
}

pub(crate) fn lock(buf: &SharedBuf) -> MutexGuard<'_, Vec<u8>> {
    buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The edges a chunk publishes for its neighbors. A side facing the board
/// boundary has no buffer; writes to it are no-ops.
#[derive(Clone, Default)]
pub struct InnerBorders {
    pub top: Option<SharedBuf>,
    pub left: Option<SharedBuf>,
    pub right: Option<SharedBuf>,
    pub bottom: Option<SharedBuf>,
}

/// A single halo corner cell, read out of a diagonal neighbor's orthogonal
/// edge buffer at a fixed position. The corner owns no allocation of its
/// own: a top-left corner is the above-left neighbor's bottom edge at that
/// neighbor's last interior column, and symmetrically for the other three.
#[derive(Clone)]
pub struct CornerRef {
    pub buf: SharedBuf,
    pub index: usize,
}

impl CornerRef {
    pub fn get(&self) -> bool {
        lock(&self.buf)[self.index] != 0
    }
}

/// The neighbor edges a chunk reads into its halo ring. Absent sides and
/// corners read as dead.
#[derive(Clone, Default)]
pub struct OuterBorders {
    pub top: Option<SharedBuf>,
    pub left: Option<SharedBuf>,
    pub right: Option<SharedBuf>,
    pub bottom: Option<SharedBuf>,

    pub top_left: Option<CornerRef>,
    pub top_right: Option<CornerRef>,
    pub bottom_left: Option<CornerRef>,
    pub bottom_right: Option<CornerRef>,
}
