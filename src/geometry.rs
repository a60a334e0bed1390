// geometry.rs - Partition search: how a width x height field splits into chunks

use crate::error::LifeError;

/// Result of the partition search: a `chunks_hor` x `chunks_ver` grid of
/// square `chunk_size` chunks, except the last column/row, which absorb
/// whatever is left (`last_width` / `last_height`, each in `1..=chunk_size`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition {
    pub chunks_hor: u32,
    pub chunks_ver: u32,
    pub chunk_size: u32,
    pub last_width: u32,
    pub last_height: u32,
}

/// Largest edge length k that both axes admit for this divisor pair.
///
/// An axis of length `len` split `parts` ways admits k in
/// [ceil(len/parts), (len-1)/(parts-1)]: every chunk but the last gets k
/// cells and the last gets the (positive, at most k) remainder. A single
/// part admits the whole axis. Returns 0 when the pair fits nothing.
fn max_edge(width: u32, height: u32, chunks_hor: u32, chunks_ver: u32) -> u32 {
    if chunks_hor > width || chunks_ver > height {
        return 0;
    }

    let long_side = width.max(height);
    let (min_x, max_x) = if chunks_hor == 1 {
        (width, long_side)
    } else {
        (width.div_ceil(chunks_hor), (width - 1) / (chunks_hor - 1))
    };
    let (min_y, max_y) = if chunks_ver == 1 {
        (height, long_side)
    } else {
        (height.div_ceil(chunks_ver), (height - 1) / (chunks_ver - 1))
    };

    let lo = min_x.max(min_y);
    let hi = max_x.min(max_y);
    if lo <= hi { hi } else { 0 }
}

impl Partition {
    /// Searches divisor pairs of `chunks_count` with `chunks_hor` ascending
    /// from 1. A pair that tiles both axes evenly with equal quotients wins
    /// immediately; otherwise the pair with the largest admissible edge
    /// length is kept.
    pub fn compute(width: u32, height: u32, chunks_count: u32) -> Result<Self, LifeError> {
        let invalid = LifeError::InvalidGeometry {
            width,
            height,
            chunks: chunks_count,
        };
        if width == 0 || height == 0 || chunks_count == 0 {
            return Err(invalid);
        }

        let mut best_size = 0;
        let mut best_hor = 0;
        let mut best_ver = 0;
        for hor in 1..=chunks_count {
            if chunks_count % hor != 0 {
                continue;
            }
            let ver = chunks_count / hor;

            if width % hor == 0 && height % ver == 0 && width / hor == height / ver {
                best_size = width / hor;
                best_hor = hor;
                best_ver = ver;
                break;
            }

            let size = max_edge(width, height, hor, ver);
            if size > best_size {
                best_size = size;
                best_hor = hor;
                best_ver = ver;
            }
        }

        if best_size == 0 {
            return Err(invalid);
        }

        Ok(Partition {
            chunks_hor: best_hor,
            chunks_ver: best_ver,
            chunk_size: best_size,
            last_width: width - (best_hor - 1) * best_size,
            last_height: height - (best_ver - 1) * best_size,
        })
    }

    /// Interior width of the chunk column `col` (0-based).
    pub fn col_width(&self, col: u32) -> u32 {
        if col + 1 == self.chunks_hor {
            self.last_width
        } else {
            self.chunk_size
        }
    }

    /// Interior height of the chunk row `row` (0-based).
    pub fn row_height(&self, row: u32) -> u32 {
        if row + 1 == self.chunks_ver {
            self.last_height
        } else {
            self.chunk_size
        }
    }

    /// Chunk column owning the 1-based board coordinate `x`.
    pub fn chunk_col(&self, x: u32) -> u32 {
        chunk_index(x, self.chunk_size, self.chunks_hor)
    }

    /// Chunk row owning the 1-based board coordinate `y`.
    pub fn chunk_row(&self, y: u32) -> u32 {
        chunk_index(y, self.chunk_size, self.chunks_ver)
    }

    /// 1-based coordinate of `x` inside its owning chunk column.
    pub fn local_x(&self, x: u32) -> u32 {
        x - self.chunk_size * self.chunk_col(x)
    }

    /// 1-based coordinate of `y` inside its owning chunk row.
    pub fn local_y(&self, y: u32) -> u32 {
        y - self.chunk_size * self.chunk_row(y)
    }
}

fn chunk_index(coord: u32, chunk_size: u32, chunk_count: u32) -> u32 {
    // The last chunk absorbs the remainder, so coordinates past the uniform
    // grid still map to it.
    ((coord - 1) / chunk_size).min(chunk_count - 1)
}
