// frame.rs - One chunk's cell matrix for one generation, halo ring included

use crate::border::{self, CornerRef, InnerBorders, OuterBorders};
use crate::error::LifeError;

pub type Cell = bool;

pub const ALIVE_GLYPH: u8 = b'*';
pub const DEAD_GLYPH: u8 = b'.';

/// A `(width+2) x (height+2)` cell matrix. The interior (1-based) holds the
/// chunk's live cells; the outermost ring is the halo, a cached copy of the
/// neighbors' published edges. Interior coordinates are 1..=width and
/// 1..=height throughout.
pub struct Frame {
    width: usize,
    height: usize,
    full_width: usize,
    full_height: usize,
    data: Vec<Cell>,

    // Shared with the other frames of the same chunk ring.
    inner: InnerBorders,
    outer: OuterBorders,
}

fn corner_value(corner: &Option<CornerRef>) -> Cell {
    corner.as_ref().map(CornerRef::get).unwrap_or(false)
}

impl Frame {
    /// Creates an all-dead frame and publishes its (empty) inner edges so
    /// neighbors never observe uninitialized buffers.
    pub fn new(width: u32, height: u32, inner: InnerBorders, outer: OuterBorders) -> Frame {
        assert!(width > 0 && height > 0, "frame dimensions must be positive");
        let width = width as usize;
        let height = height as usize;
        let full_width = width + 2;
        let full_height = height + 2;
        let frame = Frame {
            width,
            height,
            full_width,
            full_height,
            data: vec![false; full_width * full_height],
            inner,
            outer,
        };
        frame.publish_inner();
        frame
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn at(&self, x: usize, y: usize) -> usize {
        y * self.full_width + x
    }

    /// Interior cell value. `x` and `y` are 1-based and must be in range.
    pub fn cell(&self, x: u32, y: u32) -> Cell {
        assert!(self.in_range(x, y), "cell ({x}, {y}) outside the interior");
        self.data[self.at(x as usize, y as usize)]
    }

    fn in_range(&self, x: u32, y: u32) -> bool {
        x >= 1 && x as usize <= self.width && y >= 1 && y as usize <= self.height
    }

    /// Writes one interior cell. A cell on a published edge is written
    /// through to the matching inner border buffer immediately, so a
    /// neighbor's next halo refresh sees it without an explicit publish.
    pub fn set_cell(&mut self, x: u32, y: u32, value: Cell) -> Result<(), LifeError> {
        if !self.in_range(x, y) {
            return Err(LifeError::OutOfRange);
        }
        let (x, y) = (x as usize, y as usize);
        let index = self.at(x, y);
        self.data[index] = value;

        let byte = value as u8;
        if x == 1 {
            if let Some(buf) = &self.inner.left {
                border::lock(buf)[y - 1] = byte;
            }
        }
        if x == self.width {
            if let Some(buf) = &self.inner.right {
                border::lock(buf)[y - 1] = byte;
            }
        }
        if y == 1 {
            if let Some(buf) = &self.inner.top {
                border::lock(buf)[x - 1] = byte;
            }
        }
        if y == self.height {
            if let Some(buf) = &self.inner.bottom {
                border::lock(buf)[x - 1] = byte;
            }
        }
        Ok(())
    }

    /// Copies the four live edge rows/columns into the inner border
    /// buffers. No-op for sides facing the board boundary.
    pub fn publish_inner(&self) {
        if let Some(buf) = &self.inner.top {
            let mut buf = border::lock(buf);
            for x in 1..=self.width {
                buf[x - 1] = self.data[self.at(x, 1)] as u8;
            }
        }
        if let Some(buf) = &self.inner.bottom {
            let mut buf = border::lock(buf);
            for x in 1..=self.width {
                buf[x - 1] = self.data[self.at(x, self.height)] as u8;
            }
        }
        if let Some(buf) = &self.inner.left {
            let mut buf = border::lock(buf);
            for y in 1..=self.height {
                buf[y - 1] = self.data[self.at(1, y)] as u8;
            }
        }
        if let Some(buf) = &self.inner.right {
            let mut buf = border::lock(buf);
            for y in 1..=self.height {
                buf[y - 1] = self.data[self.at(self.width, y)] as u8;
            }
        }
    }

    /// Copies the neighbors' published edges and the four corner cells into
    /// the halo ring. Absent neighbors read as dead. Must only run once
    /// every chunk has published its edges for the current generation; the
    /// orchestrator's barrier rounds enforce that.
    pub fn refresh_outer(&mut self) {
        let fw = self.full_width;
        let last_col = self.full_width - 1;
        let last_row = self.full_height - 1;

        self.data[0] = corner_value(&self.outer.top_left);
        self.data[last_col] = corner_value(&self.outer.top_right);
        self.data[last_row * fw] = corner_value(&self.outer.bottom_left);
        self.data[last_row * fw + last_col] = corner_value(&self.outer.bottom_right);

        if let Some(buf) = &self.outer.top {
            let buf = border::lock(buf);
            for x in 1..=self.width {
                self.data[x] = buf[x - 1] != 0;
            }
        }
        if let Some(buf) = &self.outer.bottom {
            let buf = border::lock(buf);
            for x in 1..=self.width {
                self.data[last_row * fw + x] = buf[x - 1] != 0;
            }
        }
        if let Some(buf) = &self.outer.left {
            let buf = border::lock(buf);
            for y in 1..=self.height {
                self.data[y * fw] = buf[y - 1] != 0;
            }
        }
        if let Some(buf) = &self.outer.right {
            let buf = border::lock(buf);
            for y in 1..=self.height {
                self.data[y * fw + last_col] = buf[y - 1] != 0;
            }
        }
    }

    /// Advances `src` by one generation into this frame. Every interior
    /// cell sums its 8 neighbors in `src`, halo included: 3 neighbors give
    /// birth, 2 keep the cell as it was, anything else kills it. Returns
    /// whether any cell changed.
    pub fn step(&mut self, src: &Frame) -> bool {
        debug_assert_eq!((self.width, self.height), (src.width, src.height));
        let fw = self.full_width;
        let mut changed = false;
        for y in 1..=self.height {
            for x in 1..=self.width {
                let mut neighbours = 0u32;
                for dy in y - 1..=y + 1 {
                    for dx in x - 1..=x + 1 {
                        neighbours += src.data[dy * fw + dx] as u32;
                    }
                }
                let current = src.data[y * fw + x];
                neighbours -= current as u32;

                let next = match neighbours {
                    3 => true,
                    2 => current,
                    _ => false,
                };
                self.data[y * fw + x] = next;
                changed |= next != current;
            }
        }
        changed
    }

    /// Kills every interior cell and republishes the (now empty) edges.
    pub fn clear(&mut self) {
        let fw = self.full_width;
        for y in 1..=self.height {
            let row = y * fw;
            self.data[row + 1..row + 1 + self.width].fill(false);
        }
        self.publish_inner();
    }

    /// Renders interior row `y` as a glyph string.
    pub fn render_line(&self, y: u32) -> Result<String, LifeError> {
        if y < 1 || y as usize > self.height {
            return Err(LifeError::OutOfRange);
        }
        let y = y as usize;
        let mut line = String::with_capacity(self.width);
        for x in 1..=self.width {
            line.push(if self.data[self.at(x, y)] {
                ALIVE_GLYPH as char
            } else {
                DEAD_GLYPH as char
            });
        }
        Ok(line)
    }

    /// Loads interior row `y` from a glyph string and republishes the
    /// inner edges. Any byte other than the alive glyph loads as dead.
    pub fn load_line(&mut self, y: u32, text: &str) -> Result<(), LifeError> {
        self.load_line_bytes(y, text.as_bytes())
    }

    /// Bytewise form of [`load_line`](Frame::load_line): one buffer byte
    /// per cell, so glyph traffic coming out of a shared buffer never
    /// takes a detour through UTF-8.
    pub fn load_line_bytes(&mut self, y: u32, bytes: &[u8]) -> Result<(), LifeError> {
        if y < 1 || y as usize > self.height {
            return Err(LifeError::OutOfRange);
        }
        if bytes.len() != self.width {
            return Err(LifeError::LengthMismatch {
                expected: self.width,
                got: bytes.len(),
            });
        }
        let y = y as usize;
        let row = y * self.full_width;
        for (x, &byte) in bytes.iter().enumerate() {
            self.data[row + 1 + x] = byte == ALIVE_GLYPH;
        }
        self.publish_inner();
        Ok(())
    }

    /// Number of live interior cells.
    pub fn alive_count(&self) -> usize {
        let fw = self.full_width;
        (1..=self.height)
            .flat_map(|y| (1..=self.width).map(move |x| y * fw + x))
            .filter(|&i| self.data[i])
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border::{lock, shared_buf};

    fn bare(width: u32, height: u32) -> Frame {
        Frame::new(width, height, InnerBorders::default(), OuterBorders::default())
    }

    #[test]
    fn set_cell_rejects_out_of_range() {
        let mut frame = bare(3, 2);
        assert!(frame.set_cell(0, 1, true).is_err());
        assert!(frame.set_cell(4, 1, true).is_err());
        assert!(frame.set_cell(1, 3, true).is_err());
        assert!(frame.set_cell(3, 2, true).is_ok());
    }

    #[test]
    fn lone_cell_dies() {
        let mut src = bare(3, 3);
        let mut dst = bare(3, 3);
        src.set_cell(2, 2, true).unwrap();
        assert!(dst.step(&src));
        assert_eq!(dst.alive_count(), 0);
    }

    #[test]
    fn block_is_a_still_life() {
        let mut src = bare(4, 4);
        let mut dst = bare(4, 4);
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            src.set_cell(x, y, true).unwrap();
        }
        assert!(!dst.step(&src));
        assert_eq!(dst.alive_count(), 4);
    }

    #[test]
    fn blinker_oscillates() {
        let mut first = bare(5, 5);
        let mut second = bare(5, 5);
        for x in 2..=4 {
            first.set_cell(x, 3, true).unwrap();
        }
        assert!(second.step(&first));
        // Horizontal row becomes a vertical column.
        assert!(second.cell(3, 2) && second.cell(3, 3) && second.cell(3, 4));
        assert!(!second.cell(2, 3) && !second.cell(4, 3));

        assert!(first.step(&second));
        for x in 2..=4 {
            assert!(first.cell(x, 3));
        }
        assert_eq!(first.alive_count(), 3);
    }

    #[test]
    fn edge_writes_go_straight_to_inner_buffers() {
        let inner = InnerBorders {
            top: Some(shared_buf(3)),
            left: Some(shared_buf(2)),
            right: Some(shared_buf(2)),
            bottom: Some(shared_buf(3)),
        };
        let mut frame = Frame::new(3, 2, inner.clone(), OuterBorders::default());

        frame.set_cell(1, 1, true).unwrap();
        assert_eq!(lock(inner.top.as_ref().unwrap())[0], 1);
        assert_eq!(lock(inner.left.as_ref().unwrap())[0], 1);

        frame.set_cell(3, 2, true).unwrap();
        assert_eq!(lock(inner.right.as_ref().unwrap())[1], 1);
        assert_eq!(lock(inner.bottom.as_ref().unwrap())[2], 1);

        // Interior writes touch no buffer.
        frame.set_cell(2, 1, false).unwrap();
        assert_eq!(lock(inner.bottom.as_ref().unwrap())[1], 0);
    }

    #[test]
    fn refresh_fills_the_halo_from_neighbor_buffers() {
        let left = shared_buf(2);
        let corner_src = shared_buf(4);
        lock(&left).copy_from_slice(&[1, 1]);
        lock(&corner_src)[3] = 1;

        let outer = OuterBorders {
            left: Some(left),
            top_left: Some(CornerRef {
                buf: corner_src,
                index: 3,
            }),
            ..OuterBorders::default()
        };
        let mut frame = Frame::new(2, 2, InnerBorders::default(), outer);
        frame.refresh_outer();

        // Halo column 0: corner plus the two left-side cells.
        assert!(frame.data[frame.at(0, 0)]);
        assert!(frame.data[frame.at(0, 1)]);
        assert!(frame.data[frame.at(0, 2)]);
        // Untouched halo cells stay dead.
        assert!(!frame.data[frame.at(3, 0)]);
        assert!(!frame.data[frame.at(0, 3)]);
    }

    #[test]
    fn halo_cells_count_as_neighbors() {
        let left = shared_buf(1);
        let top = shared_buf(1);
        let corner_src = shared_buf(3);
        lock(&left)[0] = 1;
        lock(&top)[0] = 1;
        lock(&corner_src)[2] = 1;

        let outer = OuterBorders {
            left: Some(left),
            top: Some(top),
            top_left: Some(CornerRef {
                buf: corner_src,
                index: 2,
            }),
            ..OuterBorders::default()
        };
        let mut src = Frame::new(1, 1, InnerBorders::default(), outer);
        let mut dst = bare(1, 1);
        src.refresh_outer();

        // Three live halo neighbors give birth to the single interior cell.
        assert!(dst.step(&src));
        assert!(dst.cell(1, 1));
    }

    #[test]
    fn clear_republishes_empty_edges() {
        let inner = InnerBorders {
            top: Some(shared_buf(2)),
            ..InnerBorders::default()
        };
        let mut frame = Frame::new(2, 2, inner.clone(), OuterBorders::default());
        frame.set_cell(1, 1, true).unwrap();
        assert_eq!(lock(inner.top.as_ref().unwrap())[0], 1);

        frame.clear();
        assert_eq!(frame.alive_count(), 0);
        assert_eq!(*lock(inner.top.as_ref().unwrap()), vec![0, 0]);
    }

    #[test]
    fn line_roundtrip() {
        let mut frame = bare(4, 2);
        frame.load_line(1, "*..*").unwrap();
        frame.load_line(2, ".**.").unwrap();
        assert_eq!(frame.render_line(1).unwrap(), "*..*");
        assert_eq!(frame.render_line(2).unwrap(), ".**.");
        assert_eq!(frame.alive_count(), 4);
    }

    #[test]
    fn load_line_validates_input() {
        let mut frame = bare(4, 2);
        assert!(matches!(
            frame.load_line(3, "****"),
            Err(LifeError::OutOfRange)
        ));
        assert!(matches!(
            frame.load_line(1, "***"),
            Err(LifeError::LengthMismatch {
                expected: 4,
                got: 3
            })
        ));
        // Unknown glyphs load as dead cells.
        frame.load_line(1, "x*x*").unwrap();
        assert_eq!(frame.render_line(1).unwrap(), ".*.*");
    }

    #[test]
    fn load_line_bytes_decodes_one_byte_per_cell() {
        let mut frame = bare(4, 1);
        // Bytes above 0x7f are just not the alive glyph; they must not
        // widen into multibyte chars and trip the length check.
        frame.load_line_bytes(1, &[0xc3, 0xa9, b'*', b'.']).unwrap();
        assert_eq!(frame.render_line(1).unwrap(), "..*.");
        assert!(matches!(
            frame.load_line_bytes(1, b"***"),
            Err(LifeError::LengthMismatch {
                expected: 4,
                got: 3
            })
        ));
    }

    #[test]
    fn edge_write_is_visible_to_the_neighbor_without_a_publish() {
        // Two frames sharing one edge allocation: the writer's right edge
        // is the reader's left halo.
        let edge = shared_buf(3);
        let inner = InnerBorders {
            right: Some(edge.clone()),
            ..InnerBorders::default()
        };
        let outer = OuterBorders {
            left: Some(edge),
            ..OuterBorders::default()
        };
        let mut writer = Frame::new(3, 3, inner, OuterBorders::default());
        let mut reader = Frame::new(3, 3, InnerBorders::default(), outer);

        writer.set_cell(3, 2, true).unwrap();
        // No publish_inner in between: the write-through alone carries it.
        reader.refresh_outer();
        assert!(reader.data[reader.at(0, 2)]);
        assert!(!reader.data[reader.at(0, 1)]);

        writer.set_cell(3, 2, false).unwrap();
        reader.refresh_outer();
        assert!(!reader.data[reader.at(0, 2)]);
    }

    #[test]
    fn load_line_republishes_inner_edges() {
        let inner = InnerBorders {
            top: Some(shared_buf(3)),
            ..InnerBorders::default()
        };
        let mut frame = Frame::new(3, 2, inner.clone(), OuterBorders::default());
        frame.load_line(1, "*.*").unwrap();
        assert_eq!(*lock(inner.top.as_ref().unwrap()), vec![1, 0, 1]);
    }
}
