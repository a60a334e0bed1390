// chunk.rs - A worker's frame ring: double buffer plus bounded undo

use crate::frame::Frame;

/// A ring of at least two equally-sized frames. The cursor marks the
/// active generation; the frames behind it are history, so the undo depth
/// is capped at ring size minus one.
pub struct Chunk {
    frames: Vec<Frame>,
    cursor: usize,
    undo_depth: usize,
}

impl Chunk {
    /// The ring needs a step destination distinct from its source, so two
    /// frames is the minimum. All frames must share one interior size.
    pub fn new(frames: Vec<Frame>) -> Chunk {
        assert!(frames.len() >= 2, "a chunk needs at least two frames");
        let (width, height) = (frames[0].width(), frames[0].height());
        assert!(
            frames.iter().all(|f| f.width() == width && f.height() == height),
            "all frames in a chunk must have the same size"
        );
        Chunk {
            frames,
            cursor: 0,
            undo_depth: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.frames[0].width()
    }

    pub fn height(&self) -> usize {
        self.frames[0].height()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_depth
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.cursor]
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.cursor]
    }

    fn rotate_forward(&mut self) {
        self.cursor += 1;
        if self.cursor == self.frames.len() {
            self.cursor = 0;
        }
        if self.undo_depth < self.frames.len() - 1 {
            self.undo_depth += 1;
        }
    }

    /// Rotates the cursor forward and returns the new active frame, the
    /// destination for the next step. The replaced frame stays in the ring
    /// as history.
    pub fn advance(&mut self) -> &mut Frame {
        self.rotate_forward();
        &mut self.frames[self.cursor]
    }

    fn pair_mut(&mut self, first: usize, second: usize) -> (&mut Frame, &mut Frame) {
        debug_assert_ne!(first, second);
        if first < second {
            let (left, right) = self.frames.split_at_mut(second);
            (&mut left[first], &mut right[0])
        } else {
            let (left, right) = self.frames.split_at_mut(first);
            (&mut right[0], &mut left[second])
        }
    }

    /// Advances the ring and steps the previous frame into the new one.
    /// No border traffic: within the orchestrated protocol the publish and
    /// refresh halves of a turn are their own barriered rounds. Returns
    /// whether any cell changed.
    pub fn calculate(&mut self) -> bool {
        let previous = self.cursor;
        self.rotate_forward();
        let current = self.cursor;
        let (prev, cur) = self.pair_mut(previous, current);
        cur.step(prev)
    }

    /// A complete single-owner turn: refresh the previous frame's halo,
    /// step into the newly advanced frame, publish its edges. Returns the
    /// step's change indicator.
    pub fn do_turn(&mut self) -> bool {
        let previous = self.cursor;
        self.rotate_forward();
        let current = self.cursor;
        let (prev, cur) = self.pair_mut(previous, current);
        prev.refresh_outer();
        let changed = cur.step(prev);
        cur.publish_inner();
        changed
    }

    /// Moves the cursor back one frame if any history remains. Returns
    /// false (and does nothing) at depth zero.
    pub fn rollback(&mut self) -> bool {
        if self.undo_depth == 0 {
            return false;
        }
        if self.cursor == 0 {
            self.cursor = self.frames.len() - 1;
        } else {
            self.cursor -= 1;
        }
        self.undo_depth -= 1;
        true
    }

    /// Advances to a fresh frame and clears it. The replaced frame keeps
    /// its cells, so the wipe itself can be rolled back.
    pub fn clear(&mut self) {
        self.advance().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border::{InnerBorders, OuterBorders};

    fn ring(size: usize, width: u32, height: u32) -> Chunk {
        let frames = (0..size)
            .map(|_| Frame::new(width, height, InnerBorders::default(), OuterBorders::default()))
            .collect();
        Chunk::new(frames)
    }

    fn seed_blinker(chunk: &mut Chunk) {
        for x in 2..=4 {
            chunk.current_mut().set_cell(x, 3, true).unwrap();
        }
    }

    fn is_horizontal_blinker(frame: &Frame) -> bool {
        (2..=4).all(|x| frame.cell(x, 3)) && frame.alive_count() == 3
    }

    #[test]
    fn do_turn_steps_the_automaton() {
        let mut chunk = ring(2, 5, 5);
        seed_blinker(&mut chunk);
        assert!(chunk.do_turn());
        let frame = chunk.current();
        assert!(frame.cell(3, 2) && frame.cell(3, 3) && frame.cell(3, 4));
        assert_eq!(frame.alive_count(), 3);
    }

    #[test]
    fn empty_chunk_reports_no_change() {
        let mut chunk = ring(2, 4, 4);
        assert!(!chunk.do_turn());
        assert!(!chunk.calculate());
    }

    #[test]
    fn rollback_restores_the_previous_generation() {
        let mut chunk = ring(2, 5, 5);
        seed_blinker(&mut chunk);
        chunk.do_turn();
        assert!(!is_horizontal_blinker(chunk.current()));

        assert!(chunk.rollback());
        assert!(is_horizontal_blinker(chunk.current()));

        // Ring of two holds exactly one generation of history.
        assert!(!chunk.rollback());
        assert!(is_horizontal_blinker(chunk.current()));
    }

    #[test]
    fn undo_depth_is_capped_by_ring_size() {
        let mut chunk = ring(3, 5, 5);
        seed_blinker(&mut chunk);
        for _ in 0..5 {
            chunk.do_turn();
        }
        assert_eq!(chunk.undo_depth(), 2);

        assert!(chunk.rollback());
        assert!(chunk.rollback());
        assert!(!chunk.rollback());
    }

    #[test]
    fn clear_is_undoable() {
        let mut chunk = ring(2, 5, 5);
        seed_blinker(&mut chunk);
        chunk.clear();
        assert_eq!(chunk.current().alive_count(), 0);

        assert!(chunk.rollback());
        assert!(is_horizontal_blinker(chunk.current()));
    }
}
