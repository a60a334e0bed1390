// board.rs - The orchestrator: fabric wiring, one worker per chunk, and the
// instruction/barrier protocol that drives them in lockstep

use std::io::{BufRead, Write};
use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio::sync::{Barrier, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::border::{self, CornerRef, InnerBorders, OuterBorders, SharedBuf, shared_buf};
use crate::chunk::Chunk;
use crate::error::LifeError;
use crate::frame::Frame;
use crate::geometry::Partition;
use crate::instruction::{Instruction, Opcode};

/// Frames per chunk ring: double buffer, one generation of undo.
const FRAME_RING: usize = 2;

/// The shared allocations belonging to one chunk position. The special
/// buffer is the scanline side channel to the orchestrator; it reuses the
/// chunk's own top edge buffer when the chunk has neighbors both above and
/// below, and is a fresh allocation otherwise.
struct EdgeBufs {
    top: Option<SharedBuf>,
    left: Option<SharedBuf>,
    right: Option<SharedBuf>,
    bottom: Option<SharedBuf>,
    special: SharedBuf,
}

/// One spawned task owning one chunk. Lives in the loop
/// go-barrier -> read instruction -> apply if targeted -> done-barrier
/// until a Destroy round tells it to exit.
struct Worker {
    chunk_x: u32,
    chunk_y: u32,
    chunk: Chunk,
    special: SharedBuf,
    instructions: watch::Receiver<Instruction>,
    go: Arc<Barrier>,
    done: Arc<Barrier>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            self.go.wait().await;
            let instruction = *self.instructions.borrow();
            let mut terminate = false;
            if instruction.target.matches(self.chunk_x, self.chunk_y) {
                terminate = !self.apply(instruction.op);
            }
            // Acknowledge even a Destroy so the orchestrator's round
            // completes before the task goes away.
            self.done.wait().await;
            if terminate {
                break;
            }
        }
        trace!(x = self.chunk_x, y = self.chunk_y, "worker terminated");
    }

    /// Applies one opcode; returns false when the worker should exit.
    fn apply(&mut self, op: Opcode) -> bool {
        match op {
            Opcode::Nop => {}
            Opcode::Destroy => return false,
            Opcode::AddCell { x, y } => {
                if let Err(error) = self.chunk.current_mut().set_cell(x, y, true) {
                    // The board validates coordinates before dispatching.
                    warn!(x, y, %error, "add_cell dispatched out of range");
                }
            }
            Opcode::WriteScanline { row } => match self.chunk.current().render_line(row) {
                Ok(line) => {
                    let mut buf = border::lock(&self.special);
                    buf[..line.len()].copy_from_slice(line.as_bytes());
                }
                Err(error) => warn!(row, %error, "write_scanline dispatched out of range"),
            },
            Opcode::ReadScanline { row } => {
                // One buffer byte per cell; going through a &str here
                // would re-encode bytes >= 0x80 as multibyte chars and
                // break the length check.
                let bytes = border::lock(&self.special)[..self.chunk.width()].to_vec();
                if let Err(error) = self.chunk.current_mut().load_line_bytes(row, &bytes) {
                    warn!(row, %error, "read_scanline dispatched out of range");
                }
            }
            Opcode::PublishInner => self.chunk.current().publish_inner(),
            Opcode::RefreshOuter => self.chunk.current_mut().refresh_outer(),
            Opcode::Calculate => {
                self.chunk.calculate();
            }
            Opcode::Clear => self.chunk.clear(),
        }
        true
    }
}

/// A width x height Life board partitioned into concurrently advanced
/// chunks. The partitioned computation is observably identical to a
/// single-chunk board: every public operation is one or more fully
/// barriered instruction rounds, so no worker ever runs ahead.
///
/// Dropping the board dispatches `Destroy` and joins every worker.
pub struct Board {
    width: u32,
    height: u32,
    chunks_count: u32,
    partition: Partition,
    generation: u64,

    // Scanline side channels, indexed [chunk_row][chunk_col].
    specials: Vec<Vec<SharedBuf>>,

    instructions: watch::Sender<Instruction>,
    go: Arc<Barrier>,
    done: Arc<Barrier>,
    workers: Vec<JoinHandle<()>>,
    runtime: Runtime,
}

impl Board {
    /// Partitions the field, allocates and wires the border fabric, and
    /// spawns one worker per chunk. The board starts at generation 1 with
    /// every cell dead.
    pub fn create(width: u32, height: u32, chunks_count: u32) -> Result<Board, LifeError> {
        let partition = Partition::compute(width, height, chunks_count)?;
        let runtime = Runtime::new()?;

        let hor = partition.chunks_hor as usize;
        let ver = partition.chunks_ver as usize;

        // Pass one: every internal edge gets exactly one shared buffer,
        // sized to the owning chunk's adjoining edge. Board-boundary sides
        // get none.
        let mut fabric: Vec<Vec<EdgeBufs>> = Vec::with_capacity(ver);
        for row in 0..ver {
            let mut line = Vec::with_capacity(hor);
            for col in 0..hor {
                let w = partition.col_width(col as u32) as usize;
                let h = partition.row_height(row as u32) as usize;
                let top = (row > 0).then(|| shared_buf(w));
                let left = (col > 0).then(|| shared_buf(h));
                let right = (col + 1 < hor).then(|| shared_buf(h));
                let bottom = (row + 1 < ver).then(|| shared_buf(w));
                let special = match (&top, &bottom) {
                    (Some(top), Some(_)) => top.clone(),
                    _ => shared_buf(w),
                };
                line.push(EdgeBufs {
                    top,
                    left,
                    right,
                    bottom,
                    special,
                });
            }
            fabric.push(line);
        }

        let (instr_tx, instr_rx) = watch::channel(Instruction::NOP);
        let go = Arc::new(Barrier::new(chunks_count as usize + 1));
        let done = Arc::new(Barrier::new(chunks_count as usize + 1));

        // Pass two: wire each chunk's outer borders to its neighbors'
        // inner buffers and spawn the worker. A corner piggybacks on the
        // diagonal neighbor's horizontal edge buffer: the left corners
        // read that buffer's last interior column, the right corners read
        // column 0.
        let corner = |buf: &Option<SharedBuf>, index: usize| {
            buf.as_ref().map(|buf| CornerRef {
                buf: buf.clone(),
                index,
            })
        };
        let mut specials = Vec::with_capacity(ver);
        let mut workers = Vec::with_capacity(chunks_count as usize);
        for row in 0..ver {
            let mut special_row = Vec::with_capacity(hor);
            for col in 0..hor {
                let w = partition.col_width(col as u32);
                let h = partition.row_height(row as u32);
                let bufs = &fabric[row][col];

                let inner = InnerBorders {
                    top: bufs.top.clone(),
                    left: bufs.left.clone(),
                    right: bufs.right.clone(),
                    bottom: bufs.bottom.clone(),
                };
                let left_corner_index = if col > 0 {
                    partition.col_width(col as u32 - 1) as usize - 1
                } else {
                    0
                };
                let outer = OuterBorders {
                    top: if row > 0 {
                        fabric[row - 1][col].bottom.clone()
                    } else {
                        None
                    },
                    left: if col > 0 {
                        fabric[row][col - 1].right.clone()
                    } else {
                        None
                    },
                    right: if col + 1 < hor {
                        fabric[row][col + 1].left.clone()
                    } else {
                        None
                    },
                    bottom: if row + 1 < ver {
                        fabric[row + 1][col].top.clone()
                    } else {
                        None
                    },
                    top_left: if row > 0 && col > 0 {
                        corner(&fabric[row - 1][col - 1].bottom, left_corner_index)
                    } else {
                        None
                    },
                    top_right: if row > 0 && col + 1 < hor {
                        corner(&fabric[row - 1][col + 1].bottom, 0)
                    } else {
                        None
                    },
                    bottom_left: if row + 1 < ver && col > 0 {
                        corner(&fabric[row + 1][col - 1].top, left_corner_index)
                    } else {
                        None
                    },
                    bottom_right: if row + 1 < ver && col + 1 < hor {
                        corner(&fabric[row + 1][col + 1].top, 0)
                    } else {
                        None
                    },
                };

                let frames = (0..FRAME_RING)
                    .map(|_| Frame::new(w, h, inner.clone(), outer.clone()))
                    .collect();
                let worker = Worker {
                    chunk_x: col as u32,
                    chunk_y: row as u32,
                    chunk: Chunk::new(frames),
                    special: bufs.special.clone(),
                    instructions: instr_rx.clone(),
                    go: go.clone(),
                    done: done.clone(),
                };
                special_row.push(bufs.special.clone());
                workers.push(runtime.spawn(worker.run()));
            }
            specials.push(special_row);
        }

        info!(
            width,
            height,
            chunks_hor = partition.chunks_hor,
            chunks_ver = partition.chunks_ver,
            chunk_size = partition.chunk_size,
            "board created"
        );
        Ok(Board {
            width,
            height,
            chunks_count,
            partition,
            generation: 1,
            specials,
            instructions: instr_tx,
            go,
            done,
            workers,
            runtime,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn chunks_count(&self) -> u32 {
        self.chunks_count
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// One barrier round: publish the instruction, release every worker
    /// through the go barrier, block on the done barrier. Returns only
    /// once all workers have observed (and, if targeted, applied) exactly
    /// this instruction.
    fn dispatch(&self, instruction: Instruction) {
        trace!(?instruction, "dispatching");
        self.instructions.send_replace(instruction);
        self.runtime.block_on(async {
            self.go.wait().await;
            self.done.wait().await;
        });
    }

    /// Brings the 1-based board cell (x, y) to life. The owning chunk's
    /// `set_cell` writes through to its edge buffers, so a boundary cell
    /// is visible to the neighbor's next halo refresh with no extra
    /// publish round.
    pub fn add_cell(&mut self, x: u32, y: u32) -> Result<(), LifeError> {
        if x < 1 || x > self.width || y < 1 || y > self.height {
            return Err(LifeError::OutOfRange);
        }
        let p = self.partition;
        self.dispatch(Instruction::to_chunk(
            p.chunk_col(x),
            p.chunk_row(y),
            Opcode::AddCell {
                x: p.local_x(x),
                y: p.local_y(y),
            },
        ));
        Ok(())
    }

    /// Advances the whole board one generation: publish, refresh,
    /// calculate, each its own fully barriered round, so every halo read
    /// sees every edge write of the round before it.
    pub fn next_turn(&mut self) {
        self.dispatch(Instruction::broadcast(Opcode::PublishInner));
        self.dispatch(Instruction::broadcast(Opcode::RefreshOuter));
        self.dispatch(Instruction::broadcast(Opcode::Calculate));
        self.generation += 1;
    }

    /// Kills every cell and resets the generation counter to 1.
    pub fn clear(&mut self) {
        self.dispatch(Instruction::broadcast(Opcode::Clear));
        self.generation = 1;
    }

    /// Renders board row `y` as a width-long glyph string, assembled from
    /// the special buffers of the owning chunk row.
    pub fn get_scanline(&self, y: u32) -> Result<String, LifeError> {
        if y < 1 || y > self.height {
            return Err(LifeError::OutOfRange);
        }
        let p = self.partition;
        let row = p.chunk_row(y);
        self.dispatch(Instruction::to_row(
            row,
            Opcode::WriteScanline { row: p.local_y(y) },
        ));

        let mut line = String::with_capacity(self.width as usize);
        for col in 0..p.chunks_hor {
            let buf = border::lock(&self.specials[row as usize][col as usize]);
            let w = p.col_width(col) as usize;
            line.extend(buf[..w].iter().map(|&b| b as char));
        }
        Ok(line)
    }

    /// Loads board row `y` from a width-long glyph string, distributed to
    /// the owning chunk row in chunk-size slices.
    pub fn set_scanline(&mut self, y: u32, text: &str) -> Result<(), LifeError> {
        if y < 1 || y > self.height {
            return Err(LifeError::OutOfRange);
        }
        if text.len() != self.width as usize {
            return Err(LifeError::LengthMismatch {
                expected: self.width as usize,
                got: text.len(),
            });
        }
        let p = self.partition;
        let row = p.chunk_row(y);
        let bytes = text.as_bytes();
        for col in 0..p.chunks_hor {
            let start = (col * p.chunk_size) as usize;
            let w = p.col_width(col) as usize;
            let mut buf = border::lock(&self.specials[row as usize][col as usize]);
            buf[..w].copy_from_slice(&bytes[start..start + w]);
        }
        self.dispatch(Instruction::to_row(
            row,
            Opcode::ReadScanline { row: p.local_y(y) },
        ));
        Ok(())
    }

    /// Reads `height` scanlines from `source`. A short read or a
    /// wrong-length line clears the board and surfaces `FormatError`.
    /// On success the generation counter restarts at 1.
    pub fn load_from_source<R: BufRead>(&mut self, mut source: R) -> Result<(), LifeError> {
        let mut line = String::new();
        for y in 1..=self.height {
            line.clear();
            let read = source.read_line(&mut line);
            let text = line.trim_end_matches(['\r', '\n']);
            if !matches!(read, Ok(n) if n > 0) || self.set_scanline(y, text).is_err() {
                self.clear();
                return Err(LifeError::FormatError { line: y });
            }
        }
        self.generation = 1;
        Ok(())
    }

    /// Writes `height` newline-terminated scanlines to `sink`.
    pub fn save_to_sink<W: Write>(&self, mut sink: W) -> Result<(), LifeError> {
        for y in 1..=self.height {
            let line = self.get_scanline(y)?;
            writeln!(sink, "{line}")?;
        }
        sink.flush()?;
        Ok(())
    }

    /// Dispatches the Destroy round and joins every worker. Runs at most
    /// once; `Drop` calls it too.
    fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.dispatch(Instruction::broadcast(Opcode::Destroy));
        let workers = std::mem::take(&mut self.workers);
        self.runtime.block_on(async {
            for worker in workers {
                let _ = worker.await;
            }
        });
        debug!("all workers terminated");
    }
}

impl Drop for Board {
    fn drop(&mut self) {
        self.shutdown();
    }
}
