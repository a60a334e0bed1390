//! Chunked, concurrent Conway's Game of Life engine.
//!
//! The board is partitioned into a near-square grid of rectangular chunks,
//! each advanced by its own worker task. Neighboring chunks exchange edge
//! state through shared border buffers every generation, and a shared
//! instruction slot plus a pair of counting barriers drives every worker in
//! lockstep, one fully acknowledged round per instruction. The result is
//! observably identical to running the automaton on a single grid.
//!
//! ```
//! use conway_chunks::Board;
//!
//! let mut board = Board::create(10, 10, 4)?;
//! board.add_cell(2, 3)?;
//! board.add_cell(3, 3)?;
//! board.add_cell(4, 3)?;
//! board.next_turn();
//! assert_eq!(board.get_scanline(2)?, "..*.......");
//! # Ok::<(), conway_chunks::LifeError>(())
//! ```

pub mod board;
pub mod border;
pub mod chunk;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod instruction;
pub mod patterns;

pub use board::Board;
pub use error::LifeError;
pub use frame::Cell;
pub use geometry::Partition;
