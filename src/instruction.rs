// instruction.rs - The one-per-round command broadcast to every worker

/// What a targeted worker applies during a barrier round. Parameters are
/// always coordinates local to the receiving chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Nop,
    /// Leave the worker loop after acknowledging the round.
    Destroy,
    AddCell { x: u32, y: u32 },
    /// Render interior row `row` as glyphs into the special buffer.
    WriteScanline { row: u32 },
    /// Load interior row `row` from the special buffer.
    ReadScanline { row: u32 },
    PublishInner,
    RefreshOuter,
    Calculate,
    Clear,
}

/// Per-axis chunk selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Select {
    Any,
    At(u32),
}

impl Select {
    fn matches(self, index: u32) -> bool {
        match self {
            Select::Any => true,
            Select::At(n) => n == index,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkTarget {
    pub x: Select,
    pub y: Select,
}

impl ChunkTarget {
    pub const ANY: ChunkTarget = ChunkTarget {
        x: Select::Any,
        y: Select::Any,
    };

    /// Exactly one chunk.
    pub fn at(x: u32, y: u32) -> ChunkTarget {
        ChunkTarget {
            x: Select::At(x),
            y: Select::At(y),
        }
    }

    /// Every chunk in one chunk row.
    pub fn row(y: u32) -> ChunkTarget {
        ChunkTarget {
            x: Select::Any,
            y: Select::At(y),
        }
    }

    pub fn matches(self, x: u32, y: u32) -> bool {
        self.x.matches(x) && self.y.matches(y)
    }
}

/// One broadcast command. A fresh value is sent for every barrier round
/// and lives exactly that long.
#[derive(Clone, Copy, Debug)]
pub struct Instruction {
    pub op: Opcode,
    pub target: ChunkTarget,
}

impl Instruction {
    pub const NOP: Instruction = Instruction {
        op: Opcode::Nop,
        target: ChunkTarget::ANY,
    };

    pub fn broadcast(op: Opcode) -> Instruction {
        Instruction {
            op,
            target: ChunkTarget::ANY,
        }
    }

    pub fn to_chunk(x: u32, y: u32, op: Opcode) -> Instruction {
        Instruction {
            op,
            target: ChunkTarget::at(x, y),
        }
    }

    pub fn to_row(y: u32, op: Opcode) -> Instruction {
        Instruction {
            op,
            target: ChunkTarget::row(y),
        }
    }
}
