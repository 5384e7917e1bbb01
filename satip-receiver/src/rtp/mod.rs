mod arena;
mod reader;
mod sequence;

pub use arena::{BatchArena, NonBlocking, SLOT_SIZE};
pub use reader::{FrameReader, Stats, BATCH_SIZE, RTP_HEADER_LEN};
pub use sequence::{SequenceTracker, Verdict};
