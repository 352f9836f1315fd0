//! Chat stream decoding
//!
//! Turns the raw body of the streaming endpoint into content deltas.

mod decoder;
mod frame;


pub use decoder::StreamDecoder;
pub use frame::{DeltaFrame, FrameParser, ParseStats, DATA_PREFIX, DONE_SENTINEL, RECORD_DELIMITER};
