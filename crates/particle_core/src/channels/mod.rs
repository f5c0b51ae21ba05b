//! Cross-thread channels between the engine thread and its producers and
//! consumers. None of them block a reader on the engine's work.

pub mod command_queue;
pub mod double_buffer;
pub mod draw_buffer;

pub use command_queue::CommandQueue;
pub use double_buffer::DoubleBuffer;
pub use draw_buffer::{DrawBuffer, DrawFrame, GridFrame, ReadView};
