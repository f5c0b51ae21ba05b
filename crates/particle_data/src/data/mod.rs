pub mod color;
pub mod seed;
pub mod snapshot;
