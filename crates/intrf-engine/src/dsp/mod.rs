pub mod effect;
pub mod filter;
pub mod gate;
pub mod interference;
pub mod noise;
pub mod rng;
pub mod shatter;

/// Channel capacity of one processor.
pub const MAX_CHANNELS: usize = 8;
