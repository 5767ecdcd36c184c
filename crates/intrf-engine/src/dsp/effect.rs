use crate::error::Result;

use super::interference::MonitorSnapshot;

/// Real-time safe effect interface.
/// - prepare() may allocate; process() must not allocate or lock.
/// - `block` is interleaved f32 samples in [-1, 1].
pub trait Effect: Send {
    fn prepare(&mut self, _max_frames: usize, _channels: u16) -> Result<()> {
        Ok(())
    }
    fn process(&mut self, block: &mut [f32], channels: usize);
    /// Last processed block, for effects that keep one.
    fn monitor(&self) -> Option<MonitorSnapshot<'_>> {
        None
    }
}
