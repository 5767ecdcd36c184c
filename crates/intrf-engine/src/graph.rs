use crate::dsp::effect::Effect;
use crate::error::Result;

struct Slot {
    fx: Box<dyn Effect>,
    bypassed: bool,
}

/// A serial chain of effects. Owns the effects.
pub struct Chain {
    slots: Vec<Slot>,
    channels: u16,
    max_frames: usize,
}

impl Chain {
    pub fn new(max_frames: usize, channels: u16) -> Self {
        Self { slots: Vec::new(), channels, max_frames }
    }

    /// Prepare and append an effect. Returns its slot index.
    pub fn push(&mut self, mut fx: Box<dyn Effect>) -> Result<usize> {
        fx.prepare(self.max_frames, self.channels)?;
        self.slots.push(Slot { fx, bypassed: false });
        Ok(self.slots.len() - 1)
    }

    /// Bypassed slots pass their input through untouched. Returns false for
    /// an unknown slot.
    pub fn set_bypass(&mut self, slot: usize, bypassed: bool) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => {
                s.bypassed = bypassed;
                true
            }
            None => false,
        }
    }

    pub fn is_bypassed(&self, slot: usize) -> Option<bool> {
        self.slots.get(slot).map(|s| s.bypassed)
    }

    /// Process one interleaved block in-place.
    pub fn process(&mut self, block: &mut [f32]) {
        let channels = self.channels as usize;
        for s in self.slots.iter_mut().filter(|s| !s.bypassed) {
            s.fx.process(block, channels);
        }
    }

    /// Per-channel peaks of the last active effect that keeps a monitor.
    /// Channels it did not see are written as 0.
    pub fn peaks(&self, out: &mut [f32]) {
        out.fill(0.0);
        let snapshot = self
            .slots
            .iter()
            .rev()
            .filter(|s| !s.bypassed)
            .find_map(|s| s.fx.monitor());
        if let Some(snap) = snapshot {
            for (ch, o) in out.iter_mut().enumerate() {
                *o = snap.peak(ch);
            }
        }
    }
}
