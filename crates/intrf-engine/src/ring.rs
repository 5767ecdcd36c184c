//! Lock-free single-producer single-consumer sample ring.
//!
//! Carries processed audio from the capture callback to the playback
//! callback. Capacity is a power of two; one slot stays empty to tell full
//! from empty.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct SampleRing {
    buf: UnsafeCell<Box<[f32]>>,
    mask: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// Safety: exactly one thread calls `push` and exactly one calls `pop_into`.
// The producer only writes slots in the free region and publishes them with
// a release store on `head`; the consumer only reads published slots and
// frees them with a release store on `tail`.
unsafe impl Send for SampleRing {}
unsafe impl Sync for SampleRing {}

impl SampleRing {
    /// At least `min_capacity` slots, rounded up to a power of two.
    pub fn with_capacity(min_capacity: usize) -> Self {
        let cap = min_capacity.max(2).next_power_of_two();
        Self {
            buf: UnsafeCell::new(vec![0.0_f32; cap].into_boxed_slice()),
            mask: cap - 1,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Usable slots.
    pub fn capacity(&self) -> usize {
        self.mask
    }

    /// Samples ready to pop.
    pub fn available(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail) & self.mask
    }

    /// Producer side. Pushes all of `data` or nothing.
    pub fn push(&self, data: &[f32]) -> bool {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Relaxed);
        let used = head.wrapping_sub(tail) & self.mask;
        if self.mask - used < data.len() {
            return false;
        }
        // Safety: single producer; the slots written lie in the free region.
        let buf = unsafe { &mut *self.buf.get() };
        let mut h = head;
        for &v in data {
            buf[h & self.mask] = v;
            h = h.wrapping_add(1);
        }
        self.head.store(h, Ordering::Release);
        true
    }

    /// Consumer side. Fills all of `out` or leaves the ring untouched.
    pub fn pop_into(&self, out: &mut [f32]) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Relaxed);
        if (head.wrapping_sub(tail) & self.mask) < out.len() {
            return false;
        }
        // Safety: single consumer; the slots read were published by `head`.
        let buf = unsafe { &*self.buf.get() };
        let mut t = tail;
        for o in out.iter_mut() {
            *o = buf[t & self.mask];
            t = t.wrapping_add(1);
        }
        self.tail.store(t, Ordering::Release);
        true
    }
}
