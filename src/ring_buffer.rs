//! Fixed-size history of recent press timestamps
//!
//! Single writer, any number of readers. `head` and `tail` only ever grow and
//! are masked into the slot array. A write that would exceed the capacity
//! evicts the oldest entry instead of growing.
//!
//! Timestamps are stored as nanosecond offsets from the buffer's epoch so each
//! slot fits in an `AtomicU64`. The slot is written before `head` is published
//! with `Release`; readers load `head` with `Acquire`, so a reader never sees an
//! index that points at a slot whose value has not landed yet. Eviction works
//! like a seqlock: `tail` moves before the oldest slot is reused, and a reader
//! rechecks `tail` after each slot read to discard values from a lapping writer.

use std::sync::atomic::{fence, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Number of presses kept in the history. Must be a power of two.
pub const CAPACITY: usize = 8;
const MASK: usize = CAPACITY - 1;

const _: () = assert!(CAPACITY.is_power_of_two());

/// A single recorded press
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClickEvent {
    /// Moment the press edge was observed
    pub timestamp: Instant,
}

/// Lock-free circular buffer of the most recent presses
#[derive(Debug)]
pub struct ClickRingBuffer {
    epoch: Instant,
    slots: [AtomicU64; CAPACITY],
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl ClickRingBuffer {
    /// Create an empty buffer. Timestamps earlier than `epoch` are clamped to it.
    pub fn new(epoch: Instant) -> Self {
        Self {
            epoch,
            slots: std::array::from_fn(|_| AtomicU64::new(0)),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Append a press, evicting the oldest entry when full.
    ///
    /// Only one thread may call this at a time.
    pub fn record(&self, timestamp: Instant) {
        let offset = timestamp.saturating_duration_since(self.epoch).as_nanos();
        let offset = u64::try_from(offset).unwrap_or(u64::MAX);

        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        if head - tail >= CAPACITY {
            self.tail.store(tail + 1, Ordering::Relaxed);
        }
        // The eviction must be visible to any reader that sees the overwrite
        fence(Ordering::Release);

        self.slots[head & MASK].store(offset, Ordering::Relaxed);
        self.head.store(head + 1, Ordering::Release);
    }

    /// Entries from newest to oldest.
    ///
    /// The iterator is lazy, so callers that stop early only touch the slots
    /// they looked at. Iteration ends early if a concurrent writer has
    /// overwritten the next slot.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = ClickEvent> + '_ {
        let (tail, head) = self.bounds();
        (tail..head).rev().map_while(move |index| self.read_valid(index))
    }

    /// Entries in chronological order
    pub fn snapshot(&self) -> Vec<ClickEvent> {
        let mut events: Vec<ClickEvent> = self.iter_newest_first().collect();
        events.reverse();
        events
    }

    /// The most recently recorded press
    pub fn latest(&self) -> Option<ClickEvent> {
        loop {
            let head = self.head.load(Ordering::Acquire);
            if head == 0 {
                return None;
            }
            if let Some(event) = self.read_valid(head - 1) {
                return Some(event);
            }
        }
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        let (tail, head) = self.bounds();
        head - tail
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total presses ever recorded, including evicted ones
    pub fn total_recorded(&self) -> usize {
        self.head.load(Ordering::Acquire)
    }

    fn bounds(&self) -> (usize, usize) {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        // A reader on another thread can observe a tail that lags the head
        // by one write; never expose more than CAPACITY slots.
        (tail.max(head.saturating_sub(CAPACITY)), head)
    }

    /// Read the slot for `index`, or `None` if it was evicted while reading.
    ///
    /// A slot is only overwritten after `tail` has moved past its index, and
    /// the writer fences between the two. Seeing the overwritten value here
    /// therefore implies seeing the advanced tail after the acquire fence.
    fn read_valid(&self, index: usize) -> Option<ClickEvent> {
        let offset = self.slots[index & MASK].load(Ordering::Relaxed);
        fence(Ordering::Acquire);
        if index < self.tail.load(Ordering::Relaxed) {
            return None;
        }
        Some(ClickEvent {
            timestamp: self.epoch + Duration::from_nanos(offset),
        })
    }
}

impl Default for ClickRingBuffer {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(epoch: Instant, ms: u64) -> Instant {
        epoch + Duration::from_millis(ms)
    }

    #[test]
    fn starts_empty() {
        let buffer = ClickRingBuffer::default();
        assert!(buffer.is_empty());
        assert_eq!(buffer.latest(), None);
        assert_eq!(buffer.iter_newest_first().count(), 0);
    }

    #[test]
    fn keeps_everything_below_capacity() {
        let epoch = Instant::now();
        let buffer = ClickRingBuffer::new(epoch);
        for ms in [10, 20, 30] {
            buffer.record(at(epoch, ms));
        }

        let times: Vec<Instant> = buffer.snapshot().iter().map(|e| e.timestamp).collect();
        assert_eq!(times, vec![at(epoch, 10), at(epoch, 20), at(epoch, 30)]);
        assert_eq!(buffer.latest().map(|e| e.timestamp), Some(at(epoch, 30)));
    }

    #[test]
    fn evicts_oldest_when_full() {
        let epoch = Instant::now();
        let buffer = ClickRingBuffer::new(epoch);
        for ms in 0..(CAPACITY as u64 + 3) {
            buffer.record(at(epoch, ms));
        }

        assert_eq!(buffer.len(), CAPACITY);
        assert_eq!(buffer.total_recorded(), CAPACITY + 3);
        let first = buffer.snapshot()[0].timestamp;
        assert_eq!(first, at(epoch, 3));
    }

    #[test]
    fn newest_first_is_reverse_chronological() {
        let epoch = Instant::now();
        let buffer = ClickRingBuffer::new(epoch);
        for ms in [5, 6, 7] {
            buffer.record(at(epoch, ms));
        }
        let newest: Vec<Instant> = buffer.iter_newest_first().map(|e| e.timestamp).collect();
        assert_eq!(newest, vec![at(epoch, 7), at(epoch, 6), at(epoch, 5)]);
    }

    #[test]
    fn clamps_timestamps_before_epoch() {
        let epoch = Instant::now() + Duration::from_secs(1);
        let buffer = ClickRingBuffer::new(epoch);
        buffer.record(Instant::now());
        assert_eq!(buffer.latest().map(|e| e.timestamp), Some(epoch));
    }

    #[test]
    fn reader_thread_sees_bounded_ordered_history() {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;

        let epoch = Instant::now();
        let buffer = Arc::new(ClickRingBuffer::new(epoch));
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let buffer = buffer.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut out_of_order = 0usize;
                let mut snapshots = 0usize;
                while !done.load(Ordering::Acquire) || snapshots == 0 {
                    let snapshot = buffer.snapshot();
                    assert!(snapshot.len() <= CAPACITY);
                    if snapshot.windows(2).any(|w| w[0].timestamp >= w[1].timestamp) {
                        out_of_order += 1;
                    }
                    if let Some(latest) = buffer.latest() {
                        assert!(latest.timestamp >= epoch + Duration::from_millis(1));
                    }
                    snapshots += 1;
                }
                out_of_order
            })
        };

        for ms in 1..=2_000_000u64 {
            buffer.record(at(epoch, ms));
        }
        done.store(true, Ordering::Release);

        assert_eq!(reader.join().unwrap(), 0);
        assert_eq!(buffer.len(), CAPACITY);
        assert_eq!(buffer.latest().map(|e| e.timestamp), Some(at(epoch, 2_000_000)));
    }

    #[test]
    fn read_of_evicted_slot_is_rejected() {
        let epoch = Instant::now();
        let buffer = ClickRingBuffer::new(epoch);
        for ms in 0..CAPACITY as u64 {
            buffer.record(at(epoch, ms));
        }
        // Index 0 is still live; one more write evicts it and reuses its slot
        assert_eq!(buffer.read_valid(0).map(|e| e.timestamp), Some(at(epoch, 0)));
        buffer.record(at(epoch, 100));
        assert_eq!(buffer.read_valid(0), None);
        assert_eq!(
            buffer.read_valid(CAPACITY).map(|e| e.timestamp),
            Some(at(epoch, 100))
        );
    }

    proptest! {
        #[test]
        fn retains_most_recent_in_order(gaps in prop::collection::vec(0u64..500, 0..40)) {
            let epoch = Instant::now();
            let buffer = ClickRingBuffer::new(epoch);
            let mut expected = Vec::new();
            let mut t = 0u64;
            for gap in gaps {
                t += gap;
                buffer.record(at(epoch, t));
                expected.push(at(epoch, t));
            }

            let keep = expected.len().min(CAPACITY);
            let expected = &expected[expected.len() - keep..];
            let actual: Vec<Instant> = buffer.snapshot().iter().map(|e| e.timestamp).collect();
            prop_assert_eq!(actual.as_slice(), expected);
        }
    }
}
