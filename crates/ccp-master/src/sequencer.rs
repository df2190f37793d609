//! Per-connection command counter.

use std::sync::atomic::{AtomicU8, Ordering};

/// Generates the 8-bit counter carried by every command frame.
///
/// The slave echoes the counter in its response; it is the only way to tell a
/// response to this command from a late response to an earlier one.
#[derive(Debug, Default)]
pub struct Sequencer {
    next: AtomicU8,
}

impl Sequencer {
    /// Start counting at `start`.
    pub fn new(start: u8) -> Self {
        Sequencer {
            next: AtomicU8::new(start),
        }
    }

    /// Return the current counter and advance, wrapping 255 to 0.
    pub fn next(&self) -> u8 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The value the next call to [`next`](Self::next) will return.
    pub fn peek(&self) -> u8 {
        self.next.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_full_cycle_wraps() {
        let seq = Sequencer::new(0);
        let values: Vec<u8> = (0..256).map(|_| seq.next()).collect();
        let expected: Vec<u8> = (0..=255).collect();
        assert_eq!(values, expected);
        assert_eq!(values.iter().collect::<HashSet<_>>().len(), 256);
        assert_eq!(seq.next(), 0);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let seq = Sequencer::new(254);
        assert_eq!(seq.peek(), 254);
        assert_eq!(seq.next(), 254);
        assert_eq!(seq.next(), 255);
        assert_eq!(seq.peek(), 0);
    }

    #[test]
    fn test_next_is_atomic_across_threads() {
        let seq = Arc::new(Sequencer::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let seq = Arc::clone(&seq);
                std::thread::spawn(move || (0..64).map(|_| seq.next()).collect::<Vec<_>>())
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().unwrap() {
                assert!(seen.insert(value), "counter {} handed out twice", value);
            }
        }
        assert_eq!(seen.len(), 256);
    }
}
