use std::collections::VecDeque;

/// Sliding window of `(height, blockHash)` used to detect reorgs. Retains at
/// least `window_size` entries — configured to `requiredConfirmations` or
/// more — so a divergent hash at any retained height is caught before it is
/// considered finalized.
pub struct ReorgWindow {
    window_size: u64,
    seen: VecDeque<(u64, [u8; 32])>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Observation {
    /// Extends the tracked chain; no reorg.
    Continue,
    /// A reorg was detected against an already-seen height; the caller must
    /// rewind to (and re-emit events from) this height.
    Rewind(u64),
}

impl ReorgWindow {
    pub fn new(window_size: u64) -> Self {
        Self {
            window_size: window_size.max(1),
            seen: VecDeque::new(),
        }
    }

    pub fn observe(&mut self, height: u64, hash: [u8; 32]) -> Observation {
        if let Some(&(tip_height, _)) = self.seen.back() {
            if height <= tip_height {
                if let Some(pos) = self.seen.iter().position(|(h, _)| *h == height) {
                    let (_, recorded) = self.seen[pos];
                    if recorded == hash {
                        return Observation::Continue;
                    }
                    self.seen.truncate(pos);
                    self.seen.push_back((height, hash));
                    return Observation::Rewind(height);
                }
                // Height predates the window entirely; nothing left to compare
                // against, but it cannot be trusted as a fresh tip either.
                return Observation::Rewind(height);
            }
        }
        self.seen.push_back((height, hash));
        while self.seen.len() as u64 > self.window_size {
            self.seen.pop_front();
        }
        Observation::Continue
    }

    /// Oldest height still tracked; anything older is considered finalized.
    pub fn oldest_tracked(&self) -> Option<u64> {
        self.seen.front().map(|(h, _)| *h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_blocks_continue() {
        let mut w = ReorgWindow::new(4);
        assert_eq!(w.observe(1, [1u8; 32]), Observation::Continue);
        assert_eq!(w.observe(2, [2u8; 32]), Observation::Continue);
        assert_eq!(w.observe(3, [3u8; 32]), Observation::Continue);
    }

    #[test]
    fn divergent_hash_at_tracked_height_triggers_rewind() {
        let mut w = ReorgWindow::new(4);
        w.observe(1, [1u8; 32]);
        w.observe(2, [2u8; 32]);
        w.observe(3, [3u8; 32]);
        // A competing chain surfaces a different block 2.
        assert_eq!(w.observe(2, [0xffu8; 32]), Observation::Rewind(2));
    }

    #[test]
    fn window_evicts_beyond_configured_size() {
        let mut w = ReorgWindow::new(2);
        w.observe(1, [1u8; 32]);
        w.observe(2, [2u8; 32]);
        w.observe(3, [3u8; 32]);
        assert_eq!(w.oldest_tracked(), Some(2));
    }

    #[test]
    fn reobserving_same_hash_at_same_height_is_not_a_reorg() {
        let mut w = ReorgWindow::new(4);
        w.observe(5, [5u8; 32]);
        assert_eq!(w.observe(5, [5u8; 32]), Observation::Continue);
    }
}
