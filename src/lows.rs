use serde::Serialize;

/// A local low: a position into the candle series plus its cached low
/// price. Never owns candle data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocalLow {
    pub position: usize,
    pub price: f64,
}

/// Maintains the ascending chain of local lows, row by row.
///
/// A new low is only accepted if it extends an ascending staircase of
/// lows. A lower low pops every trailing entry above it; if that
/// invalidates `reset_threshold` or more entries, the whole chain is
/// wiped before the new low is appended, modeling a drawdown deep
/// enough to invalidate the wave count built so far.
///
/// A low exactly equal to the last chain price is silently ignored:
/// the staircase only grows on a strict increase and only pops on a
/// strict decrease. Exact ties are rare with float prices but the
/// behavior is deliberate and covered by tests.
#[derive(Debug)]
pub struct LowTracker {
    chain: Vec<LocalLow>,
    reset_threshold: usize,
}

impl LowTracker {
    pub fn new(reset_threshold: usize) -> Self {
        Self {
            chain: Vec::new(),
            reset_threshold,
        }
    }

    /// Feed one row. Rows must be fed in position order. Returns the
    /// chain as of this row.
    pub fn observe(&mut self, position: usize, low: f64, is_minimum: bool) -> &[LocalLow] {
        if !is_minimum {
            return &self.chain;
        }

        match self.chain.last().copied() {
            None => self.chain.push(LocalLow {
                position,
                price: low,
            }),
            Some(last) if low > last.price => self.chain.push(LocalLow {
                position,
                price: low,
            }),
            Some(last) if low < last.price => {
                let mut popped = 0;
                while let Some(tail) = self.chain.last() {
                    if tail.price > low {
                        self.chain.pop();
                        popped += 1;
                    } else {
                        break;
                    }
                }
                if popped >= self.reset_threshold {
                    self.chain.clear();
                }
                self.chain.push(LocalLow {
                    position,
                    price: low,
                });
            }
            Some(_) => {
                // Tie with the last chain price: no append, no pop.
            }
        }

        &self.chain
    }

    pub fn chain(&self) -> &[LocalLow] {
        &self.chain
    }
}
