use std::sync::atomic::{AtomicU64, Ordering};

/// Iterations shared by all VUs; each reservation hands out the next index.
#[derive(Debug)]
pub struct IterationBudget {
    limit: u64,
    counter: AtomicU64,
}

impl IterationBudget {
    #[must_use]
    pub const fn new(limit: u64) -> Self {
        Self {
            limit,
            counter: AtomicU64::new(0),
        }
    }

    /// Reserves one iteration, returning its zero-based index, or `None`
    /// once the budget is spent.
    pub fn try_reserve(&self) -> Option<u64> {
        loop {
            let current = self.counter.load(Ordering::Relaxed);
            if current >= self.limit {
                return None;
            }
            let next = current.checked_add(1)?;
            if self
                .counter
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Some(current);
            }
        }
    }

    #[must_use]
    pub fn reserved(&self) -> u64 {
        self.counter.load(Ordering::Relaxed).min(self.limit)
    }
}
