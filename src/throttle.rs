use std::time::Duration;

pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(1);

/// How long to wait after a page before requesting the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDelay {
    Fixed(Duration),
    /// Doubles the delay after every failed page (up to `max`), drops back to
    /// `base` after a successful one.
    Adaptive {
        base: Duration,
        max: Duration,
        current: Duration,
    },
}

impl Default for PageDelay {
    fn default() -> Self {
        PageDelay::Fixed(DEFAULT_PAGE_DELAY)
    }
}

impl PageDelay {
    pub fn adaptive(base: Duration, max: Duration) -> Self {
        PageDelay::Adaptive {
            base,
            max: max.max(base),
            current: base,
        }
    }

    /// Returns the pause to apply after a page with the given outcome.
    pub fn after_page(&mut self, page_ok: bool) -> Duration {
        match self {
            PageDelay::Fixed(delay) => *delay,
            PageDelay::Adaptive { base, max, current } => {
                *current = if page_ok {
                    *base
                } else {
                    current.saturating_mul(2).max(*base).min(*max)
                };
                *current
            }
        }
    }
}
