//! Counts expression/block nesting and raises exactly one diagnostic when a
//! configured limit is exceeded (spec §4.9). The parser continues
//! defensively past the threshold; it is the caller's choice whether to
//! treat further recursion as fatal.

use crate::diagnostics::Diagnostics;
use crate::span::Span;

pub struct DepthLimiter {
    limit: Option<u32>,
    current: u32,
}

impl DepthLimiter {
    pub fn new(limit: Option<u32>) -> Self {
        Self { limit, current: 0 }
    }

    /// Enters one level of recursion, reporting the single-shot diagnostic
    /// the first time the limit is breached.
    pub fn enter(&mut self, span: &Span, diagnostics: &mut Diagnostics) {
        self.current += 1;
        if let Some(limit) = self.limit {
            if self.current > limit {
                diagnostics.report_depth_limit_once(span.clone(), limit);
            }
        }
    }

    pub fn leave(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn is_over_limit(&self) -> bool {
        matches!(self.limit, Some(limit) if self.current > limit)
    }
}
