//! Accumulates hidden tokens (whitespace, comments, separators) and attaches
//! them to AST nodes as "before"/"after" trivia (spec §4.2). Block-typed
//! statements never carry trivia directly; the pending list stays intact
//! across their `Open` so it lands on the first child instead.

use arcstr::ArcStr;

use crate::token::{NodeTrivia, Trivia, TriviaKind};

#[derive(Debug, Default)]
pub struct TriviaManager {
    pending: Vec<Trivia>,
}

impl TriviaManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trivia: Trivia) {
        self.pending.push(trivia);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drains the pending list into a node's `before` trivia. Call on
    /// non-block statement/expression `Open`.
    pub fn take_before(&mut self) -> Vec<Trivia> {
        std::mem::take(&mut self.pending)
    }

    /// Drains the pending list into a node's `after` trivia. Call on node
    /// `Close`, after its last non-trivia token has been consumed.
    pub fn take_after(&mut self) -> Vec<Trivia> {
        std::mem::take(&mut self.pending)
    }

    pub fn drain_into(&mut self, trivia: &mut NodeTrivia, into_after: bool) {
        let drained = std::mem::take(&mut self.pending);
        if into_after {
            trivia.after.extend(drained);
        } else {
            trivia.before.extend(drained);
        }
    }

    /// Discards pending trivia without attaching it anywhere, used when
    /// orphaned trivia between a code-exit and the next content has nowhere
    /// lossless to land (spec §4.4 rule 5) and no adjacency placeholder is
    /// being synthesized.
    pub fn discard(&mut self) {
        self.pending.clear();
    }

    /// Builds the trivia for a synthesized empty `Raw` placeholder used to
    /// anchor otherwise-orphaned trivia at a mode-switch adjacency (spec
    /// §4.2, §4.4 rule 3). If nothing is pending, attaches a single `Empty`
    /// marker so the placeholder is still distinguishable from real trivia.
    pub fn take_for_synthesized_raw(&mut self, source: &ArcStr, at: usize) -> Vec<Trivia> {
        if self.pending.is_empty() {
            vec![Trivia::empty(source, at)]
        } else {
            std::mem::take(&mut self.pending)
        }
    }

    pub fn push_separator(&mut self, kind: TriviaKind, text: arcstr::Substr) {
        self.pending.push(Trivia::new(kind, text));
    }

    /// Snapshots the pending list for a speculative-parse checkpoint.
    pub fn peek_pending(&self) -> &[Trivia] {
        &self.pending
    }

    /// Restores the pending list to a snapshot taken by `peek_pending`,
    /// undoing any trivia consumed during a rewound speculative parse.
    pub fn restore_pending(&mut self, pending: Vec<Trivia>) {
        self.pending = pending;
    }
}
