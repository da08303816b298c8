//! Tracks the chain of currently open block-bearing statements so `end`/
//! `end<tag>` tokens can be resolved against the right opener (spec §4.3).

use crate::syntax::TokenKind;

/// The statement kinds that can sit on the block stack. Each corresponds to
/// a `StmtKind` variant that owns a `Block` body; `kind` is recorded as the
/// keyword token that opened it so Liquid `end<tag>` lookups can match by
/// `TokenKind::liquid_end_target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenBlock {
    pub opener: TokenKind,
    /// `true` for an `If` entered via an `elseif`/`elsif` chain link: these
    /// are closed by resolving against the root `If`, not ended directly.
    pub is_else_if: bool,
    pub is_loop: bool,
}

#[derive(Clone, Debug, Default)]
pub struct BlockStack {
    open: Vec<OpenBlock>,
}

impl BlockStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, opener: TokenKind, is_loop: bool) {
        self.open.push(OpenBlock {
            opener,
            is_else_if: false,
            is_loop,
        });
    }

    pub fn push_else_if(&mut self, opener: TokenKind) {
        self.open.push(OpenBlock {
            opener,
            is_else_if: true,
            is_loop: false,
        });
    }

    pub fn pop(&mut self) -> Option<OpenBlock> {
        self.open.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// The innermost statement that expects a bare `end` token: elseif links
    /// are skipped since they chain rather than end directly.
    pub fn find_first_expecting_end(&self) -> Option<&OpenBlock> {
        self.open.iter().rev().find(|b| !b.is_else_if)
    }

    /// Resolves a Liquid `end<tag>` keyword against the nearest open block of
    /// the matching opener kind, walking from the top. Returns the number of
    /// frames to pop (including intervening unmatched frames) on success.
    pub fn find_liquid_end_target(&self, end_token: TokenKind) -> Option<usize> {
        let target = end_token.liquid_end_target()?;
        self.open
            .iter()
            .rev()
            .position(|b| b.opener == target)
            .map(|idx| idx + 1)
    }

    /// Walks top-down looking for a loop-bearing frame, stopping at the
    /// first frame that isn't loop-transparent. `wrap`/`capture`/`with`
    /// bodies are transparent to `break`/`continue` (deferred to evaluation
    /// per spec §9 open question), so this is informational only; the
    /// parser does not reject `break`/`continue` outside a loop.
    pub fn is_in_loop(&self) -> bool {
        self.open.iter().rev().any(|b| b.is_loop)
    }
}
