use std::ops::Range;

use arcstr::{ArcStr, Substr};
use bitflags::bitflags;

use crate::syntax::TokenKind;

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u8 {
        /// Set when a line ending appears directly before this token, with no
        /// other non-trivia token in between. Used by the front-matter
        /// controller and by `{% %}{% %}` adjacency detection.
        const PRECEDED_BY_NEWLINE = 1;
    }
}

/// A raw token as produced by the lexer: a kind plus its byte range in the
/// source. Trivia tokens (`WHITESPACE`, `NEW_LINE`, `COMMENT`,
/// `COMMENT_MULTI`) are represented the same way; the parser is responsible
/// for routing them to the trivia manager instead of the statement stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawToken {
    pub kind: TokenKind,
    pub range: Range<usize>,
    pub flags: TokenFlags,
}

impl RawToken {
    pub fn new(kind: TokenKind, range: Range<usize>) -> Self {
        Self {
            kind,
            range,
            flags: TokenFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: TokenFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.start == self.range.end
    }
}

/// A kind tag for trivia pieces attached to AST nodes. `End` tags the
/// trailing separator consumed by an `end`/`end<tag>` token; `Empty` tags a
/// synthesized placeholder with no real source text (used when a `Raw`
/// statement is manufactured purely to anchor otherwise-orphaned trivia).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    NewLine,
    Comment,
    CommentMulti,
    SemiColon,
    End,
    Empty,
}

/// A single piece of trivia: hidden source text (or a synthesized empty
/// marker) with a byte range into the owning `SourceText`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: Substr,
}

impl Trivia {
    pub fn new(kind: TriviaKind, text: Substr) -> Self {
        Self { kind, text }
    }

    pub fn empty(parent: &ArcStr, at: usize) -> Self {
        Self {
            kind: TriviaKind::Empty,
            text: parent.substr(at..at),
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn range(&self) -> Range<usize> {
        self.text.range()
    }
}

/// The two trivia lists every AST node optionally carries. Block-typed
/// containers never populate these directly (§3.3): trivia migrates to the
/// first/last child instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeTrivia {
    pub before: Vec<Trivia>,
    pub after: Vec<Trivia>,
}

impl NodeTrivia {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}
