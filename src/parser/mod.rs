//! The parser itself: a token stream adapter with a small peek buffer and
//! trivia routing, plus the state the statement dispatcher needs (mode,
//! dialect, block stack, depth limiter, diagnostics). Submodules hold the
//! statement dispatcher and the statement/expression parsers that sit on
//! top of this core.

mod dispatch;
mod expr;
mod liquid;
mod statements;

use std::collections::VecDeque;
use std::ops::Range;
use std::rc::Rc;

use arcstr::{ArcStr, Substr};

use crate::ast::{Block, ScriptPage};
use crate::block_stack::BlockStack;
use crate::depth::DepthLimiter;
use crate::diagnostics::Diagnostics;
use crate::lexer::{LexMode, Lexer};
use crate::options::{Dialect, LexerOptions, ParserOptions, ParsingMode};
use crate::span::{Pos, Span};
use crate::syntax::TokenKind;
use crate::token::{NodeTrivia, RawToken, Trivia, TriviaKind};
use crate::trivia_manager::TriviaManager;

#[derive(Clone, Debug, PartialEq, Eq)]
struct PToken {
    kind: TokenKind,
    range: Range<usize>,
}

struct Checkpoint {
    lexer: crate::lexer::LexerCheckpoint,
    lex_mode: LexMode,
    buffer: VecDeque<PToken>,
    current: PToken,
    previous_end: usize,
    allow_new_line: u32,
    pending_trivia: Vec<Trivia>,
}

/// Parses one document into a `ScriptPage`. Single-use: construct, call
/// `run()` once, discard.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    source: ArcStr,
    file: Rc<str>,
    dialect: Dialect,
    parsing_mode: ParsingMode,
    options: ParserOptions,

    lex_mode: LexMode,
    buffer: VecDeque<PToken>,
    current: PToken,
    previous_end: usize,
    allow_new_line: u32,

    in_code_section: bool,
    liquid_tag_section: bool,
    in_front_matter: bool,

    /// The kind of the most recently consumed non-hidden token, used to
    /// detect mode-switch adjacency (`{% %}{% %}`) for trivia synthesis.
    last_consumed_kind: TokenKind,

    trivia: TriviaManager,
    block_stack: BlockStack,
    depth: DepthLimiter,
    diagnostics: Diagnostics,

    /// Set by the expression entry when the expression it just parsed was
    /// an anonymous function whose tail already consumed the terminator
    /// (spec §4.6): the dispatcher skips the end-of-statement check.
    has_anonymous_function: bool,

    /// Extra statements synthesized by a single dispatch call (a code-enter
    /// that both anchors orphaned trivia in a placeholder `Raw` and closes
    /// immediately as a `Nop`) queue here so the dispatcher's one-call-one-
    /// statement contract still holds for `parse_body_block`.
    pending_synthesized: std::collections::VecDeque<crate::ast::Stmt>,
}

impl<'src> Parser<'src> {
    pub fn new(text: &'src str, lexer_options: LexerOptions, parser_options: ParserOptions) -> Self {
        Self::with_path(text, "<input>", lexer_options, parser_options)
    }

    pub fn with_path(
        text: &'src str,
        path: impl Into<Rc<str>>,
        lexer_options: LexerOptions,
        parser_options: ParserOptions,
    ) -> Self {
        let dialect = lexer_options.dialect;
        let parsing_mode = lexer_options.mode;
        let depth_limit = parser_options.expression_depth_limit;
        let mut lexer = Lexer::new(text, lexer_options);
        let needs_front_matter_marker_first =
            matches!(parsing_mode, ParsingMode::FrontMatterOnly | ParsingMode::FrontMatterAndContent);
        let initial_mode = match parsing_mode {
            ParsingMode::ScriptOnly | ParsingMode::FrontMatterOnly | ParsingMode::FrontMatterAndContent => {
                LexMode::Code
            }
            ParsingMode::Default => LexMode::Raw,
        };
        // Front-matter modes must not consume a token yet: `run()` needs the
        // lexer sitting at offset 0 so it can try the marker first.
        let first = if needs_front_matter_marker_first {
            PToken {
                kind: TokenKind::TOMBSTONE,
                range: 0..0,
            }
        } else {
            let first_kind = lexer.next_token(initial_mode);
            PToken {
                kind: first_kind,
                range: lexer.extract_current_token().range,
            }
        };

        Self {
            lexer,
            source: ArcStr::from(text),
            file: path.into(),
            dialect,
            parsing_mode,
            options: parser_options,
            lex_mode: initial_mode,
            buffer: VecDeque::new(),
            current: first,
            previous_end: 0,
            allow_new_line: 0,
            in_code_section: matches!(parsing_mode, ParsingMode::ScriptOnly),
            liquid_tag_section: false,
            in_front_matter: false,
            last_consumed_kind: TokenKind::TOMBSTONE,
            trivia: TriviaManager::new(),
            block_stack: BlockStack::new(),
            depth: DepthLimiter::new(depth_limit),
            diagnostics: Diagnostics::new(),
            has_anonymous_function: false,
            pending_synthesized: std::collections::VecDeque::new(),
        }
    }

    // ---- span helpers ----

    pub fn pos_at(&self, offset: usize) -> Pos {
        let mut line = 1u32;
        let mut col = 1u32;
        for b in self.source.as_bytes()[..offset.min(self.source.len())].iter() {
            if *b == b'\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Pos {
            offset: offset as u32,
            line,
            column: col,
        }
    }

    pub fn span_from(&self, start: usize, end: usize) -> Span {
        Span::new(self.file.clone(), self.pos_at(start), self.pos_at(end))
    }

    pub fn empty_span_here(&self) -> Span {
        let at = self.current.range.start;
        Span::empty_at(self.file.clone(), self.pos_at(at))
    }

    fn text_of(&self, range: Range<usize>) -> Substr {
        self.source.substr(range)
    }

    pub fn current_text(&self) -> Substr {
        self.text_of(self.current.range.clone())
    }

    // ---- token stream adapter (§4.1) ----

    pub fn current(&self) -> TokenKind {
        self.current.kind
    }

    pub fn current_range(&self) -> Range<usize> {
        self.current.range.clone()
    }

    pub fn previous_end(&self) -> usize {
        self.previous_end
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn pull_raw(&mut self) -> PToken {
        // A front-matter block's closing marker is lexed the same way its
        // opening marker is (`parse_front_matter`): re-tried at every
        // line start while still inside the block, since `scan_code` has no
        // marker-aware branch of its own and would otherwise read `+++` as
        // three `Plus` tokens (spec §4.8).
        if self.in_front_matter
            && self.lex_mode == LexMode::Code
            && self.lexer.at_line_start()
            && self.lexer.try_lex_front_matter_marker()
        {
            let RawToken { kind, range, .. } = self.lexer.extract_current_token();
            return PToken { kind, range };
        }
        let kind = self.lexer.next_token(self.lex_mode);
        let RawToken { kind, range, .. } = self.lexer.extract_current_token();
        match kind {
            TokenKind::CODE_ENTER | TokenKind::LIQUID_TAG_ENTER => self.lex_mode = LexMode::Code,
            TokenKind::CODE_EXIT | TokenKind::LIQUID_TAG_EXIT => self.lex_mode = LexMode::Raw,
            _ => {}
        }
        PToken { kind, range }
    }

    fn trivia_kind_for(kind: TokenKind) -> TriviaKind {
        match kind {
            TokenKind::WHITESPACE => TriviaKind::Whitespace,
            TokenKind::NEW_LINE => TriviaKind::NewLine,
            TokenKind::COMMENT => TriviaKind::Comment,
            TokenKind::COMMENT_MULTI => TriviaKind::CommentMulti,
            _ => unreachable!("not a trivia-classified token kind"),
        }
    }

    /// Pulls raw tokens until a non-hidden one is found, routing hidden
    /// tokens into the trivia manager as it goes.
    fn next_real(&mut self) -> PToken {
        loop {
            let tok = self.pull_raw();
            let hide = tok.kind.is_always_hidden_trivia()
                || (tok.kind == TokenKind::NEW_LINE && self.allow_new_line > 0);
            if hide {
                let text = self.text_of(tok.range.clone());
                self.trivia.push(Trivia::new(Self::trivia_kind_for(tok.kind), text));
                continue;
            }
            return tok;
        }
    }

    /// Lookahead by `k` non-hidden tokens (0 = the token right after
    /// `current`). Hidden tokens encountered while filling the buffer are
    /// still routed to the trivia manager, matching the §4.1 contract that
    /// `peek` never exposes hidden tokens.
    pub fn peek_kind(&mut self, k: usize) -> TokenKind {
        while self.buffer.len() <= k {
            let tok = self.next_real();
            self.buffer.push_back(tok);
        }
        self.buffer[k].kind
    }

    pub fn peek(&mut self) -> TokenKind {
        self.peek_kind(0)
    }

    /// Advances past the current token, returning its kind.
    pub fn advance(&mut self) -> TokenKind {
        let prev = std::mem::replace(
            &mut self.current,
            match self.buffer.pop_front() {
                Some(tok) => tok,
                None => self.next_real(),
            },
        );
        self.previous_end = prev.range.end;
        self.last_consumed_kind = prev.kind;
        prev.kind
    }

    /// Bumps the allow-newline depth for the duration spanned by a
    /// parenthesized/bracketed construct (the bridge into the expression
    /// parser's internals, §4.1).
    pub fn enter_allow_new_line(&mut self) {
        self.allow_new_line += 1;
    }

    pub fn leave_allow_new_line(&mut self) {
        self.allow_new_line = self.allow_new_line.saturating_sub(1);
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            lexer: self.lexer.checkpoint(),
            lex_mode: self.lex_mode,
            buffer: self.buffer.clone(),
            current: self.current.clone(),
            previous_end: self.previous_end,
            allow_new_line: self.allow_new_line,
            pending_trivia: self.trivia.peek_pending().to_vec(),
        }
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        self.lexer.rewind(checkpoint.lexer);
        self.lex_mode = checkpoint.lex_mode;
        self.buffer = checkpoint.buffer;
        self.current = checkpoint.current;
        self.previous_end = checkpoint.previous_end;
        self.allow_new_line = checkpoint.allow_new_line;
        self.trivia.restore_pending(checkpoint.pending_trivia);
    }

    /// Runs a speculative parse: if `f` returns `None`, the token stream
    /// (including any trivia consumed along the way) rewinds as if it had
    /// never run. Grounded on the mark+checkpoint+rewind-on-failure pattern
    /// used for speculative constructs (anonymous-function tails, Liquid
    /// object-path disambiguation).
    pub fn try_speculative<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let checkpoint = self.checkpoint();
        match f(self) {
            Some(value) => Some(value),
            None => {
                self.rewind(checkpoint);
                None
            }
        }
    }

    // ---- trivia plumbing exposed to the dispatcher ----

    pub fn take_before_trivia(&mut self) -> NodeTrivia {
        NodeTrivia {
            before: self.trivia.take_before(),
            after: Vec::new(),
        }
    }

    pub fn attach_after_trivia(&mut self, trivia: &mut NodeTrivia) {
        trivia.after.extend(self.trivia.take_after());
    }

    pub fn push_trivia(&mut self, kind: TriviaKind, range: Range<usize>) {
        let text = self.text_of(range);
        self.trivia.push(Trivia::new(kind, text));
    }

    pub fn synthesize_placeholder_trivia(&mut self, at: usize) -> Vec<Trivia> {
        self.trivia.take_for_synthesized_raw(&self.source, at)
    }

    pub fn has_pending_trivia(&self) -> bool {
        self.trivia.has_pending()
    }

    // ---- dialect/mode state ----

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn in_code_section(&self) -> bool {
        self.in_code_section
    }

    pub(super) fn enter_code_section(&mut self, liquid_tag: bool) {
        self.in_code_section = true;
        self.liquid_tag_section = liquid_tag;
    }

    pub(super) fn leave_code_section(&mut self) {
        self.in_code_section = false;
        self.liquid_tag_section = false;
    }

    pub(super) fn liquid_tag_section(&self) -> bool {
        self.liquid_tag_section
    }

    pub(super) fn last_consumed_kind(&self) -> TokenKind {
        self.last_consumed_kind
    }

    pub(super) fn in_front_matter_flag(&self) -> bool {
        self.in_front_matter
    }

    /// Clears pending trivia with nowhere lossless to land between a
    /// code-exit and whatever follows (spec §4.4 rule 5). The one adjacency
    /// case that needs a placeholder (`{% %}{% %}`) is handled by the next
    /// `CodeEnter`/`LiquidTagEnter` dispatch checking `last_consumed_kind`.
    pub(super) fn discard_orphan_trivia(&mut self) {
        self.trivia.discard();
    }

    /// Closes an open front-matter block. For `FrontMatterAndContent`, also
    /// switches the active parsing mode to `Default` and advances past the
    /// closing marker so body parsing can continue past it; `FrontMatterOnly`
    /// stops with the marker left as the current token (spec §4.4 rule 4).
    pub(super) fn close_front_matter(&mut self) {
        self.in_front_matter = false;
        self.leave_code_section();
        if self.parsing_mode == ParsingMode::FrontMatterAndContent {
            self.parsing_mode = ParsingMode::Default;
            // The lexer was sitting in `Code` mode for the whole front-matter
            // block (no `CodeExit` token ever ran to flip it back); the body
            // that follows is raw text, so the switch has to happen here.
            self.lex_mode = LexMode::Raw;
            self.advance();
        }
    }

    pub(super) fn pop_synthesized(&mut self) -> Option<crate::ast::Stmt> {
        self.pending_synthesized.pop_front()
    }

    pub(super) fn queue_synthesized(&mut self, stmt: crate::ast::Stmt) {
        self.pending_synthesized.push_back(stmt);
    }

    // ---- diagnostics ----

    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push_error(span, message);
    }

    pub fn fatal(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push_fatal(span, message);
    }

    pub fn has_fatal_error(&self) -> bool {
        self.diagnostics.has_fatal_error()
    }

    // ---- depth limiter ----

    pub fn enter_nesting(&mut self, span: &Span) {
        self.depth.enter(span, &mut self.diagnostics);
    }

    pub fn leave_nesting(&mut self) {
        self.depth.leave();
    }

    // ---- entry point (§6.1, §4.8) ----

    pub fn run(mut self) -> (Option<ScriptPage>, Diagnostics) {
        let front_matter = match self.parsing_mode {
            ParsingMode::FrontMatterOnly | ParsingMode::FrontMatterAndContent => {
                self.parse_front_matter()
            }
            _ => None,
        };

        let body = if self.parsing_mode == ParsingMode::FrontMatterOnly {
            Block::new()
        } else {
            let mut body = self.parse_body_block(None);
            self.nudge_body_start_past_front_matter(&mut body, front_matter.is_some());
            body
        };

        let lexer_errors = self.lexer_errors();
        self.diagnostics.extend(lexer_errors);

        if self.diagnostics.has_errors() {
            (None, self.diagnostics)
        } else {
            (
                Some(ScriptPage {
                    front_matter,
                    body,
                }),
                self.diagnostics,
            )
        }
    }

    /// Lexer-level errors are surfaced as `Raw`-mode unexpected bytes today
    /// (the lexer has no error channel of its own); this seam exists so a
    /// future lexer-side diagnostics channel has somewhere to flush into
    /// (spec §6.2, §7 item 7).
    fn lexer_errors(&mut self) -> Diagnostics {
        Diagnostics::new()
    }

    fn parse_front_matter(&mut self) -> Option<Block> {
        if !self.lexer.try_lex_front_matter_marker() {
            let span = self.empty_span_here();
            self.fatal(span, "expected a front matter marker at the start of input");
            return None;
        }
        let RawToken { range, .. } = self.lexer.extract_current_token();
        self.previous_end = range.end;
        self.in_front_matter = true;
        self.enter_code_section(false);
        self.current = self.next_real();

        let block = self.parse_body_block(None);

        if self.in_front_matter {
            let span = self.current_span_zero_width();
            self.fatal(span, "unterminated front matter block");
        }
        Some(block)
    }

    fn current_span_zero_width(&self) -> Span {
        Span::empty_at(self.file.clone(), self.pos_at(self.current.range.start))
    }

    /// After closing front matter, advance the first body `Raw` statement's
    /// span past a single trailing line terminator (spec §3.3, §4.8).
    /// Strips the closing front-matter marker's own line ending (and any
    /// spaces/tabs trailing the marker on that line, per spec §4.8) from the
    /// start of the body's first raw statement. `try_lex_front_matter_marker`
    /// already consumes this while matching the marker itself, so this is a
    /// safety net for whatever the marker's consumption left behind rather
    /// than the primary mechanism.
    fn nudge_body_start_past_front_matter(&mut self, body: &mut Block, had_front_matter: bool) {
        if !had_front_matter {
            return;
        }
        if let Some(first) = body.statements.first_mut() {
            if let crate::ast::StmtKind::Raw { text, .. } = &mut first.kind {
                let after_space = text.trim_start_matches([' ', '\t']);
                let trimmed = after_space
                    .strip_prefix("\r\n")
                    .or_else(|| after_space.strip_prefix('\n'));
                if let Some(rest) = trimmed {
                    let consumed = text.len() - rest.len();
                    *text = rest.to_string();
                    first.span.start.offset += consumed as u32;
                }
            }
        }
    }
}
