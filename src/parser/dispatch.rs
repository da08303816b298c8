//! The statement dispatcher: the central loop that classifies the current
//! token and routes to a statement parser based on mode (code vs raw),
//! dialect, and keyword (spec §4.4). This is the hardest single piece of
//! the parser: it is what keeps the raw/code mode switch, the block stack,
//! and trivia attachment all mutually consistent.

use super::Parser;
use crate::ast::{Block, Stmt, StmtKind};
use crate::options::Dialect;
use crate::syntax::TokenKind;
use crate::token::TriviaKind;

/// What a single dispatch attempt produced: a statement (or none, e.g. a
/// separator was consumed), whether it closed an `end`-bearing block, and
/// whether the dispatcher should keep producing statements for `parent`.
pub(super) struct DispatchOutcome {
    pub stmt: Option<Stmt>,
    pub has_end: bool,
    pub keep_going: bool,
}

impl DispatchOutcome {
    fn none(keep_going: bool) -> Self {
        Self {
            stmt: None,
            has_end: false,
            keep_going,
        }
    }

    fn stmt(stmt: Stmt) -> Self {
        Self {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }
}

impl<'src> Parser<'src> {
    /// Parses the statements of a block until its terminator is reached:
    /// `end`/`end<tag>` resolving to `parent`, or EOF, or a fatal error.
    pub(super) fn parse_body_block(&mut self, parent: Option<TokenKind>) -> Block {
        let mut block = Block::new();
        loop {
            if let Some(stmt) = self.pop_synthesized() {
                block.statements.push(stmt);
                continue;
            }
            let outcome = self.try_parse_statement(parent);
            if let Some(stmt) = outcome.stmt {
                let is_raw = matches!(stmt.kind, StmtKind::Raw { .. });
                if parent == Some(TokenKind::KW_CASE) && is_raw {
                    // Raw text inside a case body carries no evaluation
                    // meaning and is dropped silently (spec §3.3).
                } else {
                    block.statements.push(stmt);
                }
            }
            if outcome.has_end || !outcome.keep_going {
                break;
            }
        }
        block
    }

    /// Entry point for one dispatch attempt (spec §4.4 `tryParseStatement`).
    pub(super) fn try_parse_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        if self.has_fatal_error() {
            return DispatchOutcome::none(false);
        }

        let current = self.current();

        // Rule 1
        if current == TokenKind::EOF {
            return DispatchOutcome::none(false);
        }

        // Rule 2
        if current == TokenKind::RAW || current.is_escape() {
            return self.dispatch_raw(parent);
        }

        // Rule 3
        if current == TokenKind::CODE_ENTER {
            return self.dispatch_mode_enter(false);
        }
        if current == TokenKind::LIQUID_TAG_ENTER && self.dialect() == Dialect::Liquid {
            return self.dispatch_mode_enter(true);
        }

        // Rule 4
        if current == TokenKind::FRONT_MATTER_MARKER {
            return self.dispatch_front_matter_marker();
        }

        // Rule 5
        if current == TokenKind::CODE_EXIT {
            return self.dispatch_mode_exit();
        }
        if current == TokenKind::LIQUID_TAG_EXIT && self.dialect() == Dialect::Liquid {
            return self.dispatch_mode_exit();
        }

        // Rule 6
        if self.in_code_section() {
            return self.dispatch_in_code(parent);
        }

        // Rule 7
        let span = self.empty_span_here();
        self.error(span, format!("unexpected token {current:?} outside a code section"));
        self.advance();
        DispatchOutcome::none(true)
    }

    fn dispatch_raw(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        let start = self.current.range.start;
        let kind = self.current();
        let text = self.current_text().to_string();
        let end = self.current.range.end;
        self.advance();

        let escape_count = kind.escape_count();
        let trivia = self.take_before_trivia();
        let span = self.span_from(start, end);
        let mut stmt = Stmt::new(span, StmtKind::Raw { text, escape_count });
        stmt.trivia = trivia;
        self.attach_after_trivia(&mut stmt.trivia);

        let _ = parent; // case-body dropping is handled by parse_body_block
        DispatchOutcome::stmt(stmt)
    }

    fn dispatch_mode_enter(&mut self, liquid: bool) -> DispatchOutcome {
        if self.in_code_section() {
            let span = self.empty_span_here();
            self.error(span, "nested code section enter is invalid");
        }

        // Adjacency synthesis (spec §4.2, §4.4 rule 3): anchor otherwise-
        // orphaned trivia in a placeholder `Raw`, or do so anyway when we
        // are re-entering code immediately after leaving it with nothing in
        // between (the `{% %}{% %}` case).
        let synthesize = self.has_pending_trivia()
            || matches!(
                self.last_consumed_kind(),
                TokenKind::CODE_EXIT | TokenKind::LIQUID_TAG_EXIT
            );
        let placeholder_trivia = if synthesize {
            let at = self.current.range.start;
            Some(self.synthesize_placeholder_trivia(at))
        } else {
            None
        };

        self.enter_code_section(liquid);
        let enter_end = self.current.range.end;
        self.advance();

        let placeholder_stmt = placeholder_trivia.map(|after| {
            let span = self.empty_span_here();
            let mut stmt = Stmt::new(span, StmtKind::Raw { text: String::new(), escape_count: None });
            stmt.trivia.after = after;
            stmt
        });

        let nop_stmt = if self.current() == TokenKind::CODE_EXIT
            || (liquid && self.current() == TokenKind::LIQUID_TAG_EXIT)
        {
            let trivia = self.take_before_trivia();
            self.advance();
            self.leave_code_section();
            let span = self.span_from(enter_end, self.previous_end());
            let mut stmt = Stmt::new(span, StmtKind::Nop);
            stmt.trivia = trivia;
            self.attach_after_trivia(&mut stmt.trivia);
            Some(stmt)
        } else {
            None
        };

        match (placeholder_stmt, nop_stmt) {
            (Some(a), Some(b)) => {
                self.queue_synthesized(b);
                DispatchOutcome::stmt(a)
            }
            (Some(a), None) => DispatchOutcome::stmt(a),
            (None, Some(b)) => DispatchOutcome::stmt(b),
            (None, None) => DispatchOutcome::none(true),
        }
    }

    fn dispatch_front_matter_marker(&mut self) -> DispatchOutcome {
        if self.in_front_matter_flag() {
            self.close_front_matter();
        } else {
            let span = self.empty_span_here();
            self.error(span, "unexpected front matter marker");
            self.advance();
        }
        DispatchOutcome {
            stmt: None,
            has_end: true,
            keep_going: false,
        }
    }

    fn dispatch_mode_exit(&mut self) -> DispatchOutcome {
        if !self.in_code_section() {
            let span = self.empty_span_here();
            self.error(span, "code exit without a matching code enter");
        }
        self.discard_orphan_trivia();
        self.advance();
        self.leave_code_section();
        DispatchOutcome::none(true)
    }

    fn dispatch_in_code(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        let current = self.current();

        if current == TokenKind::NEW_LINE || current == TokenKind::SEMI_COLON {
            let kind = if current == TokenKind::NEW_LINE {
                TriviaKind::NewLine
            } else {
                TriviaKind::SemiColon
            };
            let range = self.current_range();
            self.advance();
            self.push_trivia(kind, range);
            return DispatchOutcome::none(true);
        }

        if self.dialect() == Dialect::Liquid {
            if current.liquid_end_target().is_some() {
                return self.dispatch_liquid_end(parent);
            }
            if current == TokenKind::IDENTIFIER || current == TokenKind::IDENTIFIER_SPECIAL || current.is_liquid_keyword() {
                return self.dispatch_liquid_identifier(parent);
            }
        } else if current == TokenKind::IDENTIFIER || current == TokenKind::IDENTIFIER_SPECIAL || current.is_default_keyword() {
            return self.dispatch_default_keyword(parent);
        }

        if self.is_expression_start() {
            return self.dispatch_expression_statement(parent);
        }

        let span = self.empty_span_here();
        self.fatal(span, format!("unexpected token {current:?}"));
        DispatchOutcome::none(false)
    }

    pub(super) fn require_end_of_statement(&mut self) {
        if self.has_anonymous_function_tail() {
            self.has_anonymous_function = false;
            return;
        }
        match self.dialect() {
            Dialect::Default => match self.current() {
                TokenKind::NEW_LINE => {
                    let range = self.current_range();
                    self.advance();
                    self.push_trivia(TriviaKind::NewLine, range);
                }
                TokenKind::SEMI_COLON => {
                    let range = self.current_range();
                    self.advance();
                    self.push_trivia(TriviaKind::SemiColon, range);
                }
                TokenKind::CODE_EXIT | TokenKind::EOF => {}
                other => {
                    let span = self.empty_span_here();
                    self.fatal(span, format!("expected end of statement, found {other:?}"));
                }
            },
            Dialect::Liquid => match self.current() {
                TokenKind::CODE_EXIT | TokenKind::EOF => {}
                TokenKind::LIQUID_TAG_EXIT if self.liquid_tag_section() => {}
                other => {
                    let span = self.empty_span_here();
                    self.fatal(span, format!("expected end of statement, found {other:?}"));
                }
            },
        }
    }

    fn is_expression_start(&self) -> bool {
        matches!(
            self.current(),
            TokenKind::IDENTIFIER
                | TokenKind::IDENTIFIER_SPECIAL
                | TokenKind::INTEGER
                | TokenKind::FLOAT
                | TokenKind::STRING
                | TokenKind::LPAREN
                | TokenKind::LSQUARE
                | TokenKind::MINUS
                | TokenKind::BANG
                | TokenKind::AT
                | TokenKind::KW_TRUE
                | TokenKind::KW_FALSE
                | TokenKind::KW_NULL
                | TokenKind::KW_NOT
        )
    }

    fn dispatch_expression_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        if self.reject_if_case_body(parent) {
            return self.recover_after_case_misuse();
        }
        let start = self.current.range.start;
        let trivia_before = self.take_before_trivia();
        let expr = self.parse_expression();
        self.require_end_of_statement();
        let span = self.span_from(start, self.previous_end());
        let mut stmt = Stmt::new(span, StmtKind::Expression(expr));
        stmt.trivia = trivia_before;
        self.attach_after_trivia(&mut stmt.trivia);
        DispatchOutcome::stmt(stmt)
    }

    pub(super) fn reject_if_case_body(&mut self, parent: Option<TokenKind>) -> bool {
        if parent == Some(TokenKind::KW_CASE) {
            let span = self.empty_span_here();
            self.error(span, "unexpected statement in case body");
            true
        } else {
            false
        }
    }

    pub(super) fn recover_after_case_misuse(&mut self) -> DispatchOutcome {
        self.advance();
        DispatchOutcome::none(true)
    }

    fn has_anonymous_function_tail(&self) -> bool {
        self.has_anonymous_function
    }
}
