//! Default-dialect keyword routing and the statement parsers it dispatches
//! to (spec §4.4.1, §4.5). `if`/`case`/`when`/`for`/`capture` are shared with
//! the Liquid dialect (see `liquid.rs`), since both recognize the same
//! conditional-chain and block shapes, differing only in which keyword
//! opens/closes them.

use super::dispatch::DispatchOutcome;
use super::Parser;
use crate::ast::{Block, ConditionStmt, ElseStmt, Expr, IfStmt, Stmt, StmtKind, WhenStmt};
use crate::options::Dialect;
use crate::syntax::TokenKind;

impl<'src> Parser<'src> {
    /// Default-dialect keyword routing (spec §4.4.1).
    pub(super) fn dispatch_default_keyword(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        match self.current() {
            TokenKind::KW_END => self.parse_end(),
            TokenKind::KW_IF => self.parse_if_entry(parent),
            TokenKind::KW_CASE => self.parse_case_statement(parent),
            TokenKind::KW_WHEN => self.parse_when_statement(parent),
            TokenKind::KW_ELSE => self.parse_else_entry(),
            TokenKind::KW_FOR if self.peek() != TokenKind::DOT => self.parse_for_statement(parent),
            TokenKind::KW_WHILE if self.peek() != TokenKind::DOT => self.parse_while_statement(parent),
            TokenKind::KW_WITH => self.parse_with_statement(parent),
            TokenKind::KW_WRAP => self.parse_wrap_statement(parent),
            TokenKind::KW_CAPTURE => self.parse_capture_statement(parent),
            TokenKind::KW_IMPORT => self.parse_import_statement(parent),
            TokenKind::KW_READONLY => self.parse_readonly_statement(parent),
            TokenKind::KW_FUNC => self.parse_func_statement(parent),
            TokenKind::KW_RET => self.parse_ret_statement(parent),
            TokenKind::KW_BREAK => self.parse_break_statement(),
            TokenKind::KW_CONTINUE => self.parse_continue_statement(),
            // `for`/`while` immediately followed by `.` is a member access on
            // a plain identifier, not a loop (spec §4.6 item 2).
            _ => self.parse_expression_statement_entry(parent),
        }
    }

    fn parse_end(&mut self) -> DispatchOutcome {
        let trivia_range = self.current_range();
        self.advance();
        let matched = self.block_stack_pop_if_matches(TokenKind::KW_END);
        if !matched {
            let span = self.empty_span_here();
            self.error(span, "unable to find matching statement for `end`");
        }
        self.push_trivia(crate::token::TriviaKind::End, trivia_range);
        self.require_end_of_statement();
        DispatchOutcome {
            stmt: None,
            has_end: true,
            keep_going: false,
        }
    }

    /// Resolves an `end`/`end<tag>` token against the block stack, popping
    /// the matched frame (and any intervening unmatched frames) on success
    /// (spec §4.3).
    pub(super) fn block_stack_pop_if_matches(&mut self, end_token: TokenKind) -> bool {
        if end_token.liquid_end_target().is_some() {
            match self.block_stack.find_liquid_end_target(end_token) {
                Some(depth) => {
                    for _ in 0..depth {
                        self.block_stack.pop();
                    }
                    true
                }
                None => false,
            }
        } else if self.block_stack.find_first_expecting_end().is_some() {
            self.block_stack.pop();
            true
        } else {
            false
        }
    }

    // ---- if / else chain (shared with Liquid `if`/`unless`/`ifchanged`) ----

    fn parse_if_entry(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        self.advance(); // `if`
        let condition = self.parse_expression();
        self.build_condition_chain(start, TokenKind::KW_IF, condition, false)
    }

    /// Builds an `If`/`Else`/`elsif` chain: pushes `opener` once, parses the
    /// `then` body (stopping without consuming at `else`/the matching end
    /// token), then recurses into any `else`/`elsif` continuation. The final
    /// closing `end`/`end<tag>` is left for the enclosing body loop to
    /// consume as its own statement, which is what actually pops `opener`
    /// off the block stack.
    pub(super) fn build_condition_chain(
        &mut self,
        start: usize,
        opener: TokenKind,
        condition: Expr,
        invert: bool,
    ) -> DispatchOutcome {
        self.require_end_of_statement();
        self.block_stack.push(opener, false);
        let then = self.parse_conditional_body(opener);
        let otherwise = self.parse_else_chain();

        let span = self.span_from(start, self.previous_end());
        let if_stmt = IfStmt {
            condition,
            is_else_if: false,
            invert_condition: invert,
            then,
            otherwise,
        };
        let stmt = Stmt::new(span, StmtKind::If(if_stmt));
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    /// Parses the statements of an `if`/`elsif` body, stopping (without
    /// consuming) at `else`, EOF, or the token that closes `opener`.
    fn parse_conditional_body(&mut self, opener: TokenKind) -> Block {
        let mut block = Block::new();
        loop {
            if self.at_condition_chain_boundary(opener) {
                break;
            }
            if let Some(stmt) = self.pop_synthesized() {
                block.statements.push(stmt);
                continue;
            }
            let outcome = self.try_parse_statement(Some(opener));
            if let Some(stmt) = outcome.stmt {
                block.statements.push(stmt);
            }
            if outcome.has_end || !outcome.keep_going {
                break;
            }
        }
        block
    }

    fn at_condition_chain_boundary(&self, opener: TokenKind) -> bool {
        if matches!(self.current(), TokenKind::KW_ELSE | TokenKind::EOF) {
            return true;
        }
        match self.dialect() {
            Dialect::Default => self.current() == TokenKind::KW_END,
            Dialect::Liquid => {
                self.current() == TokenKind::KW_ELSIF || self.current().liquid_end_target() == Some(opener)
            }
        }
    }

    /// After a body closes, checks for a chained `else`/`elsif` continuation
    /// without consuming the final closing token (spec §4.5).
    fn parse_else_chain(&mut self) -> Option<ConditionStmt> {
        if self.current() == TokenKind::KW_ELSIF && self.dialect() == Dialect::Liquid {
            let start = self.current.range.start;
            self.advance(); // `elsif`
            let condition = self.parse_expression();
            self.require_end_of_statement();
            let then = self.parse_conditional_body(TokenKind::KW_IF);
            let otherwise = self.parse_else_chain();
            let span = self.span_from(start, self.previous_end());
            return Some(ConditionStmt::If(Box::new(IfStmt {
                condition,
                is_else_if: true,
                invert_condition: false,
                then,
                otherwise,
            })));
        }
        if self.current() != TokenKind::KW_ELSE {
            return None;
        }
        let start = self.current.range.start;
        self.advance(); // `else`
        if self.current() == TokenKind::KW_IF {
            self.advance(); // `if`
            let condition = self.parse_expression();
            self.require_end_of_statement();
            let then = self.parse_conditional_body(TokenKind::KW_IF);
            let otherwise = self.parse_else_chain();
            let span = self.span_from(start, self.previous_end());
            return Some(ConditionStmt::If(Box::new(IfStmt {
                condition,
                is_else_if: true,
                invert_condition: false,
                then,
                otherwise,
            })));
        }
        self.require_end_of_statement();
        let body = self.parse_conditional_body(TokenKind::KW_IF);
        let _ = start;
        Some(ConditionStmt::Else(Box::new(ElseStmt { body })))
    }

    /// A bare `else` reaching the dispatcher directly (not consumed by
    /// `parse_else_chain`) has no preceding `if`/`when` (spec §7 item 4).
    fn parse_else_entry(&mut self) -> DispatchOutcome {
        let span = self.empty_span_here();
        self.error(span, "`else` without a preceding `if` or `when`");
        self.advance();
        DispatchOutcome {
            stmt: None,
            has_end: false,
            keep_going: true,
        }
    }

    // ---- case / when (shared with Liquid) ----

    pub(super) fn parse_case_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        self.advance(); // `case`
        let value = self.parse_expression();
        self.require_end_of_statement();

        self.block_stack.push(TokenKind::KW_CASE, false);
        let body = self.parse_body_block(Some(TokenKind::KW_CASE));

        let span = self.span_from(start, self.previous_end());
        let stmt = Stmt::new(span, StmtKind::Case { value, body });
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    pub(super) fn parse_when_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        if parent != Some(TokenKind::KW_CASE) && parent != Some(TokenKind::KW_WHEN) {
            let span = self.empty_span_here();
            self.error(span, "`when` outside of a `case` body");
        }
        let start = self.current.range.start;
        self.advance(); // `when`
        let values = self.parse_when_value_list();
        if values.is_empty() {
            let span = self.empty_span_here();
            self.error(span, "`when` requires at least one value");
        }
        self.require_end_of_statement();
        let body = self.parse_when_or_else_body();
        let next = self.parse_when_or_else_continuation();

        let span = self.span_from(start, self.previous_end());
        let when_stmt = WhenStmt { values, body, next };
        let stmt = Stmt::new(span, StmtKind::When(when_stmt));
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    fn parse_when_value_list(&mut self) -> Vec<Expr> {
        let mut values = Vec::new();
        loop {
            if !self.at_expression_start() {
                break;
            }
            values.push(self.parse_expression());
            if self.current() == TokenKind::COMMA {
                self.advance();
                continue;
            }
            break;
        }
        values
    }

    /// Parses statements for a `when`/`else` body inside a `case`, stopping
    /// (without consuming) at the next `when`/`else`/the token that closes
    /// the enclosing `case` (spec §4.4.1, scenario 5).
    pub(super) fn parse_when_or_else_body(&mut self) -> Block {
        let mut block = Block::new();
        loop {
            if self.at_when_chain_boundary() {
                break;
            }
            if let Some(stmt) = self.pop_synthesized() {
                block.statements.push(stmt);
                continue;
            }
            let outcome = self.try_parse_statement(Some(TokenKind::KW_WHEN));
            if let Some(stmt) = outcome.stmt {
                block.statements.push(stmt);
            }
            if outcome.has_end || !outcome.keep_going {
                break;
            }
        }
        block
    }

    fn at_when_chain_boundary(&self) -> bool {
        matches!(self.current(), TokenKind::KW_WHEN | TokenKind::KW_ELSE | TokenKind::EOF)
            || self.current() == TokenKind::KW_END
            || self.current().liquid_end_target() == Some(TokenKind::KW_CASE)
    }

    fn parse_when_or_else_continuation(&mut self) -> Option<ConditionStmt> {
        match self.current() {
            TokenKind::KW_WHEN => {
                let outcome = self.parse_when_statement(Some(TokenKind::KW_WHEN));
                if let Some(stmt) = outcome.stmt {
                    if let StmtKind::When(w) = stmt.kind {
                        return Some(ConditionStmt::When(Box::new(w)));
                    }
                }
                None
            }
            TokenKind::KW_ELSE => {
                self.advance();
                self.require_end_of_statement();
                let body = self.parse_when_or_else_body();
                Some(ConditionStmt::Else(Box::new(ElseStmt { body })))
            }
            _ => None,
        }
    }

    // ---- for / while (shared with Liquid `for`) ----

    pub(super) fn parse_for_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        self.advance(); // `for`
        let variable = self.parse_variable();
        if self.current() == TokenKind::KW_IN {
            self.advance();
        } else {
            let span = self.empty_span_here();
            self.error(span, "expected `in` after `for` loop variable");
        }
        let iterator = self.parse_expression();
        self.require_end_of_statement();

        self.block_stack.push(TokenKind::KW_FOR, true);
        let body = self.parse_body_block(Some(TokenKind::KW_FOR));

        let span = self.span_from(start, self.previous_end());
        let stmt = Stmt::new(span, StmtKind::For { variable, iterator, body });
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    fn parse_while_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        self.advance(); // `while`
        let condition = self.parse_expression();
        self.require_end_of_statement();

        self.block_stack.push(TokenKind::KW_WHILE, true);
        let body = self.parse_body_block(Some(TokenKind::KW_WHILE));

        let span = self.span_from(start, self.previous_end());
        let stmt = Stmt::new(span, StmtKind::While { condition, body });
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    // ---- capture (shared with Liquid) / with / wrap ----

    pub(super) fn parse_capture_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        self.advance(); // `capture`
        let target = self.parse_expression();
        self.require_end_of_statement();

        self.block_stack.push(TokenKind::KW_CAPTURE, false);
        let body = self.parse_body_block(Some(TokenKind::KW_CAPTURE));

        let span = self.span_from(start, self.previous_end());
        let stmt = Stmt::new(span, StmtKind::Capture { target, body });
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    fn parse_with_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        self.advance(); // `with`
        let name = self.parse_expression();
        self.require_end_of_statement();

        self.block_stack.push(TokenKind::KW_WITH, false);
        let body = self.parse_body_block(Some(TokenKind::KW_WITH));

        let span = self.span_from(start, self.previous_end());
        let stmt = Stmt::new(span, StmtKind::With { name, body });
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    fn parse_wrap_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        self.advance(); // `wrap`
        let target = self.parse_expression();
        self.require_end_of_statement();

        self.block_stack.push(TokenKind::KW_WRAP, false);
        let body = self.parse_body_block(Some(TokenKind::KW_WRAP));

        let span = self.span_from(start, self.previous_end());
        let stmt = Stmt::new(span, StmtKind::Wrap { target, body });
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    fn parse_func_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        self.advance(); // `func`
        let name = if self.current() == TokenKind::IDENTIFIER {
            let text = self.current_text().as_str().to_string();
            self.advance();
            Some(text)
        } else {
            None
        };
        self.require_end_of_statement();

        self.block_stack.push(TokenKind::KW_FUNC, false);
        let body = self.parse_body_block(Some(TokenKind::KW_FUNC));

        let span = self.span_from(start, self.previous_end());
        let stmt = Stmt::new(span, StmtKind::Function { name, body });
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    fn parse_import_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        let trivia_before = self.take_before_trivia();
        self.advance(); // `import`
        let expression = self.parse_expression();
        self.require_end_of_statement();
        let span = self.span_from(start, self.previous_end());
        let mut stmt = Stmt::new(span, StmtKind::Import { expression });
        stmt.trivia = trivia_before;
        self.attach_after_trivia(&mut stmt.trivia);
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    fn parse_readonly_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        let trivia_before = self.take_before_trivia();
        self.advance(); // `readonly`
        let variable = self.parse_variable();
        self.require_end_of_statement();
        let span = self.span_from(start, self.previous_end());
        let mut stmt = Stmt::new(span, StmtKind::ReadOnly { variable });
        stmt.trivia = trivia_before;
        self.attach_after_trivia(&mut stmt.trivia);
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    fn parse_ret_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        let trivia_before = self.take_before_trivia();
        self.advance(); // `ret`
        let expression = if self.at_expression_start() {
            Some(self.parse_expression())
        } else {
            None
        };
        self.require_end_of_statement();
        let span = self.span_from(start, self.previous_end());
        let mut stmt = Stmt::new(span, StmtKind::Return { expression });
        stmt.trivia = trivia_before;
        self.attach_after_trivia(&mut stmt.trivia);
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    pub(super) fn parse_break_statement(&mut self) -> DispatchOutcome {
        let start = self.current.range.start;
        let trivia_before = self.take_before_trivia();
        self.advance(); // `break`
        self.require_end_of_statement();
        let span = self.span_from(start, self.previous_end());
        let mut stmt = Stmt::new(span, StmtKind::Break);
        stmt.trivia = trivia_before;
        self.attach_after_trivia(&mut stmt.trivia);
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    pub(super) fn parse_continue_statement(&mut self) -> DispatchOutcome {
        let start = self.current.range.start;
        let trivia_before = self.take_before_trivia();
        self.advance(); // `continue`
        self.require_end_of_statement();
        let span = self.span_from(start, self.previous_end());
        let mut stmt = Stmt::new(span, StmtKind::Continue);
        stmt.trivia = trivia_before;
        self.attach_after_trivia(&mut stmt.trivia);
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    // ---- plain expression statement (shared dispatch exit) ----

    pub(super) fn parse_expression_statement_entry(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current.range.start;
        let trivia_before = self.take_before_trivia();
        let expr = self.parse_expression();
        self.require_end_of_statement();
        let span = self.span_from(start, self.previous_end());
        let mut stmt = Stmt::new(span, StmtKind::Expression(expr));
        stmt.trivia = trivia_before;
        self.attach_after_trivia(&mut stmt.trivia);
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }
}
