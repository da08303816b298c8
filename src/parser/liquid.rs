//! Liquid-dialect statement parsing (spec §4.4.2, §4.5): tag-section keyword
//! routing, `end<tag>` resolution, and the handful of statements that have
//! no Default-dialect counterpart (`assign`, `cycle`, `increment`,
//! `decrement`, `unless`, `ifchanged`). `if`/`case`/`when`/`for`/`capture`
//! reuse the shared parsers in `statements.rs`.

use super::dispatch::DispatchOutcome;
use super::Parser;
use crate::ast::{Expr, ExprKind, PathSegment, Stmt, StmtKind};
use crate::syntax::TokenKind;

impl<'src> Parser<'src> {
    /// Routes a token inside a Liquid tag section (`{% ... %}`) or an object
    /// section (`{{ ... }}`). Object sections never contain statement
    /// keywords, only a single expression, so keyword identifiers there are
    /// just variable names.
    pub(super) fn dispatch_liquid_identifier(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        if !self.liquid_tag_section() {
            return self.parse_expression_statement_entry(parent);
        }
        match self.current() {
            TokenKind::KW_IF => self.parse_liquid_if(parent),
            TokenKind::KW_UNLESS => self.parse_liquid_unless(parent),
            TokenKind::KW_IFCHANGED => self.parse_liquid_ifchanged(parent),
            TokenKind::KW_CASE => self.parse_case_statement(parent),
            TokenKind::KW_WHEN => self.parse_when_statement(parent),
            TokenKind::KW_ELSE | TokenKind::KW_ELSIF => self.parse_liquid_stray_else(),
            TokenKind::KW_FOR => self.parse_for_statement(parent),
            TokenKind::KW_CAPTURE => self.parse_capture_statement(parent),
            TokenKind::KW_CYCLE => self.parse_cycle_statement(parent),
            TokenKind::KW_ASSIGN => self.parse_assign_statement(parent),
            TokenKind::KW_INCREMENT => self.parse_increment_statement(parent, true),
            TokenKind::KW_DECREMENT => self.parse_increment_statement(parent, false),
            TokenKind::KW_BREAK => self.parse_break_statement(),
            TokenKind::KW_CONTINUE => self.parse_continue_statement(),
            _ => self.parse_expression_statement_entry(parent),
        }
    }

    /// Resolves a Liquid `end<tag>` keyword against the block stack (spec
    /// §4.3). Unlike Default's bare `end`, the tag being closed is encoded in
    /// the keyword itself (`endif`, `endfor`, ...).
    pub(super) fn dispatch_liquid_end(&mut self, _parent: Option<TokenKind>) -> DispatchOutcome {
        let end_token = self.current();
        let range = self.current_range();
        self.advance();
        let matched = self.block_stack_pop_if_matches(end_token);
        if !matched {
            let span = self.empty_span_here();
            self.error(span, format!("unable to find matching statement for {end_token:?}"));
        }
        self.push_trivia(crate::token::TriviaKind::End, range);
        self.require_end_of_statement();
        DispatchOutcome {
            stmt: None,
            has_end: true,
            keep_going: false,
        }
    }

    fn parse_liquid_if(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current_range().start;
        self.advance(); // `if`
        let condition = self.parse_expression();
        self.build_condition_chain(start, TokenKind::KW_IF, condition, false)
    }

    /// `unless condition ... endunless` desugars to an inverted `if` (spec
    /// §4.5): same chain machinery, `invert_condition` set, opener recorded
    /// as `KW_UNLESS` so `endunless` (not `endif`) closes it.
    fn parse_liquid_unless(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current_range().start;
        self.advance(); // `unless`
        let condition = self.parse_expression();
        self.build_condition_chain(start, TokenKind::KW_UNLESS, condition, true)
    }

    /// `ifchanged ... endifchanged` desugars to `if (loop.changed)`: the
    /// condition is synthesized rather than parsed, since `ifchanged` takes
    /// no expression of its own (spec §4.5, Open Question: the evaluator
    /// is responsible for populating `loop.changed`; the parser's job is
    /// only to shape the equivalent `If` node).
    fn parse_liquid_ifchanged(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let start = self.current_range().start;
        self.advance(); // `ifchanged`
        let condition = self.synthesize_loop_changed_condition(start);
        self.build_condition_chain(start, TokenKind::KW_IFCHANGED, condition, false)
    }

    fn synthesize_loop_changed_condition(&self, at: usize) -> Expr {
        let span = self.span_from(at, at);
        let loop_var = Expr::new(span.clone(), ExprKind::Variable("loop".to_string()));
        Expr::new(
            span,
            ExprKind::VariablePath {
                base: loop_var,
                segments: vec![crate::ast::PathSegment::Member("changed".to_string())],
            },
        )
    }

    /// Builds the callee for a Liquid function-style statement. With
    /// `translate_liquid_calls` off, the call keeps its bare Liquid spelling
    /// (`cycle(...)`); when on, it's exposed under the Default dialect's
    /// `loop.*` builtin namespace instead (`loop.cycle(...)`), matching how
    /// `ifchanged` already reaches `loop.changed` (spec §4.13).
    fn liquid_call_target(&self, name: &str, span: crate::span::Span) -> Expr {
        if !self.options.translate_liquid_calls {
            return Expr::new(span, ExprKind::Variable(name.to_string()));
        }
        let loop_var = Expr::new(span.clone(), ExprKind::Variable("loop".to_string()));
        Expr::new(
            span,
            ExprKind::VariablePath {
                base: loop_var,
                segments: vec![PathSegment::Member(name.to_string())],
            },
        )
    }

    /// A bare `else`/`elsif` reaching the dispatcher directly (not consumed
    /// by `parse_else_chain`/a `when` continuation) has no preceding
    /// `if`/`unless`/`when` (spec §7 item 4).
    fn parse_liquid_stray_else(&mut self) -> DispatchOutcome {
        let span = self.empty_span_here();
        self.error(span, "`else`/`elsif` without a preceding conditional");
        self.advance();
        DispatchOutcome {
            stmt: None,
            has_end: false,
            keep_going: true,
        }
    }

    /// `cycle ["group":] a, b, ...` desugars to `group = cycle(a, b, ...)`:
    /// a call to a builtin `cycle` function, assigned to a per-group state
    /// variable (spec §4.5 Open Question: cycle-position tracking is an
    /// evaluator concern, not a parser one).
    fn parse_cycle_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let trivia_before = self.take_before_trivia();
        let start = self.current_range().start;
        self.advance(); // `cycle`

        let group = if self.current() == TokenKind::STRING && self.peek() == TokenKind::COLON {
            let name = self.decode_string_literal();
            self.advance(); // string
            self.advance(); // `:`
            Some(name)
        } else {
            None
        };

        let mut values = vec![self.parse_expression()];
        while self.current() == TokenKind::COMMA {
            self.advance();
            values.push(self.parse_expression());
        }
        self.require_end_of_statement();

        let span = self.span_from(start, self.previous_end());
        let target = Expr::new(span.clone(), ExprKind::Variable(group.unwrap_or_else(|| "cycle".to_string())));
        let cycle_fn = self.liquid_call_target("cycle", span.clone());
        let call = Expr::new(span.clone(), ExprKind::FunctionCall { target: cycle_fn, arguments: values });
        let assign = Expr::new(span.clone(), ExprKind::Assign { target, value: call });
        let mut stmt = Stmt::new(span, StmtKind::Expression(assign));
        stmt.trivia = trivia_before;
        self.attach_after_trivia(&mut stmt.trivia);
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    /// `assign name = value` (spec §4.5): builds the same `Assign`
    /// expression shape the Default dialect reaches via `name = value` as a
    /// bare expression statement. Pending trivia is discarded rather than
    /// attached, per the statement's literal algorithm ("clear pending
    /// trivia, advance, parse an expression statement").
    fn parse_assign_statement(&mut self, parent: Option<TokenKind>) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        self.discard_orphan_trivia();
        let start = self.current_range().start;
        self.advance(); // `assign`
        let target = self.parse_variable();
        self.expect(TokenKind::EQUAL, "=");
        let value = self.parse_expression();
        self.require_end_of_statement();
        let span = self.span_from(start, self.previous_end());
        let assign = Expr::new(span.clone(), ExprKind::Assign { target, value });
        let stmt = Stmt::new(span, StmtKind::Expression(assign));
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }

    /// `increment name` / `decrement name`: modeled as `name = name + 1` (or
    /// `- 1`), matching how `assign` is represented (spec §4.5).
    fn parse_increment_statement(&mut self, parent: Option<TokenKind>, increment: bool) -> DispatchOutcome {
        self.reject_if_case_body(parent);
        let trivia_before = self.take_before_trivia();
        let start = self.current_range().start;
        self.advance(); // `increment`/`decrement`
        let target = self.parse_variable();
        self.require_end_of_statement();
        let span = self.span_from(start, self.previous_end());

        let one = Expr::new(span.clone(), ExprKind::Literal(crate::ast::Literal::Integer(1)));
        let op = if increment { crate::ast::BinaryOp::Add } else { crate::ast::BinaryOp::Subtract };
        let binary = Expr::new(
            span.clone(),
            ExprKind::Binary {
                op,
                left: target.clone(),
                right: one,
            },
        );
        let assign = Expr::new(span.clone(), ExprKind::Assign { target, value: binary });
        let mut stmt = Stmt::new(span, StmtKind::Expression(assign));
        stmt.trivia = trivia_before;
        self.attach_after_trivia(&mut stmt.trivia);
        DispatchOutcome {
            stmt: Some(stmt),
            has_end: false,
            keep_going: true,
        }
    }
}
