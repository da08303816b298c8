//! The expression parser: precedence-climbing (Pratt-style) over the
//! shared token stream, plus the anonymous-function tail and the
//! keyword→expression promotion hook the dispatcher relies on (spec §4.6,
//! §6.3).

use super::Parser;
use crate::ast::{BinaryOp, Expr, ExprKind, FunctionBody, Literal, PathSegment, UnaryOp};
use crate::syntax::TokenKind;

#[derive(Clone, Copy, PartialEq, PartialOrd)]
enum Prec {
    Lowest,
    Assignment,
    Pipe,
    Conditional,
    NullCoalesce,
    Or,
    And,
    Equality,
    Relational,
    Range,
    Additive,
    Multiplicative,
}

impl<'src> Parser<'src> {
    /// Returns `true` if the current token can start an expression; used by
    /// the dispatcher's keyword→expression promotion (`for`/`while` followed
    /// immediately by `.`) and by the `ret` statement's optional value.
    pub(super) fn at_expression_start(&self) -> bool {
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

    /// Parses one full expression at the lowest precedence level
    /// (assignment). This is the facade the dispatcher and statement
    /// parsers call into (spec §4.6).
    pub(super) fn parse_expression(&mut self) -> Expr {
        let span = self.empty_span_here();
        self.enter_nesting(&span);
        let expr = self.parse_assignment();
        self.leave_nesting();
        expr
    }

    /// Parses a bare variable reference, used where the grammar calls for a
    /// plain variable rather than a full expression (`for` loop variable,
    /// `readonly` target, Liquid `assign` target disambiguation).
    pub(super) fn parse_variable(&mut self) -> Expr {
        let start = self.current.range.start;
        match self.current() {
            TokenKind::IDENTIFIER => {
                let name = self.current_text().to_string();
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::Variable(name))
            }
            TokenKind::IDENTIFIER_SPECIAL => {
                let name = self.current_text().to_string();
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::VariableSpecial(name))
            }
            other => {
                let span = self.empty_span_here();
                self.error(span, format!("expected a variable, found {other:?}"));
                Expr::new(self.empty_span_here(), ExprKind::Variable(String::new()))
            }
        }
    }

    fn parse_assignment(&mut self) -> Expr {
        let start = self.current.range.start;
        let left = self.parse_pipe();
        if self.current() == TokenKind::EQUAL {
            self.advance();
            let value = self.parse_assignment();
            let span = self.span_from(start, self.previous_end());
            return Expr::new(span, ExprKind::Assign { target: left, value });
        }
        left
    }

    fn parse_pipe(&mut self) -> Expr {
        let start = self.current.range.start;
        let mut left = self.parse_null_coalesce();
        while self.current() == TokenKind::PIPE {
            self.advance();
            let target = self.parse_null_coalesce();
            let span = self.span_from(start, self.previous_end());
            left = Expr::new(span, ExprKind::PipeCall { from: left, target });
        }
        left
    }

    fn parse_null_coalesce(&mut self) -> Expr {
        self.parse_left_assoc_binary(Self::parse_conditional, &[(TokenKind::QUESTION_QUESTION, BinaryOp::NullCoalesce)])
    }

    /// `condition ? then : otherwise`, right-associative (a ternary's
    /// `then`/`otherwise` arms may themselves be ternaries).
    fn parse_conditional(&mut self) -> Expr {
        let start = self.current.range.start;
        let condition = self.parse_or();
        if self.current() != TokenKind::QUESTION {
            return condition;
        }
        self.advance();
        let then = self.parse_conditional();
        self.expect(TokenKind::COLON, ":");
        let otherwise = self.parse_conditional();
        let span = self.span_from(start, self.previous_end());
        Expr::new(span, ExprKind::Conditional { condition, then, otherwise })
    }

    fn parse_or(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_and,
            &[(TokenKind::OR, BinaryOp::Or), (TokenKind::KW_OR, BinaryOp::Or)],
        )
    }

    fn parse_and(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_equality,
            &[(TokenKind::AMP_AMP, BinaryOp::And), (TokenKind::KW_AND, BinaryOp::And)],
        )
    }

    fn parse_equality(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_relational,
            &[
                (TokenKind::EQUAL_EQUAL, BinaryOp::Equal),
                (TokenKind::NOT_EQUAL, BinaryOp::NotEqual),
            ],
        )
    }

    fn parse_relational(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_range,
            &[
                (TokenKind::LESS, BinaryOp::Less),
                (TokenKind::LESS_EQUAL, BinaryOp::LessEqual),
                (TokenKind::GREATER, BinaryOp::Greater),
                (TokenKind::GREATER_EQUAL, BinaryOp::GreaterEqual),
            ],
        )
    }

    fn parse_range(&mut self) -> Expr {
        let start = self.current.range.start;
        let from = self.parse_additive();
        let is_exclusive = match self.current() {
            TokenKind::DOT_DOT => false,
            TokenKind::DOT_DOT_LT => true,
            _ => return from,
        };
        self.advance();
        let to = self.parse_additive();
        let span = self.span_from(start, self.previous_end());
        Expr::new(span, ExprKind::Range { from, to, is_exclusive })
    }

    fn parse_additive(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_multiplicative,
            &[(TokenKind::PLUS, BinaryOp::Add), (TokenKind::MINUS, BinaryOp::Subtract)],
        )
    }

    fn parse_multiplicative(&mut self) -> Expr {
        self.parse_left_assoc_binary(
            Self::parse_unary,
            &[
                (TokenKind::STAR, BinaryOp::Multiply),
                (TokenKind::SLASH, BinaryOp::Divide),
                (TokenKind::PERCENT, BinaryOp::Modulo),
                (TokenKind::STAR_STAR, BinaryOp::Power),
            ],
        )
    }

    fn parse_left_assoc_binary(
        &mut self,
        mut next: impl FnMut(&mut Self) -> Expr,
        ops: &[(TokenKind, BinaryOp)],
    ) -> Expr {
        let start = self.current.range.start;
        let mut left = next(self);
        loop {
            let current = self.current();
            let Some(&(_, op)) = ops.iter().find(|(kind, _)| *kind == current) else {
                break;
            };
            self.advance();
            let right = next(self);
            let span = self.span_from(start, self.previous_end());
            left = Expr::new(span, ExprKind::Binary { op, left, right });
        }
        left
    }

    fn parse_unary(&mut self) -> Expr {
        let start = self.current.range.start;
        let op = match self.current() {
            TokenKind::MINUS => Some(UnaryOp::Negate),
            TokenKind::BANG | TokenKind::KW_NOT => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary();
            let span = self.span_from(start, self.previous_end());
            return Expr::new(span, ExprKind::Unary { op, operand });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let start = self.current.range.start;
        let mut base = self.parse_primary();
        let mut segments: Vec<PathSegment> = Vec::new();

        loop {
            match self.current() {
                TokenKind::DOT => {
                    self.advance();
                    let name = match self.current() {
                        TokenKind::IDENTIFIER | TokenKind::IDENTIFIER_SPECIAL => {
                            let text = self.current_text().to_string();
                            self.advance();
                            text
                        }
                        other => {
                            let span = self.empty_span_here();
                            self.error(span, format!("expected a member name after `.`, found {other:?}"));
                            String::new()
                        }
                    };
                    segments.push(PathSegment::Member(name));
                }
                TokenKind::LSQUARE => {
                    self.advance();
                    self.enter_allow_new_line();
                    let index = self.parse_expression();
                    self.leave_allow_new_line();
                    self.expect(TokenKind::RSQUARE, "]");
                    segments.push(PathSegment::Index(index));
                }
                TokenKind::LPAREN => {
                    let args = self.parse_argument_list();
                    segments.push(PathSegment::Call(args));
                }
                _ => break,
            }
        }

        if segments.is_empty() {
            return base;
        }
        let span = self.span_from(start, self.previous_end());
        base.span = span.clone();
        Expr::new(span, ExprKind::VariablePath { base, segments })
    }

    fn parse_argument_list(&mut self) -> Vec<Expr> {
        self.expect(TokenKind::LPAREN, "(");
        self.enter_allow_new_line();
        let mut args = Vec::new();
        if self.current() != TokenKind::RPAREN {
            loop {
                args.push(self.parse_assignment());
                if self.current() == TokenKind::COMMA {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.leave_allow_new_line();
        self.expect(TokenKind::RPAREN, ")");
        args
    }

    fn parse_primary(&mut self) -> Expr {
        let start = self.current.range.start;
        match self.current() {
            TokenKind::INTEGER => {
                let text = self.current_text();
                let value = text.parse::<i64>().unwrap_or(0);
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::Literal(Literal::Integer(value)))
            }
            TokenKind::FLOAT => {
                let text = self.current_text();
                let value = text.parse::<f64>().unwrap_or(0.0);
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::Literal(Literal::Float(value)))
            }
            TokenKind::STRING => {
                let value = self.decode_string_literal();
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::Literal(Literal::String(value)))
            }
            TokenKind::KW_TRUE => {
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::Literal(Literal::Bool(true)))
            }
            TokenKind::KW_FALSE => {
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::Literal(Literal::Bool(false)))
            }
            TokenKind::KW_NULL => {
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::Literal(Literal::Null))
            }
            TokenKind::IDENTIFIER => {
                let name = self.current_text().to_string();
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::Variable(name))
            }
            TokenKind::IDENTIFIER_SPECIAL => {
                let name = self.current_text().to_string();
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::VariableSpecial(name))
            }
            TokenKind::LPAREN => {
                self.advance();
                self.enter_allow_new_line();
                let inner = self.parse_expression();
                self.leave_allow_new_line();
                self.expect(TokenKind::RPAREN, ")");
                inner
            }
            TokenKind::LSQUARE => self.parse_array_initializer(start),
            TokenKind::LCURLY => self.parse_object_initializer(start),
            TokenKind::AT => self.parse_anonymous_function(start),
            other => {
                let span = self.empty_span_here();
                self.error(span, format!("unexpected token {other:?} in expression"));
                self.advance();
                Expr::new(self.span_from(start, self.previous_end()), ExprKind::Literal(Literal::Null))
            }
        }
    }

    pub(super) fn decode_string_literal(&self) -> String {
        let raw = self.current_text();
        let s = raw.as_str();
        let inner = if s.len() >= 2 { &s[1..s.len() - 1] } else { "" };
        if memchr::memchr(b'\\', inner.as_bytes()).is_none() {
            return inner.to_string();
        }
        unescape_zero_copy::unescape(string_escape_handler, inner)
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| inner.to_string())
    }

    fn parse_array_initializer(&mut self, start: usize) -> Expr {
        self.advance(); // `[`
        self.enter_allow_new_line();
        let mut values = Vec::new();
        if self.current() != TokenKind::RSQUARE {
            loop {
                values.push(self.parse_assignment());
                if self.current() == TokenKind::COMMA {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.leave_allow_new_line();
        self.expect(TokenKind::RSQUARE, "]");
        Expr::new(self.span_from(start, self.previous_end()), ExprKind::ArrayInitializer { values })
    }

    fn parse_object_initializer(&mut self, start: usize) -> Expr {
        self.advance(); // `{`
        self.enter_allow_new_line();
        let mut entries = Vec::new();
        if self.current() != TokenKind::RCURLY {
            loop {
                let key = match self.current() {
                    TokenKind::IDENTIFIER => self.current_text().to_string(),
                    TokenKind::STRING => self.decode_string_literal(),
                    other => {
                        let span = self.empty_span_here();
                        self.error(span, format!("expected an object key, found {other:?}"));
                        String::new()
                    }
                };
                self.advance();
                self.expect(TokenKind::COLON, ":");
                let value = self.parse_assignment();
                entries.push((key, value));
                if self.current() == TokenKind::COMMA {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.leave_allow_new_line();
        self.expect(TokenKind::RCURLY, "}");
        Expr::new(self.span_from(start, self.previous_end()), ExprKind::ObjectInitializer { entries })
    }

    /// `@(params) => body`. `body` is an expression unless the tail opens a
    /// `do ... end` block, in which case the block's own `end` already
    /// serves as this statement's terminator and `has_anonymous_function` is
    /// set so the dispatcher skips its end-of-statement check (spec §4.6).
    fn parse_anonymous_function(&mut self, start: usize) -> Expr {
        self.advance(); // `@`
        self.expect(TokenKind::LPAREN, "(");
        let mut parameters = Vec::new();
        if self.current() != TokenKind::RPAREN {
            loop {
                match self.current() {
                    TokenKind::IDENTIFIER => {
                        parameters.push(self.current_text().to_string());
                        self.advance();
                    }
                    other => {
                        let span = self.empty_span_here();
                        self.error(span, format!("expected a parameter name, found {other:?}"));
                        break;
                    }
                }
                if self.current() == TokenKind::COMMA {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RPAREN, ")");
        self.expect(TokenKind::FAT_ARROW, "=>");

        let body = if self.current() == TokenKind::IDENTIFIER && self.current_text().as_str() == "do" {
            self.advance();
            self.block_stack.push(TokenKind::AT, false);
            let block = self.parse_body_block(Some(TokenKind::AT));
            self.has_anonymous_function = true;
            FunctionBody::Block(block)
        } else {
            FunctionBody::Expression(self.parse_assignment())
        };

        Expr::new(
            self.span_from(start, self.previous_end()),
            ExprKind::AnonymousFunction {
                parameters,
                body: Box::new(body),
            },
        )
    }

    pub(super) fn expect(&mut self, kind: TokenKind, describe: &str) {
        if self.current() == kind {
            self.advance();
        } else {
            let span = self.empty_span_here();
            let found = self.current();
            self.error(span, format!("expected `{describe}`, found {found:?}"));
        }
    }
}

fn string_escape_handler(rest: &str) -> Result<(Option<char>, &str), unescape_zero_copy::Error> {
    let mut chars = rest.chars();
    let c = chars
        .next()
        .ok_or(unescape_zero_copy::Error::IncompleteSequence)?;
    let mapped = match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        '\\' => '\\',
        '"' => '"',
        '\'' => '\'',
        other => other,
    };
    Ok((Some(mapped), chars.as_str()))
}
