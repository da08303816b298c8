use tmplscript::{
    parse, BinaryOp, ConditionStmt, Dialect, ExprKind, LexerOptions, Literal, ParserOptions,
    ParsingMode, StmtKind,
};
use test_case::test_case;

fn parse_default(source: &str) -> tmplscript::ScriptPage {
    let options = LexerOptions::default();
    let (page, diagnostics) = parse(source, options, ParserOptions::default());
    assert!(!diagnostics.has_errors(), "unexpected errors: {:?}", diagnostics.messages());
    page.expect("parse should produce a page")
}

fn parse_liquid(source: &str) -> tmplscript::ScriptPage {
    let options = LexerOptions {
        dialect: Dialect::Liquid,
        ..LexerOptions::default()
    };
    let (page, diagnostics) = parse(source, options, ParserOptions::default());
    assert!(!diagnostics.has_errors(), "unexpected errors: {:?}", diagnostics.messages());
    page.expect("parse should produce a page")
}

#[test]
fn raw_text_around_an_expression_section() {
    let page = parse_default("Hello {{ name }} World");
    let stmts = &page.body.statements;
    assert_eq!(stmts.len(), 3);
    assert!(matches!(&stmts[0].kind, StmtKind::Raw { text, .. } if text == "Hello "));
    match &stmts[1].kind {
        StmtKind::Expression(expr) => {
            assert!(matches!(&*expr.kind, ExprKind::Variable(name) if name == "name"));
        }
        other => panic!("expected an expression statement, got {other:?}"),
    }
    assert!(matches!(&stmts[2].kind, StmtKind::Raw { text, .. } if text == " World"));
}

#[test]
fn liquid_if_else_chain() {
    let page = parse_liquid("{% if a %}X{% else %}Y{% endif %}");
    assert_eq!(page.body.statements.len(), 1);
    match &page.body.statements[0].kind {
        StmtKind::If(if_stmt) => {
            assert!(matches!(&*if_stmt.condition.kind, ExprKind::Variable(name) if name == "a"));
            assert!(!if_stmt.invert_condition);
            assert_eq!(if_stmt.then.statements.len(), 1);
            assert!(matches!(&if_stmt.then.statements[0].kind, StmtKind::Raw { text, .. } if text == "X"));
            match &if_stmt.otherwise {
                Some(ConditionStmt::Else(else_stmt)) => {
                    assert_eq!(else_stmt.body.statements.len(), 1);
                    assert!(matches!(&else_stmt.body.statements[0].kind, StmtKind::Raw { text, .. } if text == "Y"));
                }
                other => panic!("expected a trailing else, got {other:?}"),
            }
        }
        other => panic!("expected an if statement, got {other:?}"),
    }
}

#[test]
fn front_matter_then_body() {
    let options = LexerOptions {
        mode: ParsingMode::FrontMatterAndContent,
        ..LexerOptions::default()
    };
    let (page, diagnostics) = parse("+++\nx = 1\n+++\nHello", options, ParserOptions::default());
    assert!(!diagnostics.has_errors(), "unexpected errors: {:?}", diagnostics.messages());
    let page = page.expect("parse should produce a page");

    let front_matter = page.front_matter.expect("front matter block should be present");
    assert_eq!(front_matter.statements.len(), 1);
    match &front_matter.statements[0].kind {
        StmtKind::Expression(expr) => match &*expr.kind {
            ExprKind::Assign { target, value } => {
                assert!(matches!(&*target.kind, ExprKind::Variable(name) if name == "x"));
                assert!(matches!(&*value.kind, ExprKind::Literal(Literal::Integer(1))));
            }
            other => panic!("expected an assignment, got {other:?}"),
        },
        other => panic!("expected an expression statement, got {other:?}"),
    }

    assert!(matches!(&page.body.statements[0].kind, StmtKind::Raw { text, .. } if text == "Hello"));
}

#[test]
fn for_loop_over_an_array_literal() {
    let page = parse_default("{{ for x in [1,2,3] }}{{ x }}{{ end }}");
    assert_eq!(page.body.statements.len(), 1);
    match &page.body.statements[0].kind {
        StmtKind::For { variable, iterator, body } => {
            assert!(matches!(&*variable.kind, ExprKind::Variable(name) if name == "x"));
            assert!(matches!(&*iterator.kind, ExprKind::ArrayInitializer { values } if values.len() == 3));
            assert_eq!(body.statements.len(), 1);
            match &body.statements[0].kind {
                StmtKind::Expression(expr) => {
                    assert!(matches!(&*expr.kind, ExprKind::Variable(name) if name == "x"));
                }
                other => panic!("expected an expression statement, got {other:?}"),
            }
        }
        other => panic!("expected a for statement, got {other:?}"),
    }
}

#[test]
fn case_with_grouped_and_single_when_values() {
    let page = parse_liquid("{% case a %}{% when 1,2 %}A{% when 3 %}B{% else %}C{% endcase %}");
    assert_eq!(page.body.statements.len(), 1);
    match &page.body.statements[0].kind {
        StmtKind::Case { value, body } => {
            assert!(matches!(&*value.kind, ExprKind::Variable(name) if name == "a"));
            assert_eq!(body.statements.len(), 1);
            match &body.statements[0].kind {
                StmtKind::When(when_stmt) => {
                    assert_eq!(when_stmt.values.len(), 2);
                    assert_eq!(when_stmt.body.statements.len(), 1);
                    match when_stmt.next.as_ref() {
                        Some(ConditionStmt::When(next_when)) => {
                            assert_eq!(next_when.values.len(), 1);
                            match next_when.next.as_ref() {
                                Some(ConditionStmt::Else(else_stmt)) => {
                                    assert_eq!(else_stmt.body.statements.len(), 1);
                                }
                                other => panic!("expected a trailing else, got {other:?}"),
                            }
                        }
                        other => panic!("expected a chained when, got {other:?}"),
                    }
                }
                other => panic!("expected a when statement, got {other:?}"),
            }
        }
        other => panic!("expected a case statement, got {other:?}"),
    }
}

#[test]
fn bare_end_with_no_opener_is_an_error_and_run_returns_null() {
    let (page, diagnostics) = parse("{{ end }}", LexerOptions::default(), ParserOptions::default());
    assert!(diagnostics.has_errors());
    assert!(page.is_none());
}

#[test]
fn code_exit_without_a_matching_code_enter_is_an_error() {
    let (page, diagnostics) = parse("}}", LexerOptions::default(), ParserOptions::default());
    assert!(diagnostics.has_errors());
    let _ = page;
}

#[test]
fn empty_input_parses_to_an_empty_body_without_errors() {
    let page = parse_default("");
    assert!(page.body.statements.is_empty());
    assert!(page.front_matter.is_none());
}

#[test]
fn adjacent_code_sections_synthesize_two_nops() {
    let page = parse_default("{{ }}{{ }}");
    let nop_count = page
        .body
        .statements
        .iter()
        .filter(|stmt| matches!(stmt.kind, StmtKind::Nop))
        .count();
    assert_eq!(nop_count, 2);
}

#[test]
fn depth_limit_breach_reports_exactly_one_error() {
    let mut source = String::from("{{ ");
    for _ in 0..2000 {
        source.push_str("(");
    }
    source.push('1');
    for _ in 0..2000 {
        source.push(')');
    }
    source.push_str(" }}");

    let (_, diagnostics) = parse(&source, LexerOptions::default(), ParserOptions::default());
    let depth_errors = diagnostics
        .messages()
        .iter()
        .filter(|m| m.message.contains("depth"))
        .count();
    assert_eq!(depth_errors, 1);
}

#[test_case("{% assign x = 1 %}"; "assign")]
#[test_case("{% increment x %}"; "increment")]
#[test_case("{% decrement x %}"; "decrement")]
#[test_case("{% cycle \"a\", \"b\" %}"; "cycle")]
fn liquid_directives_desugar_to_assignment_expressions(source: &str) {
    let page = parse_liquid(source);
    assert_eq!(page.body.statements.len(), 1);
    match &page.body.statements[0].kind {
        StmtKind::Expression(expr) => {
            assert!(matches!(&*expr.kind, ExprKind::Assign { .. }));
        }
        other => panic!("expected an assignment expression, got {other:?}"),
    }
}

#[test]
fn increment_desugars_to_add_one() {
    let page = parse_liquid("{% increment x %}");
    match &page.body.statements[0].kind {
        StmtKind::Expression(expr) => match &*expr.kind {
            ExprKind::Assign { value, .. } => {
                assert!(matches!(&*value.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected an assign expression, got {other:?}"),
        },
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

#[test]
fn unless_desugars_to_inverted_if() {
    let page = parse_liquid("{% unless a %}X{% endunless %}");
    match &page.body.statements[0].kind {
        StmtKind::If(if_stmt) => assert!(if_stmt.invert_condition),
        other => panic!("expected an if statement, got {other:?}"),
    }
}

#[test]
fn stray_else_without_a_conditional_is_an_error() {
    let (_, diagnostics) = parse("{{ else }}", LexerOptions::default(), ParserOptions::default());
    assert!(diagnostics.has_errors());
}

#[test]
fn anonymous_function_with_do_block_body() {
    let page = parse_default("{{ f = @(x) => do ret x + 1 end }}");
    match &page.body.statements[0].kind {
        StmtKind::Expression(expr) => match &*expr.kind {
            ExprKind::Assign { value, .. } => {
                assert!(matches!(&*value.kind, ExprKind::AnonymousFunction { .. }));
            }
            other => panic!("expected an assign expression, got {other:?}"),
        },
        other => panic!("expected an expression statement, got {other:?}"),
    }
}
