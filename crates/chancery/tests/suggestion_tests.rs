//! Cursor-probe behavior: which terminals does the grammar admit at a
//! character offset, with and without surrounding input.

use chancery::{Elem, Grammar, MatchKind, Matching, Parser, WhitespaceLexer};

fn arithmetic() -> Parser<WhitespaceLexer> {
    let grammar = Grammar::builder()
        .start("expr")
        .rule(
            "expr",
            [
                Elem::rule("term"),
                Elem::any_of([Elem::lit("+"), Elem::lit("-")]),
                Elem::rule("term"),
            ],
        )
        .rule("term", [Elem::any_of([Elem::lit("a"), Elem::lit("b")])])
        .build()
        .unwrap();
    Parser::new(grammar, WhitespaceLexer)
}

fn values(matchings: &[Matching]) -> Vec<&str> {
    matchings.iter().map(|m| m.value.as_str()).collect()
}

#[test]
fn test_cursor_before_all_tokens_offers_first_set() {
    let mut parser = arithmetic();
    let result = parser.parse("", 0).unwrap();

    assert_eq!(values(&result.next_matchings), ["a", "b"]);
    assert!(result
        .next_matchings
        .iter()
        .all(|m| m.kind == MatchKind::Literal));
}

#[test]
fn test_cursor_at_start_of_input_is_filtered_by_next_token() {
    let mut parser = arithmetic();
    // Cursor at 0 with input present: the first set narrows to terminals
    // that accept the token sitting after the cursor.
    let result = parser.parse("a + b", 0).unwrap();
    assert_eq!(values(&result.next_matchings), ["a"]);
}

#[test]
fn test_cursor_after_first_term() {
    let mut parser = arithmetic();
    let result = parser.parse("a ", 2).unwrap();

    assert!(!result.success);
    assert_eq!(values(&result.next_matchings), ["+", "-"]);
}

#[test]
fn test_cursor_between_tokens_is_filtered_by_following_token() {
    let mut parser = arithmetic();
    // Between "a" and "+": the grammar admits '+' or '-' after a term, but
    // only '+' is consistent with the token already there.
    let result = parser.parse("a + b", 2).unwrap();

    assert!(result.success);
    assert_eq!(values(&result.next_matchings), ["+"]);
}

#[test]
fn test_cursor_at_end_of_accepted_input() {
    let mut parser = arithmetic();
    let result = parser.parse("a + b", 5).unwrap();

    assert!(result.success);
    // Nothing may follow a complete expression.
    assert!(result.next_matchings.is_empty());
}

#[test]
fn test_suggestions_describe_grammar_despite_wrong_input() {
    let mut parser = arithmetic();
    // The cursor sits after "a", where the grammar admits an operator. The
    // '&' already there survives no candidate's filter, so the cursor view
    // is empty, but the failure diagnostics still carry the grammar's offer.
    let result = parser.parse("a & b", 2).unwrap();

    assert!(!result.success);
    assert!(result.next_matchings.is_empty());
    assert_eq!(values(&result.error.unwrap().suggestions), ["+", "-"]);
}

#[test]
fn test_next_matchings_dedup_across_alternatives() {
    // Both branches can be followed by ';', reached through different
    // expansions of the same terminal text.
    let grammar = Grammar::builder()
        .start("stmt")
        .rule(
            "stmt",
            [
                Elem::any_of([Elem::rule("left"), Elem::rule("right")]),
                Elem::lit(";"),
            ],
        )
        .rule("left", [Elem::lit("x")])
        .rule("right", [Elem::any_of([Elem::lit("x"), Elem::lit("y")])])
        .build()
        .unwrap();
    let mut parser = Parser::new(grammar, WhitespaceLexer);

    let result = parser.parse("x ", 2).unwrap();
    let offered = values(&result.next_matchings);
    assert_eq!(offered.iter().filter(|v| **v == ";").count(), 1);
}

#[test]
fn test_special_matchers_appear_by_display_name() {
    let grammar = Grammar::builder()
        .start("call")
        .rule(
            "call",
            [
                Elem::lit("print"),
                Elem::special("identifier", |token: &chancery::Token| {
                    token.text().chars().all(char::is_alphabetic)
                }),
            ],
        )
        .build()
        .unwrap();
    let mut parser = Parser::new(grammar, WhitespaceLexer);

    let result = parser.parse("print ", 6).unwrap();
    assert_eq!(values(&result.next_matchings), ["identifier"]);
    assert_eq!(result.next_matchings[0].kind, MatchKind::Special);
}

#[test]
fn test_failure_suggestions_from_best_progress() {
    let grammar = Grammar::builder()
        .start("stmt")
        .rule(
            "stmt",
            [Elem::lit("let"), Elem::lit("x"), Elem::lit("="), Elem::lit("1")],
        )
        .build()
        .unwrap();
    let mut parser = Parser::new(grammar, WhitespaceLexer);

    let result = parser.parse("let x 1", 7).unwrap();
    assert!(!result.success);

    let error = result.error.unwrap();
    // Furthest match is "x"; the token after it is the culprit.
    assert_eq!(error.token.unwrap().text(), "1");
    assert_eq!(values(&error.suggestions), ["="]);
}

#[test]
fn test_suggestions_follow_rule_boundaries() {
    // After a complete inner rule the probe must climb into the outer one.
    let grammar = Grammar::builder()
        .start("outer")
        .rule("outer", [Elem::rule("inner"), Elem::lit("end")])
        .rule("inner", [Elem::lit("begin"), Elem::lit("body")])
        .build()
        .unwrap();
    let mut parser = Parser::new(grammar, WhitespaceLexer);

    let result = parser.parse("begin body ", 11).unwrap();
    assert!(!result.success);
    assert_eq!(values(&result.next_matchings), ["end"]);
}
