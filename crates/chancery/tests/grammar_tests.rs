//! Grammar-level behavior: builder validation, repetition shapes, per-root
//! memoization, and the caller-owned registry.

use chancery::{
    Ast, Elem, Grammar, GrammarError, Parser, ParserRegistry, WhitespaceLexer,
};

fn shape(ast: &Ast) -> String {
    match ast {
        Ast::Token(token) => token.text().to_owned(),
        Ast::List(items) => {
            let inner: Vec<String> = items.iter().map(shape).collect();
            format!("[{}]", inner.join(" "))
        }
        Ast::Empty => "_".to_owned(),
    }
}

fn parse_shape(parser: &mut Parser<WhitespaceLexer>, text: &str) -> String {
    let result = parser.parse(text, text.len()).unwrap();
    assert!(result.success, "expected {text:?} to parse");
    shape(&result.ast.unwrap())
}

#[test]
fn test_builder_rejects_bad_shapes() {
    assert!(matches!(
        Grammar::builder().rule("a", [Elem::lit("x")]).build(),
        Err(GrammarError::MissingStartRule)
    ));
    assert!(matches!(
        Grammar::builder().start("a").rule("a", []).build(),
        Err(GrammarError::EmptyRule(_))
    ));
    assert!(matches!(
        Grammar::builder()
            .start("a")
            .rule("a", [Elem::any_of([])])
            .build(),
        Err(GrammarError::EmptyChoice(_))
    ));
    assert!(matches!(
        Grammar::builder()
            .start("a")
            .rule("a", [Elem::lit("x")])
            .rule("a", [Elem::lit("y")])
            .build(),
        Err(GrammarError::DuplicateRule(_))
    ));
}

#[test]
fn test_plus_repeats_one_or_more() {
    let grammar = Grammar::builder()
        .start("words")
        .rule("words", [Elem::plus("word")])
        .rule("word", [Elem::lit("w")])
        .build()
        .unwrap();
    let mut parser = Parser::new(grammar, WhitespaceLexer);

    assert_eq!(parse_shape(&mut parser, "w"), "w");
    assert_eq!(parse_shape(&mut parser, "w w"), "[w w]");
    assert_eq!(parse_shape(&mut parser, "w w w"), "[w w w]");
    assert!(!parser.parse("", 0).unwrap().success);
}

#[test]
fn test_plus_rows_index_by_child_position() {
    let grammar = Grammar::builder()
        .start("list")
        .rule("list", [Elem::plus("pair")])
        .rule("pair", [Elem::lit("a"), Elem::lit("b")])
        .build()
        .unwrap();
    let mut parser = Parser::new(grammar, WhitespaceLexer);

    assert_eq!(parse_shape(&mut parser, "a b"), "[a b]");
    assert_eq!(parse_shape(&mut parser, "a b a b"), "[[a b] [a b]]");
    // A half pair cannot complete another iteration.
    assert!(!parser.parse("a b a", 5).unwrap().success);
}

#[test]
fn test_nested_repetition_shapes() {
    let grammar = Grammar::builder()
        .start("doc")
        .rule("doc", [Elem::plus("line")])
        .rule("line", [Elem::plus("word"), Elem::lit(";")])
        .rule("word", [Elem::lit("w")])
        .build()
        .unwrap();
    let mut parser = Parser::new(grammar, WhitespaceLexer);

    assert_eq!(parse_shape(&mut parser, "w ;"), "[w ;]");
    assert_eq!(parse_shape(&mut parser, "w w ; w ;"), "[[[w w] ;] [w ;]]");
    assert_eq!(
        parse_shape(&mut parser, "w ; w w w ;"),
        "[[w ;] [[w w w] ;]]"
    );
}

#[test]
fn test_plus_grows_through_backtracking() {
    // One iteration is tried first; further iterations are chances the
    // engine falls back to when the tail cannot match yet.
    let grammar = Grammar::builder()
        .start("stmt")
        .rule("stmt", [Elem::plus("item"), Elem::lit("end")])
        .rule("item", [Elem::lit("x")])
        .build()
        .unwrap();
    let mut parser = Parser::new(grammar, WhitespaceLexer);

    assert_eq!(parse_shape(&mut parser, "x end"), "[x end]");
    assert_eq!(parse_shape(&mut parser, "x x end"), "[[x x] end]");
    assert_eq!(parse_shape(&mut parser, "x x x end"), "[[x x x] end]");
    assert!(!parser.parse("end", 3).unwrap().success);
}

#[test]
fn test_parse_from_memoizes_per_root() {
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
    let mut parser = Parser::new(grammar, WhitespaceLexer);

    assert!(parser.parse_from("term", "a", 1).unwrap().success);
    assert!(!parser.parse_from("term", "a + b", 5).unwrap().success);
    assert!(parser.parse_from("expr", "a + b", 5).unwrap().success);
    // Re-using a memoized root behaves like the first time.
    assert!(parser.parse_from("term", "b", 1).unwrap().success);

    assert!(matches!(
        parser.parse_from("factor", "a", 1),
        Err(chancery::ParseError::Grammar(GrammarError::UndefinedRule(_)))
    ));
}

#[test]
fn test_registry_owns_named_parsers() {
    let term_only = Grammar::builder()
        .start("term")
        .rule("term", [Elem::any_of([Elem::lit("a"), Elem::lit("b")])])
        .build()
        .unwrap();

    let mut registry: ParserRegistry<WhitespaceLexer> = ParserRegistry::new();
    assert!(registry.is_empty());

    registry.insert("terms", Parser::new(term_only.clone(), WhitespaceLexer));
    assert!(registry.contains("terms"));
    assert_eq!(registry.len(), 1);

    let parser = registry.get_mut("terms").unwrap();
    assert!(parser.parse("a", 1).unwrap().success);

    let fallback = registry.get_or_insert_with("terms_again", || {
        Parser::new(term_only.clone(), WhitespaceLexer)
    });
    assert!(fallback.parse("b", 1).unwrap().success);
    assert_eq!(registry.len(), 2);

    assert!(registry.remove("terms").is_some());
    assert!(!registry.contains("terms"));
}
