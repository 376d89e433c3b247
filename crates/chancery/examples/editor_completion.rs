//! Editor-style completion: ask the engine which terminals may appear at the
//! cursor, whatever state the buffer is in.
//!
//! Run with: `cargo run --example editor_completion`

use chancery::{Elem, Grammar, Parser, Token, WhitespaceLexer};

fn main() {
    // select <column> from <table> [where <column> = <column>]
    let grammar = Grammar::builder()
        .start("query")
        .rule(
            "query",
            [
                Elem::lit("select"),
                Elem::rule("name"),
                Elem::lit("from"),
                Elem::rule("name"),
                Elem::any_of([Elem::rule("filter"), Elem::loose(true)]),
            ],
        )
        .rule(
            "filter",
            [Elem::lit("where"), Elem::rule("name"), Elem::lit("="), Elem::rule("name")],
        )
        .rule(
            "name",
            [Elem::special("identifier", |token: &Token| {
                token
                    .text()
                    .chars()
                    .all(|ch| ch.is_alphanumeric() || ch == '_')
            })],
        )
        .build()
        .expect("grammar is well formed");

    let mut parser = Parser::new(grammar, WhitespaceLexer);

    let buffers = [
        ("", 0),
        ("select ", 7),
        ("select id ", 10),
        ("select id from users ", 21),
        ("select id from users where ", 27),
    ];

    for (buffer, cursor) in buffers {
        let result = parser.parse(buffer, cursor).expect("within budget");
        let completions: Vec<String> = result
            .next_matchings
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "{:<28} cursor {:>2} -> {}",
            format!("{buffer:?}"),
            cursor,
            completions.join(", ")
        );
    }
}
