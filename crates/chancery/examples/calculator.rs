//! A tiny calculator: reducers fold the parse into a number as it completes.
//!
//! Run with: `cargo run --example calculator`

use chancery::{Ast, Elem, Grammar, Parser, Token, TextRange, TextSize, WhitespaceLexer};

fn number(ast: &Ast) -> i64 {
    match ast {
        Ast::Token(token) => token.text().parse().unwrap_or(0),
        _ => 0,
    }
}

fn main() {
    let grammar = Grammar::builder()
        .start("expr")
        .rule_with(
            "expr",
            [
                Elem::special("number", |token: &Token| {
                    token.text().chars().all(|ch| ch.is_ascii_digit())
                }),
                Elem::any_of([Elem::lit("+"), Elem::lit("-")]),
                Elem::special("number", |token: &Token| {
                    token.text().chars().all(|ch| ch.is_ascii_digit())
                }),
            ],
            |children| {
                let left = number(&children[0]);
                let right = number(&children[2]);
                let value = match children[1].token_text() {
                    Some("+") => left + right,
                    _ => left - right,
                };
                // Reducers return an Ast; wrap the folded value back up as a
                // synthetic token.
                Ast::Token(Token::new(
                    value.to_string(),
                    TextRange::new(TextSize::zero(), TextSize::zero()),
                ))
            },
        )
        .build()
        .expect("grammar is well formed");

    let mut parser = Parser::new(grammar, WhitespaceLexer);

    for input in ["12 + 30", "7 - 9", "1 +"] {
        let result = parser.parse(input, input.len()).expect("within budget");
        if result.success {
            let value = result.ast.and_then(|ast| {
                ast.token_text().map(ToOwned::to_owned)
            });
            println!("{input:>8} = {}", value.unwrap_or_default());
        } else {
            let error = result.error.expect("failed parses carry a diagnostic");
            let expected: Vec<String> = error
                .suggestions
                .iter()
                .map(ToString::to_string)
                .collect();
            println!("{input:>8} ! expected one of {}", expected.join(", "));
        }
    }
}
