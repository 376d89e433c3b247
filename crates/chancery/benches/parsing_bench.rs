use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use chancery::{Elem, Grammar, Parser, WhitespaceLexer};

fn statement_grammar() -> Grammar {
    Grammar::builder()
        .start("program")
        .rule("program", [Elem::plus("stmt")])
        .rule(
            "stmt",
            [
                Elem::special("identifier", |token: &chancery::Token| {
                    token.text().chars().all(char::is_alphabetic)
                }),
                Elem::lit("="),
                Elem::rule("expr"),
                Elem::lit(";"),
            ],
        )
        .rule(
            "expr",
            [
                Elem::rule("term"),
                Elem::any_of([
                    Elem::loose(true),
                    Elem::lit("+"),
                    Elem::lit("-"),
                    Elem::lit("*"),
                ]),
            ],
        )
        .rule(
            "term",
            [Elem::special("number", |token: &chancery::Token| {
                token.text().chars().all(|ch| ch.is_ascii_digit())
            })],
        )
        .build()
        .expect("bench grammar is well formed")
}

fn bench_accepting_parse(c: &mut Criterion) {
    let mut parser = Parser::new(statement_grammar(), WhitespaceLexer);
    let input = "x = 1 + ; y = 2 ; z = 3 * ; w = 4 ;";

    c.bench_function("parse_statements", |b| {
        b.iter(|| {
            let result = parser.parse(black_box(input), 0).expect("within budget");
            black_box(result.success)
        });
    });
}

fn bench_failing_parse_with_suggestions(c: &mut Criterion) {
    let mut parser = Parser::new(statement_grammar(), WhitespaceLexer);
    let input = "x = 1 + ; y = oops";

    c.bench_function("parse_mismatch_suggestions", |b| {
        b.iter(|| {
            let result = parser.parse(black_box(input), input.len()).expect("within budget");
            black_box(result.error.is_some())
        });
    });
}

fn bench_cursor_probe(c: &mut Criterion) {
    let mut parser = Parser::new(statement_grammar(), WhitespaceLexer);
    let input = "x = 1 ";

    c.bench_function("cursor_completions", |b| {
        b.iter(|| {
            let result = parser.parse(black_box(input), input.len()).expect("within budget");
            black_box(result.next_matchings.len())
        });
    });
}

criterion_group!(
    benches,
    bench_accepting_parse,
    bench_failing_parse_with_suggestions,
    bench_cursor_probe
);
criterion_main!(benches);
