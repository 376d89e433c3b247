//! # Chancery
//!
//! A backtracking top-down parse engine built for interactive editors. One
//! pass over a token stream decides whether the input is accepted by a
//! user-defined grammar, builds an AST through reducers attached at rule
//! boundaries, and reports — at any byte offset — the grammar terminals that
//! could legally appear there. On a mismatch the same machinery produces the
//! terminals that would have recovered the parse.
//!
//! ## How it works
//!
//! Grammars compile to a graph of terminal, sequence, choice, and
//! rule-reference nodes; references expand lazily on first visit. The engine
//! walks the graph depth-first with ordered choice: every untried
//! alternative is pushed onto a chance stack, and a dead end pops the most
//! recent one, rewinds the scanner, and stamps the retried spine with a
//! fresh epoch so off-spine node state resets lazily instead of eagerly.
//! Named-rule entries are pruned against cached FIRST sets when those
//! resolve. Suggestions reuse the same engine against an empty token stream,
//! treating every reachable terminal as a miss so exploration enumerates the
//! whole frontier.
//!
//! ## Quick start
//!
//! ```rust
//! use chancery::{Elem, Grammar, Parser, WhitespaceLexer};
//!
//! let grammar = Grammar::builder()
//!     .start("expr")
//!     .rule("expr", [
//!         Elem::rule("term"),
//!         Elem::any_of([Elem::lit("+"), Elem::lit("-")]),
//!         Elem::rule("term"),
//!     ])
//!     .rule("term", [Elem::any_of([Elem::lit("a"), Elem::lit("b")])])
//!     .build()
//!     .expect("grammar is well formed");
//!
//! let mut parser = Parser::new(grammar, WhitespaceLexer);
//!
//! let accepted = parser.parse("a + b", 0).expect("within budget");
//! assert!(accepted.success);
//!
//! // Cursor right after "a ": which tokens may follow?
//! let at_cursor = parser.parse("a ", 2).expect("within budget");
//! let offered: Vec<_> = at_cursor
//!     .next_matchings
//!     .iter()
//!     .map(|matching| matching.value.as_str())
//!     .collect();
//! assert_eq!(offered, ["+", "-"]);
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - rule bodies, terminal matchers, and the grammar builder
//! - [`parser`] - the parse entry point, results, and the parser registry
//! - [`scanner`] - token cursor with save/restore and offset queries
//! - [`lexer`] - the token type and lexer contract
//! - [`ast`] - reduced values and the reducer contract
//! - [`error`] - fatal error types (mismatches are result data instead)
//!
//! The engine is single-threaded and strictly synchronous: one parse at a
//! time per parser, no shared state between parsers. Callers wanting
//! parallelism build independent parsers.

pub mod ast;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod text;

// Re-export the everyday surface.
pub use ast::{Ast, Reducer};
pub use engine::{EngineConfig, DEFAULT_MAX_VISITS};
pub use error::{GrammarError, ParseError};
pub use grammar::{Elem, Grammar, GrammarBuilder, MatchKind, MatchOutcome, Matcher, Matching};
pub use lexer::{Lexer, Token, WhitespaceLexer};
pub use parser::{
    FailureReason, ParseFailure, ParseMetrics, ParseResult, Parser, ParserRegistry,
};
pub use scanner::Scanner;
pub use text::{TextRange, TextSize};
