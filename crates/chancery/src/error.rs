//! Error types.
//!
//! A parse *mismatch* is not an error: it is reported through
//! [`ParseFailure`](crate::parser::ParseFailure) inside a successful
//! [`ParseResult`](crate::parser::ParseResult). The types here cover the
//! fatal cases that abort a parse outright.

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Invalid grammar shapes, raised at build time or on the first parse that
/// expands an undefined rule reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("no start rule configured")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::missing_start)))]
    MissingStartRule,

    #[error("undefined rule: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::undefined_rule)))]
    UndefinedRule(String),

    #[error("duplicate rule: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::duplicate_rule)))]
    DuplicateRule(String),

    #[error("rule {0} has an empty body")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty_rule)))]
    EmptyRule(String),

    #[error("rule {0} contains a choice with no alternatives")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty_choice)))]
    EmptyChoice(String),
}

/// Fatal parse-time failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    /// The visit budget was exhausted. Left-recursive grammars end up here.
    #[error("parse aborted: visit budget of {limit} exceeded")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parser::budget_exceeded)))]
    BudgetExceeded { limit: usize },

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Grammar(#[from] GrammarError),
}
