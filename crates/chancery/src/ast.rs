//! Reduced values and the reducer contract.

use std::sync::Arc;

use crate::lexer::Token;

/// Value produced by rule reducers.
///
/// With no reducer attached a sequence reduces to the list of its children's
/// values, except that a single-element list collapses to its element, so
/// one-child wrapper rules stay transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Ast {
    Token(Token),
    List(Vec<Ast>),
    Empty,
}

impl Ast {
    /// Token text, if this value is a single token.
    #[must_use]
    pub fn token_text(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token.text()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Ast]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_empty_value(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Reducer applied at a sequence boundary: child values in, one value out.
pub type Reducer = Arc<dyn Fn(Vec<Ast>) -> Ast + Send + Sync>;

/// The default reduction: unwrap singletons, keep lists.
#[must_use]
pub fn reduce_default(mut results: Vec<Ast>) -> Ast {
    if results.len() == 1 {
        results.pop().expect("len checked")
    } else {
        Ast::List(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{TextRange, TextSize};

    fn token(text: &str) -> Token {
        Token::new(text, TextRange::new(TextSize::zero(), TextSize::of(text.len())))
    }

    #[test]
    fn test_default_reduction_unwraps_singleton() {
        let reduced = reduce_default(vec![Ast::Token(token("a"))]);
        assert_eq!(reduced.token_text(), Some("a"));
    }

    #[test]
    fn test_default_reduction_keeps_list() {
        let reduced = reduce_default(vec![Ast::Token(token("a")), Ast::Token(token("b"))]);
        assert_eq!(reduced.as_list().unwrap().len(), 2);
    }

    #[test]
    fn test_default_reduction_empty() {
        assert_eq!(reduce_default(Vec::new()), Ast::List(Vec::new()));
    }
}
