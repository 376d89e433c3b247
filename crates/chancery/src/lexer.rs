//! Token type and the lexer contract.
//!
//! The engine never inspects token text itself; it hands tokens to terminal
//! matchers and asks the [`Scanner`](crate::scanner::Scanner) for positional
//! queries. Any function from source text to a token list can act as a lexer,
//! and [`WhitespaceLexer`] covers the common whitespace-separated case used
//! throughout the tests and examples.

use compact_str::CompactString;

use crate::text::{TextRange, TextSize};

/// A lexed token: its text and the byte span it covers in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub text: CompactString,
    pub range: TextRange,
}

impl Token {
    #[must_use]
    pub fn new(text: impl Into<CompactString>, range: TextRange) -> Self {
        Self {
            text: text.into(),
            range,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn range(&self) -> TextRange {
        self.range
    }
}

/// Turns source text into a token sequence.
///
/// Implementations must be pure: the engine calls `tokenize` exactly once per
/// parse and assumes equal inputs produce equal token lists.
pub trait Lexer {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Any `Fn(&str) -> Vec<Token>` is a lexer.
impl<F> Lexer for F
where
    F: Fn(&str) -> Vec<Token>,
{
    fn tokenize(&self, text: &str) -> Vec<Token> {
        self(text)
    }
}

/// Splits the input on whitespace runs, keeping byte-accurate spans.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceLexer;

impl Lexer for WhitespaceLexer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut start: Option<usize> = None;

        for (i, ch) in text.char_indices() {
            if ch.is_whitespace() {
                if let Some(s) = start.take() {
                    tokens.push(Token::new(
                        &text[s..i],
                        TextRange::new(TextSize::of(s), TextSize::of(i)),
                    ));
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            tokens.push(Token::new(
                &text[s..],
                TextRange::new(TextSize::of(s), TextSize::of(text.len())),
            ));
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_lexer_spans() {
        let tokens = WhitespaceLexer.tokenize("a + b");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text(), "a");
        assert_eq!(tokens[0].range, TextRange::new(TextSize::from(0), TextSize::from(1)));
        assert_eq!(tokens[1].text(), "+");
        assert_eq!(tokens[1].range, TextRange::new(TextSize::from(2), TextSize::from(3)));
        assert_eq!(tokens[2].text(), "b");
        assert_eq!(tokens[2].range, TextRange::new(TextSize::from(4), TextSize::from(5)));
    }

    #[test]
    fn test_whitespace_lexer_empty() {
        assert!(WhitespaceLexer.tokenize("").is_empty());
        assert!(WhitespaceLexer.tokenize("   \t\n").is_empty());
    }

    #[test]
    fn test_whitespace_lexer_trailing_space() {
        let tokens = WhitespaceLexer.tokenize("a ");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].range.end(), TextSize::from(1));
    }

    #[test]
    fn test_closure_lexer() {
        let lexer = |text: &str| {
            text.split(',')
                .map(|part| Token::new(part, TextRange::new(TextSize::zero(), TextSize::zero())))
                .collect::<Vec<_>>()
        };
        assert_eq!(lexer.tokenize("x,y").len(), 2);
    }
}
