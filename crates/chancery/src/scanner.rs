//! Cursor over a finite token buffer.
//!
//! The scanner's index is the unit of backtracking: the engine saves it when
//! opening an alternative and restores it when a chance is retried. The
//! offset queries locate tokens around an editor cursor.

use crate::lexer::Token;
use crate::text::TextSize;

#[derive(Debug, Clone)]
pub struct Scanner {
    tokens: Vec<Token>,
    index: usize,
}

impl Scanner {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Token at the cursor, no advance.
    #[must_use]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    /// Consume and return the token at the cursor.
    pub fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned()?;
        self.index += 1;
        Some(token)
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    /// Tokens left to consume, cursor included.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.index)
    }

    /// The last token whose span ends at or before `offset`.
    #[must_use]
    pub fn token_before_offset(&self, offset: TextSize) -> Option<&Token> {
        self.tokens
            .iter()
            .rev()
            .find(|token| token.range.end() <= offset)
    }

    /// The first token whose span starts at or after `offset`.
    #[must_use]
    pub fn token_after_offset(&self, offset: TextSize) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|token| token.range.start() >= offset)
    }

    /// The token immediately following `token` in the buffer.
    #[must_use]
    pub fn token_following(&self, token: &Token) -> Option<&Token> {
        let at = self.tokens.iter().position(|t| t == token)?;
        self.tokens.get(at + 1)
    }
}
