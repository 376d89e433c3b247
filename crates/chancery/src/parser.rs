//! Public parse entry: lex, visit, and assemble results and suggestions.

use std::time::{Duration, Instant};

use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};
use lasso::Spur;

use crate::ast::Ast;
use crate::engine::{Engine, EngineConfig, NodeId, ParseTrack, RunOutcome};
use crate::error::{GrammarError, ParseError};
use crate::grammar::{Grammar, Matching};
use crate::lexer::{Lexer, Token};
use crate::scanner::Scanner;
use crate::text::TextSize;

/// Why a mismatch was diagnosed where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureReason {
    /// A token follows the furthest successful match: that token is wrong.
    Wrong,
    /// The input stopped while the grammar still expected more.
    Incomplete,
}

/// Mismatch diagnostic: not an error, part of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseFailure {
    pub token: Option<Token>,
    pub reason: FailureReason,
    /// Terminals that would have continued the parse past the failure point.
    pub suggestions: Vec<Matching>,
}

#[derive(Debug, Clone, Default)]
pub struct ParseMetrics {
    /// Traversal steps spent, probes included.
    pub visits: usize,
    pub lex_time: Duration,
    pub parse_time: Duration,
}

/// Outcome of one parse call.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub success: bool,
    pub ast: Option<Ast>,
    /// Terminals the grammar admits at the cursor, independent of whether
    /// the input parsed.
    pub next_matchings: Vec<Matching>,
    pub error: Option<ParseFailure>,
    pub tokens: Vec<Token>,
    pub metrics: ParseMetrics,
}

/// A grammar bound to a lexer, with one compiled engine per root rule.
///
/// The engine for a root is built on the first parse that uses it and reused
/// afterwards; rule expansions and FIRST sets accumulate there. Everything
/// else (scanner, chance stack, tracking) lives and dies with one `parse`
/// call, so re-parsing is deterministic.
pub struct Parser<L> {
    grammar: Grammar,
    lexer: L,
    config: EngineConfig,
    engines: HashMap<Spur, Engine, ahash::RandomState>,
}

impl<L: Lexer> Parser<L> {
    #[must_use]
    pub fn new(grammar: Grammar, lexer: L) -> Self {
        Self::with_config(grammar, lexer, EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(grammar: Grammar, lexer: L, config: EngineConfig) -> Self {
        Self {
            grammar,
            lexer,
            config,
            engines: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    #[must_use]
    pub const fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Parse `text` from the grammar's start rule. `cursor` is a byte offset
    /// into `text`; suggestions in `next_matchings` describe that position.
    ///
    /// # Errors
    ///
    /// Fails on invalid grammar shapes discovered during expansion and on an
    /// exhausted visit budget. A plain mismatch is a success value with
    /// `success == false`.
    pub fn parse(&mut self, text: &str, cursor: usize) -> Result<ParseResult, ParseError> {
        let start = self.grammar.start_rule().to_owned();
        self.parse_from(&start, text, cursor)
    }

    /// Parse from an arbitrary root rule; the compiled engine is memoized
    /// per root.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse); additionally fails if `root` is not a
    /// rule of this grammar.
    pub fn parse_from(
        &mut self,
        root: &str,
        text: &str,
        cursor: usize,
    ) -> Result<ParseResult, ParseError> {
        let lex_started = Instant::now();
        let tokens = self.lexer.tokenize(text);
        let lex_time = lex_started.elapsed();

        let parse_started = Instant::now();
        let root_key = self
            .grammar
            .lookup(root)
            .filter(|key| self.grammar.rule(*key).is_some())
            .ok_or_else(|| GrammarError::UndefinedRule(root.to_owned()))?;

        let engine = match self.engines.entry(root_key) {
            hashbrown::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            hashbrown::hash_map::Entry::Vacant(entry) => {
                entry.insert(Engine::compile(&self.grammar, root_key)?)
            }
        };

        let cursor_offset = TextSize::of(cursor);
        let lookup = Scanner::new(tokens.clone());
        let cursor_prev_token = lookup.token_before_offset(cursor_offset).cloned();
        let cursor_next_token = lookup.token_after_offset(cursor_offset).cloned();

        let mut track = ParseTrack::new(cursor_prev_token.clone());
        let mut visits = 0usize;
        let outcome = engine.parse_run(
            &self.grammar,
            &self.config,
            Scanner::new(tokens.clone()),
            &mut track,
            &mut visits,
        )?;

        // Cursor suggestions: probe every terminal that consumed the token
        // before the cursor (the root when the cursor precedes all tokens).
        let prev_nodes: Vec<NodeId> = if cursor_prev_token.is_none() {
            vec![engine.root()]
        } else {
            track.cursor_prev_nodes.clone()
        };
        let mut candidates: Vec<NodeId> = Vec::new();
        for node in prev_nodes {
            for offered in engine.probe_from(&self.grammar, &self.config, &mut visits, node)? {
                if !candidates.contains(&offered) {
                    candidates.push(offered);
                }
            }
        }
        if let Some(next) = &cursor_next_token {
            candidates.retain(|id| engine.terminal_accepts(*id, next));
        }
        let next_matchings = dedup_matchings(
            candidates.iter().map(|id| engine.matching_of(*id).clone()),
        );

        let (success, ast, error) = match outcome {
            RunOutcome::Matched(ast) => (true, Some(ast), None),
            RunOutcome::Failed => {
                let (anchor_token, anchor_node) = match &track.best {
                    Some(progress) => (Some(progress.token.clone()), progress.node),
                    None => (None, engine.root()),
                };
                let offered =
                    engine.probe_from(&self.grammar, &self.config, &mut visits, anchor_node)?;
                let suggestions = dedup_matchings(
                    offered.iter().map(|id| engine.matching_of(*id).clone()),
                );

                let (token, reason) = match anchor_token {
                    Some(best) => match lookup.token_following(&best) {
                        Some(next) => (Some(next.clone()), FailureReason::Wrong),
                        None => (Some(best), FailureReason::Incomplete),
                    },
                    None => (None, FailureReason::Incomplete),
                };
                (
                    false,
                    None,
                    Some(ParseFailure {
                        token,
                        reason,
                        suggestions,
                    }),
                )
            }
        };

        Ok(ParseResult {
            success,
            ast,
            next_matchings,
            error,
            tokens,
            metrics: ParseMetrics {
                visits,
                lex_time,
                parse_time: parse_started.elapsed(),
            },
        })
    }
}

fn dedup_matchings(matchings: impl Iterator<Item = Matching>) -> Vec<Matching> {
    let mut seen: HashSet<Matching, ahash::RandomState> =
        HashSet::with_hasher(ahash::RandomState::new());
    let mut out = Vec::new();
    for matching in matchings {
        if matching.is_loose() {
            continue;
        }
        if seen.insert(matching.clone()) {
            out.push(matching);
        }
    }
    out
}

/// Caller-owned collection of named parsers. Nothing in this crate is
/// process-global: whoever wants to share compiled parsers holds one of
/// these.
pub struct ParserRegistry<L> {
    parsers: HashMap<CompactString, Parser<L>, ahash::RandomState>,
}

impl<L: Lexer> Default for ParserRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lexer> ParserRegistry<L> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    pub fn insert(&mut self, name: impl Into<CompactString>, parser: Parser<L>) {
        self.parsers.insert(name.into(), parser);
    }

    #[must_use]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parser<L>> {
        self.parsers.get_mut(name)
    }

    pub fn get_or_insert_with(
        &mut self,
        name: impl Into<CompactString>,
        build: impl FnOnce() -> Parser<L>,
    ) -> &mut Parser<L> {
        self.parsers.entry(name.into()).or_insert_with(build)
    }

    pub fn remove(&mut self, name: &str) -> Option<Parser<L>> {
        self.parsers.remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
