//! The traversal engine: depth-first descent with ordered choice and
//! chronological backtracking.
//!
//! One run drives an explicit step loop instead of recursing: a step either
//! descends into a node, ascends after a child matched, or falls back to the
//! most recent untried alternative. Alternatives live on the chance stack;
//! retrying one restores the scanner to the recorded token index, bumps the
//! epoch, and stamps the retried node's spine so only state off that spine
//! is lazily reset on next entry.

use crate::ast::{reduce_default, Ast};
use crate::engine::first::FirstSets;
use crate::engine::graph::{Graph, NodeId, Tag};
use crate::engine::EngineConfig;
use crate::error::ParseError;
use crate::grammar::{Grammar, MatchOutcome};
use crate::lexer::Token;
use crate::scanner::Scanner;

/// A saved backtracking point: resume `node` at `head_index` after rewinding
/// the scanner to `token_index`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Chance {
    pub node: NodeId,
    pub head_index: usize,
    pub token_index: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RunOptions {
    /// Apply reducers and thread values upward.
    pub reduce: bool,
    /// Consult published FIRST sets at named-rule entry.
    pub prune: bool,
}

pub(crate) enum RunOutcome {
    Matched(Ast),
    Failed,
}

/// The non-loose terminal match that left the fewest tokens unconsumed;
/// anchors error reporting.
pub(crate) struct Progress {
    pub token: Token,
    pub node: NodeId,
    pub remaining: usize,
}

/// Per-parse observations the suggestion machinery needs afterwards.
pub(crate) struct ParseTrack {
    pub cursor_prev_token: Option<Token>,
    pub cursor_prev_nodes: Vec<NodeId>,
    pub best: Option<Progress>,
}

impl ParseTrack {
    pub fn new(cursor_prev_token: Option<Token>) -> Self {
        Self {
            cursor_prev_token,
            cursor_prev_nodes: Vec::new(),
            best: None,
        }
    }
}

/// Enumeration mode: every non-loose terminal the grammar offers is recorded
/// and then treated as a miss, so exploration continues until the chance
/// stack drains.
pub(crate) struct Probe {
    pub start: NodeId,
    pub passed_start: bool,
    pub collected: Vec<NodeId>,
}

impl Probe {
    pub fn new(start: NodeId) -> Self {
        Self {
            start,
            passed_start: false,
            collected: Vec::new(),
        }
    }
}

enum Step {
    Visit(NodeId),
    Ascend(NodeId, Ast),
    Retry,
    Done(Ast),
    Halt,
}

pub(crate) struct Run<'a> {
    graph: &'a mut Graph,
    grammar: &'a Grammar,
    firsts: &'a FirstSets,
    config: &'a EngineConfig,
    visits: &'a mut usize,
    scanner: Scanner,
    chances: Vec<Chance>,
    epoch: u64,
    opts: RunOptions,
    track: Option<&'a mut ParseTrack>,
    probe: Option<&'a mut Probe>,
}

impl<'a> Run<'a> {
    pub fn parse(
        graph: &'a mut Graph,
        grammar: &'a Grammar,
        firsts: &'a FirstSets,
        config: &'a EngineConfig,
        visits: &'a mut usize,
        scanner: Scanner,
        track: &'a mut ParseTrack,
    ) -> Self {
        let epoch = graph.next_epoch();
        Self {
            graph,
            grammar,
            firsts,
            config,
            visits,
            scanner,
            chances: Vec::new(),
            epoch,
            opts: RunOptions {
                reduce: true,
                prune: config.first_pruning,
            },
            track: Some(track),
            probe: None,
        }
    }

    /// Probe run: empty scanner, no reductions, no pruning.
    pub fn probe(
        graph: &'a mut Graph,
        grammar: &'a Grammar,
        firsts: &'a FirstSets,
        config: &'a EngineConfig,
        visits: &'a mut usize,
        probe: &'a mut Probe,
    ) -> Self {
        let epoch = graph.next_epoch();
        Self {
            graph,
            grammar,
            firsts,
            config,
            visits,
            scanner: Scanner::empty(),
            chances: Vec::new(),
            epoch,
            opts: RunOptions {
                reduce: false,
                prune: false,
            },
            track: None,
            probe: Some(probe),
        }
    }

    pub fn drive(&mut self, start: NodeId) -> Result<RunOutcome, ParseError> {
        let mut step = Step::Visit(start);
        loop {
            match step {
                Step::Visit(id) => {
                    self.charge()?;
                    step = self.visit(id)?;
                }
                Step::Ascend(id, ast) => {
                    self.charge()?;
                    step = self.ascend(id, ast);
                }
                Step::Retry => step = self.retry(),
                Step::Done(ast) => return Ok(RunOutcome::Matched(ast)),
                Step::Halt => return Ok(RunOutcome::Failed),
            }
        }
    }

    fn charge(&mut self) -> Result<(), ParseError> {
        *self.visits += 1;
        if *self.visits > self.config.max_visits {
            return Err(ParseError::BudgetExceeded {
                limit: self.config.max_visits,
            });
        }
        Ok(())
    }

    fn visit(&mut self, id: NodeId) -> Result<Step, ParseError> {
        match self.graph.tag(id) {
            Tag::RuleRef => {
                let expanded = self.graph.expand_ref(self.grammar, id)?;
                Ok(Step::Visit(expanded))
            }
            Tag::Terminal => Ok(self.visit_terminal(id)),
            Tag::Sequence => Ok(self.visit_sequence(id)),
            Tag::Choice => Ok(self.visit_choice(id)),
        }
    }

    fn visit_sequence(&mut self, id: NodeId) -> Step {
        let epoch = self.epoch;
        let (head, len, rule_name) = {
            let sequence = self.graph.sequence_mut(id);
            if sequence.version != epoch {
                sequence.version = epoch;
                sequence.head_index = 0;
                sequence.plus_head_index = 0;
                sequence.ast_results.clear();
            }
            (
                sequence.head_index,
                sequence.children.len(),
                sequence.rule_name,
            )
        };

        // Entry of a named rule: a resolved FIRST set that rejects the next
        // token proves no derivation can start here.
        if head == 0 && self.opts.prune {
            if let Some(rule) = rule_name {
                if let Some(terminals) = self.firsts.resolved(rule) {
                    let viable = terminals
                        .iter()
                        .any(|terminal| (terminal.matcher)(&mut self.scanner, false).is_hit());
                    if !viable {
                        self.graph.sequence_mut(id).head_index = len;
                        return Step::Retry;
                    }
                }
            }
        }

        if head < len {
            let sequence = self.graph.sequence_mut(id);
            let child = sequence.children[head];
            sequence.head_index = head + 1;
            Step::Visit(child)
        } else {
            let ast = if self.opts.reduce {
                self.reduce_sequence(id)
            } else {
                Ast::Empty
            };
            Step::Ascend(id, ast)
        }
    }

    fn visit_choice(&mut self, id: NodeId) -> Step {
        let epoch = self.epoch;
        let token_index = self.scanner.index();

        let choice = self.graph.choice_mut(id);
        if choice.version != epoch {
            choice.version = epoch;
            choice.head_index = 0;
        }
        let head = choice.head_index;
        let len = choice.children.len();
        if head >= len {
            return Step::Retry;
        }
        let child = choice.children[head];
        choice.head_index = head + 1;

        if head + 1 < len {
            self.chances.push(Chance {
                node: id,
                head_index: head + 1,
                token_index,
            });
        }
        Step::Visit(child)
    }

    fn visit_terminal(&mut self, id: NodeId) -> Step {
        let (matcher, loose) = {
            let terminal = self.graph.terminal(id);
            (terminal.matcher.clone(), terminal.matching.is_loose())
        };

        if let Some(probe) = self.probe.as_deref_mut() {
            if !probe.passed_start && probe.start == id {
                probe.passed_start = true;
                return Step::Ascend(id, Ast::Empty);
            }
            if loose {
                // loose(true) is transparent; loose(false) is a dead end.
                return if matcher(&mut self.scanner, false).is_hit() {
                    Step::Ascend(id, Ast::Empty)
                } else {
                    Step::Retry
                };
            }
            if !probe.collected.contains(&id) {
                probe.collected.push(id);
            }
            return Step::Retry;
        }

        match matcher(&mut self.scanner, true) {
            MatchOutcome::Miss => Step::Retry,
            MatchOutcome::Hit(token) => {
                if !loose {
                    if let Some(matched) = &token {
                        self.note_progress(id, matched);
                    }
                }
                let ast = match token {
                    Some(matched) => Ast::Token(matched),
                    None => Ast::Empty,
                };
                Step::Ascend(id, ast)
            }
        }
    }

    fn note_progress(&mut self, id: NodeId, token: &Token) {
        let remaining = self.scanner.remaining();
        let Some(track) = self.track.as_deref_mut() else { return };

        let improved = track
            .best
            .as_ref()
            .map_or(true, |best| remaining < best.remaining);
        if improved {
            track.best = Some(Progress {
                token: token.clone(),
                node: id,
                remaining,
            });
        }

        if track.cursor_prev_token.as_ref() == Some(token)
            && !track.cursor_prev_nodes.contains(&id)
        {
            track.cursor_prev_nodes.push(id);
        }
    }

    fn ascend(&mut self, id: NodeId, ast: Ast) -> Step {
        let Some((parent, parent_index)) = self.graph.parent_of(id) else {
            // Root matched; a prefix match is not an accept.
            return if self.scanner.is_at_end() {
                Step::Done(ast)
            } else {
                Step::Retry
            };
        };

        match self.graph.tag(parent) {
            Tag::Sequence => {
                let epoch = self.epoch;
                let token_index = self.scanner.index();
                let reduce = self.opts.reduce;

                let sequence = self.graph.sequence_mut(parent);
                // The child just matched on the current spine; pin the
                // parent's state so its entry below does not lazily reset.
                sequence.version = epoch;
                sequence.head_index = parent_index + 1;

                if reduce {
                    let slot = if sequence.plus_mode {
                        sequence.plus_head_index * sequence.children.len() + parent_index
                    } else {
                        parent_index
                    };
                    if sequence.ast_results.len() <= slot {
                        sequence.ast_results.resize(slot + 1, Ast::Empty);
                    }
                    sequence.ast_results[slot] = ast;
                }

                let repeat = sequence.plus_mode
                    && sequence.head_index == sequence.children.len();
                if repeat {
                    sequence.plus_head_index += 1;
                    self.chances.push(Chance {
                        node: parent,
                        head_index: 0,
                        token_index,
                    });
                }
                Step::Visit(parent)
            }
            // A matched alternative completes the whole choice.
            Tag::Choice => Step::Ascend(parent, ast),
            Tag::Terminal | Tag::RuleRef => {
                unreachable!("terminals and rule references have no children")
            }
        }
    }

    fn reduce_sequence(&self, id: NodeId) -> Ast {
        let sequence = self.graph.sequence(id);
        let results: Vec<Ast> = if sequence.plus_mode {
            // One row per iteration, each indexed by child position.
            sequence
                .ast_results
                .chunks(sequence.children.len().max(1))
                .map(|row| reduce_default(row.to_vec()))
                .collect()
        } else {
            sequence.ast_results.clone()
        };
        match &sequence.reduce {
            Some(reduce) => reduce(results),
            None => reduce_default(results),
        }
    }

    /// Chronological backtracking: bump the epoch, pop the most recent
    /// chance, rewind the scanner, and resume on a freshly stamped spine.
    fn retry(&mut self) -> Step {
        self.epoch = self.graph.next_epoch();
        match self.chances.pop() {
            None => Step::Halt,
            Some(chance) => {
                self.scanner.set_index(chance.token_index);
                self.graph.set_head(chance.node, chance.head_index);
                self.graph.stamp_spine(chance.node, self.epoch);
                Step::Visit(chance.node)
            }
        }
    }
}
