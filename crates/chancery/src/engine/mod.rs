//! The parse engine: compiled node graph, FIRST-set cache, traversal, and
//! the next-match probe.

mod first;
mod graph;
mod probe;
mod visit;

pub(crate) use graph::NodeId;
pub(crate) use visit::{ParseTrack, RunOutcome};

use lasso::Spur;

use crate::error::{GrammarError, ParseError};
use crate::grammar::{Grammar, Matching};
use crate::scanner::Scanner;

/// Default traversal budget; generous enough for real grammars, small enough
/// to abort runaway ones (left recursion included) promptly.
pub const DEFAULT_MAX_VISITS: usize = 10_000_000;

/// Knobs for one engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on traversal steps per parse, probes included.
    pub max_visits: usize,
    /// Prune named-rule entries against published FIRST sets.
    pub first_pruning: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_visits: DEFAULT_MAX_VISITS,
            first_pruning: true,
        }
    }
}

/// One compiled root: the expanded-on-demand node graph plus the FIRST-set
/// cache. Persists across parses; scanner, chances, and tracking are per
/// parse.
pub(crate) struct Engine {
    graph: graph::Graph,
    firsts: first::FirstSets,
}

impl Engine {
    pub fn compile(grammar: &Grammar, root: Spur) -> Result<Self, GrammarError> {
        Ok(Self {
            graph: graph::Graph::compile(grammar, root)?,
            firsts: first::FirstSets::compute(grammar),
        })
    }

    pub fn root(&self) -> NodeId {
        self.graph.root()
    }

    pub fn parse_run(
        &mut self,
        grammar: &Grammar,
        config: &EngineConfig,
        scanner: Scanner,
        track: &mut ParseTrack,
        visits: &mut usize,
    ) -> Result<RunOutcome, ParseError> {
        let root = self.graph.root();
        let mut run = visit::Run::parse(
            &mut self.graph,
            grammar,
            &self.firsts,
            config,
            visits,
            scanner,
            track,
        );
        run.drive(root)
    }

    pub fn matching_of(&self, id: NodeId) -> &Matching {
        &self.graph.terminal(id).matching
    }
}
