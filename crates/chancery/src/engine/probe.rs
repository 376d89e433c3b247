//! Next-match enumeration: which terminals could the grammar legally offer
//! at a node's position?
//!
//! The probe re-runs the traversal engine from the given node against an
//! empty scanner with reductions and pruning disabled. The starting node
//! itself is passed over as if it had just matched; every other non-loose
//! terminal the exploration reaches is recorded and then treated as a miss,
//! which forces the engine through every untried alternative until the
//! chance stack drains. The result is input-independent: it describes the
//! grammar, not the parsed text.

use crate::engine::visit::{Probe, Run};
use crate::engine::{Engine, EngineConfig, NodeId};
use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::lexer::Token;
use crate::scanner::Scanner;

impl Engine {
    /// Terminals that could appear next after `start` (or, for the root,
    /// the terminals a derivation may begin with).
    pub fn probe_from(
        &mut self,
        grammar: &Grammar,
        config: &EngineConfig,
        visits: &mut usize,
        start: NodeId,
    ) -> Result<Vec<NodeId>, ParseError> {
        let mut probe = Probe::new(start);
        let mut run = Run::probe(
            &mut self.graph,
            grammar,
            &self.firsts,
            config,
            visits,
            &mut probe,
        );
        // Both outcomes are fine: exploration usually ends with the chance
        // stack drained, not with a match.
        run.drive(start)?;
        Ok(probe.collected)
    }

    /// Would this terminal accept `token` as its next input?
    pub fn terminal_accepts(&self, id: NodeId, token: &Token) -> bool {
        let matcher = self.graph.terminal(id).matcher.clone();
        let mut scanner = Scanner::new(vec![token.clone()]);
        matcher(&mut scanner, false).is_hit()
    }
}
