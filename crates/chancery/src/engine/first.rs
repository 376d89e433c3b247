//! FIRST-set cache: for each rule, the terminals that can begin one of its
//! derivations.
//!
//! Candidates are collected from rule bodies before any expansion: walking a
//! body recurses into the first element of the sequence, unions choice
//! alternatives, and records referenced rules as name placeholders together
//! with the inverse dependency edge. Resolution substitutes placeholders with
//! already-published sets and, when a set publishes, re-resolves its recorded
//! dependents recursively. Published sets are never recomputed.
//!
//! A rule whose first position can be loose, or whose placeholders never
//! resolve (mutual recursion), stays unpublished: the engine then simply
//! skips pruning for it, trading speed for unchanged correctness.

use hashbrown::{HashMap, HashSet};
use lasso::Spur;
use smallvec::SmallVec;

use crate::grammar::{Elem, Grammar, Matcher, Matching};

pub(crate) struct FirstTerminal {
    pub matching: Matching,
    pub matcher: Matcher,
}

enum Candidate {
    Terminal(FirstTerminal),
    Rule(Spur),
}

pub(crate) struct FirstSets {
    resolved: HashMap<Spur, Vec<FirstTerminal>, ahash::RandomState>,
    pending: HashMap<Spur, Vec<Candidate>, ahash::RandomState>,
    dependents: HashMap<Spur, SmallVec<[Spur; 4]>, ahash::RandomState>,
    unprunable: HashSet<Spur, ahash::RandomState>,
}

impl FirstSets {
    pub fn compute(grammar: &Grammar) -> Self {
        let mut sets = Self {
            resolved: HashMap::with_hasher(ahash::RandomState::new()),
            pending: HashMap::with_hasher(ahash::RandomState::new()),
            dependents: HashMap::with_hasher(ahash::RandomState::new()),
            unprunable: HashSet::with_hasher(ahash::RandomState::new()),
        };

        let keys: Vec<Spur> = grammar.rule_keys().collect();
        for key in &keys {
            sets.collect_rule(grammar, *key);
        }
        for key in keys {
            sets.try_resolve(key);
        }
        sets
    }

    /// The published set for `rule`, or `None` when pruning must be skipped.
    pub fn resolved(&self, rule: Spur) -> Option<&[FirstTerminal]> {
        self.resolved.get(&rule).map(Vec::as_slice)
    }

    fn collect_rule(&mut self, grammar: &Grammar, key: Spur) {
        let Some(def) = grammar.rule(key) else { return };

        let mut candidates = Vec::new();
        let mut blocked = false;
        Self::collect_first(grammar, &def.body, &mut candidates, &mut blocked);

        if blocked {
            self.unprunable.insert(key);
            return;
        }
        for candidate in &candidates {
            if let Candidate::Rule(dependency) = candidate {
                let dependents = self.dependents.entry(*dependency).or_default();
                if !dependents.contains(&key) {
                    dependents.push(key);
                }
            }
        }
        self.pending.insert(key, candidates);
    }

    /// First-position walk: only the element a derivation must begin with
    /// contributes.
    fn collect_first(
        grammar: &Grammar,
        body: &[Elem],
        out: &mut Vec<Candidate>,
        blocked: &mut bool,
    ) {
        let Some(first) = body.first() else { return };
        match first {
            Elem::Literal(_) | Elem::Special { .. } => {
                let matching = first.matching().unwrap_or_else(|| unreachable!());
                let matcher = first.matcher().unwrap_or_else(|| unreachable!());
                out.push(Candidate::Terminal(FirstTerminal { matching, matcher }));
            }
            // A loose first position matches without consuming, so no token
            // set can rule this rule out.
            Elem::Loose(_) => *blocked = true,
            Elem::Choice(alternatives) => {
                for alternative in alternatives {
                    Self::collect_first(
                        grammar,
                        std::slice::from_ref(alternative),
                        out,
                        blocked,
                    );
                }
            }
            Elem::Rule(name) | Elem::RulePlus(name) => match grammar.lookup(name) {
                Some(key) => out.push(Candidate::Rule(key)),
                // Undefined reference; the parse will fail at expansion,
                // nothing useful to prune against.
                None => *blocked = true,
            },
        }
    }

    fn try_resolve(&mut self, key: Spur) {
        if self.resolved.contains_key(&key) || self.unprunable.contains(&key) {
            return;
        }
        let Some(candidates) = self.pending.remove(&key) else { return };

        let mut substituted = Vec::with_capacity(candidates.len());
        let mut complete = true;
        for candidate in candidates {
            match candidate {
                Candidate::Terminal(terminal) => substituted.push(Candidate::Terminal(terminal)),
                Candidate::Rule(dependency) => {
                    if let Some(terminals) = self.resolved.get(&dependency) {
                        for terminal in terminals {
                            substituted.push(Candidate::Terminal(FirstTerminal {
                                matching: terminal.matching.clone(),
                                matcher: terminal.matcher.clone(),
                            }));
                        }
                    } else {
                        complete = false;
                        substituted.push(Candidate::Rule(dependency));
                    }
                }
            }
        }

        if !complete {
            self.pending.insert(key, substituted);
            return;
        }

        // Publish, deduplicated by (kind, value); published sets are final.
        let mut seen: HashSet<Matching, ahash::RandomState> =
            HashSet::with_hasher(ahash::RandomState::new());
        let mut terminals = Vec::new();
        for candidate in substituted {
            let Candidate::Terminal(terminal) = candidate else { continue };
            if seen.insert(terminal.matching.clone()) {
                terminals.push(terminal);
            }
        }
        self.resolved.insert(key, terminals);

        let dependents = self
            .dependents
            .get(&key)
            .map(|list| list.to_vec())
            .unwrap_or_default();
        for dependent in dependents {
            self.try_resolve(dependent);
        }
    }
}
