//! Node arena for the compiled grammar graph.
//!
//! All nodes of one compiled root live in a `Vec`-backed arena; [`NodeId`] is
//! an index into it. Children own their slots through the parent's child
//! list, while `parent`/`parent_index` are non-owning back-edges, so the
//! cyclic structure never needs reference counting. Rule references are
//! expanded on first visit and spliced into their parent's child list in
//! place; the reference node stays behind in the arena, unreachable.

use compact_str::CompactString;
use lasso::Spur;
use smallvec::SmallVec;

use crate::ast::{Ast, Reducer};
use crate::error::GrammarError;
use crate::grammar::{Grammar, Matcher, Matching};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    Terminal,
    Sequence,
    Choice,
    RuleRef,
}

pub(crate) struct Node {
    pub parent: Option<NodeId>,
    pub parent_index: usize,
    pub kind: NodeKind,
}

pub(crate) enum NodeKind {
    Terminal(TerminalNode),
    Sequence(SequenceNode),
    Choice(ChoiceNode),
    RuleRef(RuleRefNode),
}

pub(crate) struct TerminalNode {
    pub matcher: Matcher,
    pub matching: Matching,
}

pub(crate) struct SequenceNode {
    pub children: SmallVec<[NodeId; 4]>,
    pub head_index: usize,
    pub ast_results: Vec<Ast>,
    pub reduce: Option<Reducer>,
    /// Set when this sequence is the expansion of a named rule.
    pub rule_name: Option<Spur>,
    pub version: u64,
    /// One-or-more repetition; completing pushes a chance to try another
    /// iteration.
    pub plus_mode: bool,
    /// Repetition counter, indexes `ast_results` rows in plus mode.
    pub plus_head_index: usize,
}

pub(crate) struct ChoiceNode {
    pub children: SmallVec<[NodeId; 4]>,
    pub head_index: usize,
    pub version: u64,
}

pub(crate) struct RuleRefNode {
    pub name: CompactString,
    pub plus_mode: bool,
}

/// The arena plus the engine-wide epoch counter.
pub(crate) struct Graph {
    nodes: Vec<Node>,
    root: NodeId,
    epoch: u64,
}

impl Graph {
    /// Build the root rule's expansion eagerly; everything below rule
    /// references stays unexpanded until visited.
    pub fn compile(grammar: &Grammar, root: Spur) -> Result<Self, GrammarError> {
        let mut graph = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            epoch: 0,
        };
        let root_id = graph.build_rule(grammar, root, None, 0, false)?;
        graph.root = root_id;
        Ok(graph)
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Fresh epoch; node state older than this is lazily reset on entry.
    pub fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    pub fn tag(&self, id: NodeId) -> Tag {
        match self.nodes[id.index()].kind {
            NodeKind::Terminal(_) => Tag::Terminal,
            NodeKind::Sequence(_) => Tag::Sequence,
            NodeKind::Choice(_) => Tag::Choice,
            NodeKind::RuleRef(_) => Tag::RuleRef,
        }
    }

    pub fn parent_of(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let node = &self.nodes[id.index()];
        node.parent.map(|parent| (parent, node.parent_index))
    }

    pub fn terminal(&self, id: NodeId) -> &TerminalNode {
        match &self.nodes[id.index()].kind {
            NodeKind::Terminal(terminal) => terminal,
            _ => unreachable!("node is not a terminal"),
        }
    }

    pub fn sequence(&self, id: NodeId) -> &SequenceNode {
        match &self.nodes[id.index()].kind {
            NodeKind::Sequence(sequence) => sequence,
            _ => unreachable!("node is not a sequence"),
        }
    }

    pub fn sequence_mut(&mut self, id: NodeId) -> &mut SequenceNode {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Sequence(sequence) => sequence,
            _ => unreachable!("node is not a sequence"),
        }
    }

    pub fn choice_mut(&mut self, id: NodeId) -> &mut ChoiceNode {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Choice(choice) => choice,
            _ => unreachable!("node is not a choice"),
        }
    }

    /// Restore a backtracking point's head position.
    pub fn set_head(&mut self, id: NodeId, head_index: usize) {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Sequence(sequence) => sequence.head_index = head_index,
            NodeKind::Choice(choice) => choice.head_index = head_index,
            _ => unreachable!("only sequences and choices carry a head index"),
        }
    }

    /// Stamp `id` and every ancestor with `epoch` so the retried attempt's
    /// spine keeps its state instead of lazily resetting.
    pub fn stamp_spine(&mut self, id: NodeId, epoch: u64) {
        let mut current = Some(id);
        while let Some(at) = current {
            let node = &mut self.nodes[at.index()];
            match &mut node.kind {
                NodeKind::Sequence(sequence) => sequence.version = epoch,
                NodeKind::Choice(choice) => choice.version = epoch,
                NodeKind::Terminal(_) | NodeKind::RuleRef(_) => {}
            }
            current = node.parent;
        }
    }

    /// Expand a rule reference and replace it in its parent's child list.
    /// The expansion persists; subsequent visits land on the sequence.
    pub fn expand_ref(
        &mut self,
        grammar: &Grammar,
        id: NodeId,
    ) -> Result<NodeId, GrammarError> {
        let (name, plus_mode) = match &self.nodes[id.index()].kind {
            NodeKind::RuleRef(reference) => (reference.name.clone(), reference.plus_mode),
            _ => unreachable!("node is not a rule reference"),
        };
        let parent = self.nodes[id.index()].parent;
        let parent_index = self.nodes[id.index()].parent_index;

        let key = grammar
            .lookup(&name)
            .filter(|key| grammar.rule(*key).is_some())
            .ok_or_else(|| GrammarError::UndefinedRule(name.to_string()))?;

        let expanded = self.build_rule(grammar, key, parent, parent_index, plus_mode)?;
        if let Some(parent_id) = parent {
            self.replace_child(parent_id, parent_index, expanded);
        }
        Ok(expanded)
    }

    fn build_rule(
        &mut self,
        grammar: &Grammar,
        key: Spur,
        parent: Option<NodeId>,
        parent_index: usize,
        plus_mode: bool,
    ) -> Result<NodeId, GrammarError> {
        let def = grammar
            .rule(key)
            .ok_or_else(|| GrammarError::UndefinedRule(grammar.resolve(key).to_string()))?;

        let id = self.alloc(Node {
            parent,
            parent_index,
            kind: NodeKind::Sequence(SequenceNode {
                children: SmallVec::new(),
                head_index: 0,
                ast_results: Vec::new(),
                reduce: def.reduce.clone(),
                rule_name: Some(key),
                version: 0,
                plus_mode,
                plus_head_index: 0,
            }),
        });

        let mut children = SmallVec::with_capacity(def.body.len());
        for (index, elem) in def.body.iter().enumerate() {
            children.push(self.build_elem(elem, id, index));
        }
        self.sequence_mut(id).children = children;
        Ok(id)
    }

    fn build_elem(
        &mut self,
        elem: &crate::grammar::Elem,
        parent: NodeId,
        parent_index: usize,
    ) -> NodeId {
        use crate::grammar::Elem;

        match elem {
            Elem::Literal(_) | Elem::Loose(_) | Elem::Special { .. } => self.alloc(Node {
                parent: Some(parent),
                parent_index,
                kind: NodeKind::Terminal(TerminalNode {
                    matcher: elem.matcher().unwrap_or_else(|| unreachable!()),
                    matching: elem.matching().unwrap_or_else(|| unreachable!()),
                }),
            }),
            Elem::Choice(alternatives) => {
                let id = self.alloc(Node {
                    parent: Some(parent),
                    parent_index,
                    kind: NodeKind::Choice(ChoiceNode {
                        children: SmallVec::new(),
                        head_index: 0,
                        version: 0,
                    }),
                });
                let mut children = SmallVec::with_capacity(alternatives.len());
                for (index, alternative) in alternatives.iter().enumerate() {
                    children.push(self.build_elem(alternative, id, index));
                }
                self.choice_mut(id).children = children;
                id
            }
            Elem::Rule(name) => self.alloc(Node {
                parent: Some(parent),
                parent_index,
                kind: NodeKind::RuleRef(RuleRefNode {
                    name: name.clone(),
                    plus_mode: false,
                }),
            }),
            Elem::RulePlus(name) => self.alloc(Node {
                parent: Some(parent),
                parent_index,
                kind: NodeKind::RuleRef(RuleRefNode {
                    name: name.clone(),
                    plus_mode: true,
                }),
            }),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or_else(|_| {
            unreachable!("node arena exceeded u32::MAX entries")
        }));
        self.nodes.push(node);
        id
    }

    fn replace_child(&mut self, parent: NodeId, parent_index: usize, child: NodeId) {
        match &mut self.nodes[parent.index()].kind {
            NodeKind::Sequence(sequence) => sequence.children[parent_index] = child,
            NodeKind::Choice(choice) => choice.children[parent_index] = child,
            _ => unreachable!("only sequences and choices have children"),
        }
    }

    #[cfg(test)]
    pub fn check_parent_links(&self) {
        for (index, node) in self.nodes.iter().enumerate() {
            let Some(parent) = node.parent else { continue };
            let children: &[NodeId] = match &self.nodes[parent.index()].kind {
                NodeKind::Sequence(sequence) => &sequence.children,
                NodeKind::Choice(choice) => &choice.children,
                _ => panic!("parent of node {index} has no children"),
            };
            // A replaced rule reference is allowed to keep its stale
            // back-edge; every reachable node must satisfy the invariant.
            if matches!(node.kind, NodeKind::RuleRef(_)) {
                continue;
            }
            assert_eq!(
                children[node.parent_index],
                NodeId(u32::try_from(index).unwrap()),
                "parent.children[parent_index] must point back at the node"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Elem;

    fn sample_grammar() -> Grammar {
        Grammar::builder()
            .start("expr")
            .rule(
                "expr",
                [
                    Elem::rule("term"),
                    Elem::any_of([Elem::lit("+"), Elem::lit("-")]),
                    Elem::rule("term"),
                ],
            )
            .rule("term", [Elem::any_of([Elem::lit("a"), Elem::lit("b")])])
            .build()
            .unwrap()
    }

    #[test]
    fn test_compile_builds_root_sequence() {
        let grammar = sample_grammar();
        let key = grammar.lookup("expr").unwrap();
        let graph = Graph::compile(&grammar, key).unwrap();

        assert_eq!(graph.tag(graph.root()), Tag::Sequence);
        let root = graph.sequence(graph.root());
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.rule_name, Some(key));
        graph.check_parent_links();
    }

    #[test]
    fn test_expand_ref_splices_in_place() {
        let grammar = sample_grammar();
        let key = grammar.lookup("expr").unwrap();
        let mut graph = Graph::compile(&grammar, key).unwrap();

        let reference = graph.sequence(graph.root()).children[0];
        assert_eq!(graph.tag(reference), Tag::RuleRef);

        let expanded = graph.expand_ref(&grammar, reference).unwrap();
        assert_eq!(graph.tag(expanded), Tag::Sequence);
        assert_eq!(graph.sequence(graph.root()).children[0], expanded);
        assert_eq!(graph.parent_of(expanded), Some((graph.root(), 0)));
        graph.check_parent_links();
    }

    #[test]
    fn test_expand_undefined_rule() {
        let grammar = Grammar::builder()
            .start("expr")
            .rule("expr", [Elem::rule("missing")])
            .build()
            .unwrap();
        let key = grammar.lookup("expr").unwrap();
        let mut graph = Graph::compile(&grammar, key).unwrap();

        let reference = graph.sequence(graph.root()).children[0];
        let result = graph.expand_ref(&grammar, reference);
        assert!(matches!(result, Err(GrammarError::UndefinedRule(_))));
    }

    #[test]
    fn test_epochs_are_monotonic() {
        let grammar = sample_grammar();
        let key = grammar.lookup("expr").unwrap();
        let mut graph = Graph::compile(&grammar, key).unwrap();

        let first = graph.next_epoch();
        let second = graph.next_epoch();
        assert!(second > first);
    }
}
