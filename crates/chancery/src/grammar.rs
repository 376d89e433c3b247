//! Grammar definition: rule bodies, terminal matchers, and the builder.
//!
//! A grammar is a set of named rules plus a start rule. Each rule body is an
//! ordered list of [`Elem`]s; a body with an attached reducer collapses the
//! children's values at the rule boundary. Rule references are resolved
//! lazily, when the engine first expands them during a parse.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use hashbrown::HashMap;
use lasso::{Rodeo, Spur};

use crate::ast::{Ast, Reducer};
use crate::error::GrammarError;
use crate::lexer::Token;
use crate::scanner::Scanner;

/// How a terminal advertises itself in suggestions and FIRST sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchKind {
    /// Fixed token text.
    Literal,
    /// Zero-cost always/never sentinel; consumes nothing.
    Loose,
    /// User-named token class, e.g. an identifier matcher.
    Special,
}

/// Terminal descriptor: the identity used to deduplicate suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Matching {
    pub kind: MatchKind,
    pub value: CompactString,
}

impl Matching {
    #[must_use]
    pub fn new(kind: MatchKind, value: impl Into<CompactString>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    #[must_use]
    pub const fn is_loose(&self) -> bool {
        matches!(self.kind, MatchKind::Loose)
    }
}

impl fmt::Display for Matching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MatchKind::Literal => write!(f, "'{}'", self.value),
            MatchKind::Loose => write!(f, "<{}>", self.value),
            MatchKind::Special => write!(f, "{}", self.value),
        }
    }
}

/// Outcome of running a terminal matcher against the scanner.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    /// Matched; `None` for sentinels that consume no token.
    Hit(Option<Token>),
    Miss,
}

impl MatchOutcome {
    #[must_use]
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Terminal matcher: probes the scanner, consuming the matched token only
/// when `cost` is true.
pub type Matcher = Arc<dyn Fn(&mut Scanner, bool) -> MatchOutcome + Send + Sync>;

/// Predicate over a single token, the user-facing half of a `special` matcher.
pub type TokenPredicate = Arc<dyn Fn(&Token) -> bool + Send + Sync>;

pub(crate) fn literal_matcher(value: CompactString) -> Matcher {
    Arc::new(move |scanner, cost| {
        let hit = scanner.peek().is_some_and(|token| token.text() == value);
        if !hit {
            return MatchOutcome::Miss;
        }
        if cost {
            MatchOutcome::Hit(scanner.bump())
        } else {
            MatchOutcome::Hit(scanner.peek().cloned())
        }
    })
}

pub(crate) fn loose_matcher(accept: bool) -> Matcher {
    Arc::new(move |_scanner, _cost| {
        if accept {
            MatchOutcome::Hit(None)
        } else {
            MatchOutcome::Miss
        }
    })
}

pub(crate) fn special_matcher(predicate: TokenPredicate) -> Matcher {
    Arc::new(move |scanner, cost| {
        let hit = scanner.peek().is_some_and(|token| predicate(token));
        if !hit {
            return MatchOutcome::Miss;
        }
        if cost {
            MatchOutcome::Hit(scanner.bump())
        } else {
            MatchOutcome::Hit(scanner.peek().cloned())
        }
    })
}

/// One element of a rule body.
#[derive(Clone)]
pub enum Elem {
    /// Matches a token with exactly this text.
    Literal(CompactString),
    /// `loose(true)` always matches without consuming; `loose(false)` never
    /// matches. Useful as the empty alternative of a choice.
    Loose(bool),
    /// User-named token class.
    Special {
        name: CompactString,
        predicate: TokenPredicate,
    },
    /// Ordered alternatives; exactly one must match.
    Choice(Vec<Elem>),
    /// Reference to a named rule, expanded on first visit.
    Rule(CompactString),
    /// Rule reference repeated one or more times.
    RulePlus(CompactString),
}

impl Elem {
    #[must_use]
    pub fn lit(value: impl Into<CompactString>) -> Self {
        Self::Literal(value.into())
    }

    #[must_use]
    pub const fn loose(accept: bool) -> Self {
        Self::Loose(accept)
    }

    #[must_use]
    pub fn special<F>(name: impl Into<CompactString>, predicate: F) -> Self
    where
        F: Fn(&Token) -> bool + Send + Sync + 'static,
    {
        Self::Special {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    #[must_use]
    pub fn any_of<I>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        Self::Choice(alternatives.into_iter().collect())
    }

    #[must_use]
    pub fn rule(name: impl Into<CompactString>) -> Self {
        Self::Rule(name.into())
    }

    #[must_use]
    pub fn plus(name: impl Into<CompactString>) -> Self {
        Self::RulePlus(name.into())
    }

    /// The descriptor a terminal element advertises; `None` for non-terminals.
    #[must_use]
    pub(crate) fn matching(&self) -> Option<Matching> {
        match self {
            Self::Literal(value) => Some(Matching::new(MatchKind::Literal, value.clone())),
            Self::Loose(accept) => Some(Matching::new(
                MatchKind::Loose,
                if *accept { "true" } else { "false" },
            )),
            Self::Special { name, .. } => Some(Matching::new(MatchKind::Special, name.clone())),
            _ => None,
        }
    }

    pub(crate) fn matcher(&self) -> Option<Matcher> {
        match self {
            Self::Literal(value) => Some(literal_matcher(value.clone())),
            Self::Loose(accept) => Some(loose_matcher(*accept)),
            Self::Special { predicate, .. } => Some(special_matcher(predicate.clone())),
            _ => None,
        }
    }
}

impl fmt::Debug for Elem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "Literal({value:?})"),
            Self::Loose(accept) => write!(f, "Loose({accept})"),
            Self::Special { name, .. } => write!(f, "Special({name:?})"),
            Self::Choice(alternatives) => f.debug_tuple("Choice").field(alternatives).finish(),
            Self::Rule(name) => write!(f, "Rule({name:?})"),
            Self::RulePlus(name) => write!(f, "RulePlus({name:?})"),
        }
    }
}

/// A named rule: body elements plus an optional reducer.
#[derive(Clone)]
pub(crate) struct RuleDef {
    pub body: Vec<Elem>,
    pub reduce: Option<Reducer>,
}

/// Compiled grammar: interned rule table plus the start rule.
#[derive(Clone)]
pub struct Grammar {
    rules: HashMap<Spur, RuleDef, ahash::RandomState>,
    start: Spur,
    interner: Rodeo,
}

impl Grammar {
    #[must_use]
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    #[must_use]
    pub fn start_rule(&self) -> &str {
        self.interner.resolve(&self.start)
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|key| self.interner.resolve(key))
    }

    pub(crate) fn rule(&self, key: Spur) -> Option<&RuleDef> {
        self.rules.get(&key)
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Spur> {
        self.interner.get(name)
    }

    pub(crate) fn resolve(&self, key: Spur) -> &str {
        self.interner.resolve(&key)
    }

    pub(crate) fn rule_keys(&self) -> impl Iterator<Item = Spur> + '_ {
        self.rules.keys().copied()
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("start", &self.start_rule())
            .field("rules", &self.rules.len())
            .finish()
    }
}

/// Builder for [`Grammar`].
pub struct GrammarBuilder {
    rules: Vec<(CompactString, Vec<Elem>, Option<Reducer>)>,
    start: Option<CompactString>,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            start: None,
        }
    }

    #[must_use]
    pub fn start(mut self, name: impl Into<CompactString>) -> Self {
        self.start = Some(name.into());
        self
    }

    #[must_use]
    pub fn rule<I>(mut self, name: impl Into<CompactString>, body: I) -> Self
    where
        I: IntoIterator<Item = Elem>,
    {
        self.rules
            .push((name.into(), body.into_iter().collect(), None));
        self
    }

    #[must_use]
    pub fn rule_with<I, F>(mut self, name: impl Into<CompactString>, body: I, reduce: F) -> Self
    where
        I: IntoIterator<Item = Elem>,
        F: Fn(Vec<Ast>) -> Ast + Send + Sync + 'static,
    {
        self.rules.push((
            name.into(),
            body.into_iter().collect(),
            Some(Arc::new(reduce) as Reducer),
        ));
        self
    }

    /// Build the grammar from the configured rules.
    ///
    /// Local shapes are validated here (duplicate or empty rules, empty
    /// choices, missing start rule); references to rules that do not exist
    /// surface on the first parse that expands them.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] describing the first invalid shape found.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        // TODO: rewrite direct left recursion here (A -> A b | c becomes
        // A -> c b*); until then such grammars run into the visit budget.
        let start_name = self.start.ok_or(GrammarError::MissingStartRule)?;

        let mut interner = Rodeo::default();
        let mut rules: HashMap<Spur, RuleDef, ahash::RandomState> =
            HashMap::with_capacity_and_hasher(self.rules.len(), ahash::RandomState::new());

        for (name, body, reduce) in self.rules {
            if body.is_empty() {
                return Err(GrammarError::EmptyRule(name.into()));
            }
            validate_elems(&name, &body)?;

            let key = interner.get_or_intern(&name);
            let previous = rules.insert(key, RuleDef { body, reduce });
            if previous.is_some() {
                return Err(GrammarError::DuplicateRule(name.into()));
            }
        }

        let start = interner
            .get(&start_name)
            .filter(|key| rules.contains_key(key))
            .ok_or_else(|| GrammarError::UndefinedRule(start_name.into()))?;

        Ok(Grammar {
            rules,
            start,
            interner,
        })
    }
}

fn validate_elems(rule: &str, elems: &[Elem]) -> Result<(), GrammarError> {
    for elem in elems {
        if let Elem::Choice(alternatives) = elem {
            if alternatives.is_empty() {
                return Err(GrammarError::EmptyChoice(rule.into()));
            }
            validate_elems(rule, alternatives)?;
        }
    }
    Ok(())
}
