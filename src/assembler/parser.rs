//! Backtracking grammar combinators over a token stream.
//!
//! A grammar is a tree of [`Production`] values assembled at run time.
//! Matching consumes a prefix of a token slice and yields a [`Node`] plus
//! the unconsumed tail, or the distinguished [`Unmatched`] value. Failure is
//! an ordinary return value, never a panic, so the ordered-choice,
//! repetition, and optional combinators backtrack simply by retrying with
//! the slice they started from. Sequencing never catches a child's failure;
//! only `Or`, `Repeating`, and `Optional` do.
//!
//! Backtracking cost is unbounded and unmemoized. A pathological grammar
//! can take exponential time; callers own that trade-off.
use std::fmt;
use std::ops;

use super::lexer::{Token, Value};

/// A concrete syntax tree fragment.
///
/// `Anonymous` nodes are structural scaffolding produced by the choice,
/// repetition, and optional combinators; [`Node::normalize`] splices their
/// children into the parent so a finished tree contains only named grammar
/// rules and literal leaves.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Node {
    Named { label: String, children: Vec<Node> },
    Anonymous { children: Vec<Node> },
    Leaf(Value),
}

impl Node {
    pub fn named(label: &str, children: Vec<Node>) -> Self {
        Node::Named {
            label: label.to_owned(),
            children,
        }
    }

    pub fn anonymous(children: Vec<Node>) -> Self {
        Node::Anonymous { children }
    }

    /// Removes anonymous bookkeeping nodes, splicing their children into
    /// the parent child list in order. Idempotent.
    pub fn normalize(self) -> Node {
        fn splice(children: Vec<Node>) -> Vec<Node> {
            let mut flat = Vec::with_capacity(children.len());
            for child in children {
                match child.normalize() {
                    Node::Anonymous { children } => flat.extend(children),
                    other => flat.push(other),
                }
            }
            flat
        }

        match self {
            Node::Named { label, children } => Node::Named {
                label,
                children: splice(children),
            },
            Node::Anonymous { children } => Node::Anonymous {
                children: splice(children),
            },
            leaf => leaf,
        }
    }

    fn render(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Node::Named { label, children } => {
                writeln!(f, "{}{}", pad, label)?;
                for child in children {
                    child.render(f, depth + 1)?;
                }
                Ok(())
            }
            Node::Anonymous { children } => {
                writeln!(f, "{}()", pad)?;
                for child in children {
                    child.render(f, depth + 1)?;
                }
                Ok(())
            }
            Node::Leaf(value) => writeln!(f, "{}{:?}", pad, value),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.render(f, 0)
    }
}

/// The distinguished "this production does not match here" value. Purely a
/// control-flow signal between combinators; it carries no position because
/// the enclosing combinator retries from the slice it already holds.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Unmatched;

pub type MatchResult<'a> = Result<(Node, &'a [Token]), Unmatched>;

/// A composable grammar rule matching a prefix of a token sequence.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Production {
    /// Matches exactly one token by name, and by value too if one was
    /// supplied at construction.
    Terminal {
        name: String,
        expected: Option<Value>,
    },
    /// Matches its children strictly in order and labels the subtree.
    NonTerminal {
        name: String,
        sequence: Vec<Production>,
    },
    /// Ordered choice: the first alternative that matches wins.
    Or { alternatives: Vec<Production> },
    /// Kleene star over a fixed-length group. Never fails.
    Repeating { sequence: Vec<Production> },
    /// Matches its group at most once. Never fails, consumes nothing on
    /// non-match.
    Optional { sequence: Vec<Production> },
}

impl Production {
    pub fn terminal(name: &str) -> Self {
        Production::Terminal {
            name: name.to_owned(),
            expected: None,
        }
    }

    /// A terminal that also requires a specific token value, e.g. the one
    /// symbol `[` out of a generic SYMBOL category.
    pub fn literal(name: &str, expected: Value) -> Self {
        Production::Terminal {
            name: name.to_owned(),
            expected: Some(expected),
        }
    }

    pub fn sequence(name: &str, sequence: Vec<Production>) -> Self {
        Production::NonTerminal {
            name: name.to_owned(),
            sequence,
        }
    }

    /// Builds an ordered choice, collapsing any alternative that is itself
    /// a choice into the new flat alternative list. All choice construction
    /// funnels through here, so nesting never survives to match time.
    pub fn choice(alternatives: Vec<Production>) -> Self {
        let mut flat = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            match alternative {
                Production::Or { alternatives } => flat.extend(alternatives),
                other => flat.push(other),
            }
        }
        Production::Or { alternatives: flat }
    }

    pub fn repeating(sequence: Vec<Production>) -> Self {
        Production::Repeating { sequence }
    }

    pub fn optional(sequence: Vec<Production>) -> Self {
        Production::Optional { sequence }
    }

    /// Matches this production against the head of `tokens`, returning the
    /// derived tree fragment and the unconsumed tail. On `Err` no input has
    /// been consumed: the caller still holds its original slice.
    pub fn matches<'a>(&self, tokens: &'a [Token]) -> MatchResult<'a> {
        match self {
            Production::Terminal { name, expected } => {
                let token = tokens.first().ok_or(Unmatched)?;
                if token.name != *name {
                    return Err(Unmatched);
                }
                if let Some(want) = expected {
                    if token.value != *want {
                        return Err(Unmatched);
                    }
                }
                let children = match &token.value {
                    Value::None => Vec::new(),
                    value => vec![Node::Leaf(value.clone())],
                };
                Ok((Node::named(name, children), &tokens[1..]))
            }

            Production::NonTerminal { name, sequence } => {
                let (children, rest) = match_sequence(sequence, tokens)?;
                Ok((Node::named(name, children), rest))
            }

            Production::Or { alternatives } => {
                for alternative in alternatives {
                    if let Ok(matched) = alternative.matches(tokens) {
                        return Ok(matched);
                    }
                }
                Err(Unmatched)
            }

            Production::Repeating { sequence } => {
                let mut children = Vec::new();
                let mut rest = tokens;
                while let Ok((nodes, next)) = match_sequence(sequence, rest) {
                    // A repetition that consumed nothing would never
                    // terminate; stop instead of spinning.
                    if next.len() == rest.len() {
                        break;
                    }
                    children.extend(nodes);
                    rest = next;
                }
                Ok((Node::anonymous(children), rest))
            }

            Production::Optional { sequence } => match match_sequence(sequence, tokens) {
                Ok((children, rest)) => Ok((Node::anonymous(children), rest)),
                Err(Unmatched) => Ok((Node::anonymous(Vec::new()), tokens)),
            },
        }
    }
}

/// Matches a production group strictly in order, collecting one node per
/// element. Fails as a whole if any element fails.
fn match_sequence<'a>(
    sequence: &[Production],
    tokens: &'a [Token],
) -> Result<(Vec<Node>, &'a [Token]), Unmatched> {
    let mut children = Vec::with_capacity(sequence.len());
    let mut rest = tokens;
    for production in sequence {
        let (node, next) = production.matches(rest)?;
        children.push(node);
        rest = next;
    }
    Ok((children, rest))
}

/// `a | b` builds the flat ordered choice of `a` and `b`.
impl ops::BitOr for Production {
    type Output = Production;

    fn bitor(self, rhs: Production) -> Production {
        Production::choice(vec![self, rhs])
    }
}

/// The caller-facing form of a grammar rejection: the single top-level
/// match attempt did not succeed. The combinators do not track where deep
/// inside the grammar matching stopped, so this only names the token the
/// attempt began at.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParseError {
    pub at: Option<Token>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.at {
            Some(token) => write!(
                f,
                "the grammar did not match the token stream starting at {} token",
                token.name
            ),
            None => write!(f, "the grammar did not match the empty token stream"),
        }
    }
}

/// Matches `grammar` against `tokens` once, converting an uncaught
/// [`Unmatched`] into a reportable [`ParseError`]. Any unconsumed tail is
/// returned alongside the tree; deciding whether trailing tokens are an
/// error belongs to the caller.
pub fn parse<'a>(
    grammar: &Production,
    tokens: &'a [Token],
) -> Result<(Node, &'a [Token]), ParseError> {
    grammar.matches(tokens).map_err(|Unmatched| ParseError {
        at: tokens.first().cloned(),
    })
}
