//! The proof-node verifier: eleven inference rules, each a small set of
//! structural preconditions over a node's formula and its premises, plus
//! the assumption-set combinators that track which `Assumption`-rule nodes
//! remain undischarged.
//!
//! Premises are checked against every possible ordering (permutation
//! search), not just the order they were supplied in: several rules are
//! symmetric in their premises (`AndIntro`, `NotIntro`, `IffIntro`) and a
//! caller building a proof graph from an unordered source (graph edges,
//! say) may not hand them to us pre-sorted. If every ordering fails, the
//! diagnostic from whichever ordering passed the most prechecks (the
//! "deepest" attempt) is reported, on the principle that it is the
//! caller's most-likely-intended order.

use std::fmt;
use std::str::FromStr;

use fnv::FnvHashSet;

use crate::diag::Diag;
use crate::formula::{Formula, Tag};
use crate::sexpr;

/// An index into a [`crate::graph::ProofGraph`]'s node arena. Declared here
/// rather than in `graph` because it's fundamentally part of the proof-node
/// model (`ProofNode::parents` is a list of these).
pub type NodeId = usize;

/// The eleven justification rules a proof node may cite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rule {
    Assumption,
    AndIntro,
    AndElim,
    OrIntro,
    OrElim,
    NotIntro,
    NotElim,
    IfIntro,
    IfElim,
    IffIntro,
    IffElim,
}

impl Rule {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Assumption => "Assumption",
            Rule::AndIntro => "AndIntro",
            Rule::AndElim => "AndElim",
            Rule::OrIntro => "OrIntro",
            Rule::OrElim => "OrElim",
            Rule::NotIntro => "NotIntro",
            Rule::NotElim => "NotElim",
            Rule::IfIntro => "IfIntro",
            Rule::IfElim => "IfElim",
            Rule::IffIntro => "IffIntro",
            Rule::IffElim => "IffElim",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Rule {
    type Err = Diag;

    fn from_str(s: &str) -> Result<Self, Diag> {
        match s {
            "Assumption" => Ok(Rule::Assumption),
            "AndIntro" => Ok(Rule::AndIntro),
            "AndElim" => Ok(Rule::AndElim),
            "OrIntro" => Ok(Rule::OrIntro),
            "OrElim" => Ok(Rule::OrElim),
            "NotIntro" => Ok(Rule::NotIntro),
            "NotElim" => Ok(Rule::NotElim),
            "IfIntro" => Ok(Rule::IfIntro),
            "IfElim" => Ok(Rule::IfElim),
            "IffIntro" => Ok(Rule::IffIntro),
            "IffElim" => Ok(Rule::IffElim),
            other => Err(Diag::unknown_rule(other)),
        }
    }
}

/// A single step of a natural-deduction proof: a formula, the rule that
/// justifies it, and the ids of the premises it cites (in the order the
/// caller supplied them — `verify` tries every reordering itself).
#[derive(Clone, Debug)]
pub struct ProofNode {
    pub formula: Formula,
    pub justification: Rule,
    pub parents: Vec<NodeId>,
}

impl ProofNode {
    #[must_use]
    pub fn new(formula: Formula, justification: Rule, parents: Vec<NodeId>) -> Self {
        ProofNode { formula, justification, parents }
    }
}

/// A premise as seen by the verifier: the id and formula of some already
/// (successfully) verified node, plus its own already-computed assumption
/// set.
pub struct Premise<'a> {
    pub id: NodeId,
    pub formula: &'a Formula,
    pub assumptions: &'a FnvHashSet<NodeId>,
}

// Primitive predicates, mirroring the four checks named in spec.md's
// verifier description ------------------------------------------------------

fn has_arity(count: usize, expected: usize, formula: &Formula) -> Result<(), String> {
    if count == expected {
        Ok(())
    } else {
        Err(format!(
            "expected {} to have {expected} parent(s) but it has {count}",
            sexpr::render(formula)
        ))
    }
}

fn has_connective(formula: &Formula, tag: Tag) -> Result<(), String> {
    if formula.tag() == tag {
        Ok(())
    } else {
        Err(format!(
            "expected {} to have top-level connective {:?} but it has {:?}",
            sexpr::render(formula),
            tag,
            formula.tag()
        ))
    }
}

fn equal_formula(a: &Formula, b: &Formula) -> Result<(), String> {
    if a == b {
        Ok(())
    } else {
        Err(format!("expected {} to equal {}", sexpr::render(a), sexpr::render(b)))
    }
}

fn has_assumption(
    assumptions: &FnvHashSet<NodeId>,
    owner: &Formula,
    expected: &Formula,
    formula_of: &dyn Fn(NodeId) -> &Formula,
) -> Result<(), String> {
    if assumptions.iter().any(|id| formula_of(*id) == expected) {
        Ok(())
    } else {
        Err(format!("expected {} to have {} as an assumption", sexpr::render(owner), sexpr::render(expected)))
    }
}

// Assumption-set combinators --------------------------------------------------

fn union(premises: &[&Premise]) -> FnvHashSet<NodeId> {
    let mut out = FnvHashSet::default();
    for p in premises {
        out.extend(p.assumptions.iter().copied());
    }
    out
}

fn union_excluding(premises: &[&Premise], exclude: &[&Formula], formula_of: &dyn Fn(NodeId) -> &Formula) -> FnvHashSet<NodeId> {
    let mut out = union(premises);
    out.retain(|id| !exclude.iter().any(|f| formula_of(*id) == *f));
    out
}

// Depth-counting precondition chain -------------------------------------------
//
// Each rule below walks its preconditions in order, counting how many have
// passed; the first failure returns immediately with that count plus a
// message. `verify` uses the count to pick the most-likely-intended premise
// ordering when every ordering fails.

macro_rules! expect {
    ($depth:ident, $result:expr) => {
        match $result {
            Ok(()) => {
                $depth += 1;
            }
            Err(msg) => return Err(($depth, msg)),
        }
    };
}

macro_rules! expect_either {
    ($depth:ident, $a:expr, $b:expr) => {{
        match ($a, $b) {
            (Err(e1), Err(e2)) => return Err(($depth, format!("either {e1} or {e2}"))),
            _ => {
                $depth += 1;
            }
        }
    }};
}

type RuleResult = Result<FnvHashSet<NodeId>, (usize, String)>;

fn assumption_rule(node_id: NodeId, node: &ProofNode, premises: &[&Premise]) -> RuleResult {
    let mut depth = 0usize;
    expect!(depth, has_arity(premises.len(), 0, &node.formula));
    let mut assumptions = FnvHashSet::default();
    assumptions.insert(node_id);
    Ok(assumptions)
}

fn and_intro(node: &ProofNode, premises: &[&Premise]) -> RuleResult {
    let mut depth = 0usize;
    expect!(depth, has_arity(premises.len(), 2, &node.formula));
    expect!(depth, has_connective(&node.formula, Tag::And));
    let (left, right) = match &node.formula {
        Formula::And(l, r) => (l.as_ref(), r.as_ref()),
        _ => unreachable!("checked by has_connective"),
    };
    expect!(depth, equal_formula(left, premises[0].formula));
    expect!(depth, equal_formula(right, premises[1].formula));
    Ok(union(premises))
}

fn and_elim(node: &ProofNode, premises: &[&Premise]) -> RuleResult {
    let mut depth = 0usize;
    expect!(depth, has_arity(premises.len(), 1, &node.formula));
    expect!(depth, has_connective(premises[0].formula, Tag::And));
    let (left, right) = match premises[0].formula {
        Formula::And(l, r) => (l.as_ref(), r.as_ref()),
        _ => unreachable!("checked by has_connective"),
    };
    expect_either!(depth, equal_formula(&node.formula, left), equal_formula(&node.formula, right));
    Ok(union(premises))
}

fn or_intro(node: &ProofNode, premises: &[&Premise]) -> RuleResult {
    let mut depth = 0usize;
    expect!(depth, has_arity(premises.len(), 1, &node.formula));
    expect!(depth, has_connective(&node.formula, Tag::Or));
    let (left, right) = match &node.formula {
        Formula::Or(l, r) => (l.as_ref(), r.as_ref()),
        _ => unreachable!("checked by has_connective"),
    };
    expect_either!(depth, equal_formula(premises[0].formula, left), equal_formula(premises[0].formula, right));
    Ok(union(premises))
}

fn or_elim(node: &ProofNode, premises: &[&Premise], formula_of: &dyn Fn(NodeId) -> &Formula) -> RuleResult {
    let mut depth = 0usize;
    expect!(depth, has_arity(premises.len(), 3, &node.formula));
    expect!(depth, has_connective(premises[0].formula, Tag::Or));
    let (left, right) = match premises[0].formula {
        Formula::Or(l, r) => (l.as_ref(), r.as_ref()),
        _ => unreachable!("checked by has_connective"),
    };
    expect!(depth, equal_formula(&node.formula, premises[1].formula));
    expect!(depth, equal_formula(&node.formula, premises[2].formula));
    expect!(depth, has_assumption(premises[1].assumptions, premises[1].formula, left, formula_of));
    expect!(depth, has_assumption(premises[2].assumptions, premises[2].formula, right, formula_of));
    Ok(union_excluding(premises, &[left, right], formula_of))
}

/// Shared by `NotIntro`/`NotElim`: spec.md documents `NotElim` as "dual of
/// NotIntro — same structural checks," matching `verify.cpp`'s two
/// functions, which are byte-for-byte identical.
fn not_rule(node: &ProofNode, premises: &[&Premise], formula_of: &dyn Fn(NodeId) -> &Formula) -> RuleResult {
    let mut depth = 0usize;
    expect!(depth, has_arity(premises.len(), 2, &node.formula));
    expect!(depth, has_connective(&node.formula, Tag::Not));
    let body = match &node.formula {
        Formula::Not(a) => a.as_ref(),
        _ => unreachable!("checked by has_connective"),
    };
    expect!(depth, has_connective(premises[0].formula, Tag::Not));
    let negated_arg = match premises[0].formula {
        Formula::Not(a) => a.as_ref(),
        _ => unreachable!("checked by has_connective"),
    };
    expect!(depth, equal_formula(premises[1].formula, negated_arg));
    expect_either!(
        depth,
        has_assumption(premises[0].assumptions, premises[0].formula, body, formula_of),
        has_assumption(premises[1].assumptions, premises[1].formula, body, formula_of)
    );
    Ok(union_excluding(premises, &[body], formula_of))
}

fn if_intro(node: &ProofNode, premises: &[&Premise], formula_of: &dyn Fn(NodeId) -> &Formula) -> RuleResult {
    let mut depth = 0usize;
    expect!(depth, has_arity(premises.len(), 1, &node.formula));
    expect!(depth, has_connective(&node.formula, Tag::If));
    let (antecedent, consequent) = match &node.formula {
        Formula::If(l, r) => (l.as_ref(), r.as_ref()),
        _ => unreachable!("checked by has_connective"),
    };
    expect!(depth, has_assumption(premises[0].assumptions, premises[0].formula, antecedent, formula_of));
    expect!(depth, equal_formula(consequent, premises[0].formula));
    Ok(union_excluding(premises, &[antecedent], formula_of))
}

fn if_elim(node: &ProofNode, premises: &[&Premise]) -> RuleResult {
    let mut depth = 0usize;
    expect!(depth, has_arity(premises.len(), 2, &node.formula));
    expect!(depth, has_connective(premises[0].formula, Tag::If));
    let (antecedent, consequent) = match premises[0].formula {
        Formula::If(l, r) => (l.as_ref(), r.as_ref()),
        _ => unreachable!("checked by has_connective"),
    };
    expect!(depth, equal_formula(antecedent, premises[1].formula));
    expect!(depth, equal_formula(&node.formula, consequent));
    Ok(union(premises))
}

/// Shared by `IffIntro`/`IffElim` — see DESIGN.md decision on the
/// `verifyIffIntro`/`verifyIffElim` discrepancy in `verify.cpp`.
fn iff_rule(node: &ProofNode, premises: &[&Premise], formula_of: &dyn Fn(NodeId) -> &Formula) -> RuleResult {
    let mut depth = 0usize;
    expect!(depth, has_arity(premises.len(), 2, &node.formula));
    expect!(depth, has_connective(&node.formula, Tag::Iff));
    let (left, right) = match &node.formula {
        Formula::Iff(l, r) => (l.as_ref(), r.as_ref()),
        _ => unreachable!("checked by has_connective"),
    };
    expect!(depth, equal_formula(premises[0].formula, left));
    expect!(depth, equal_formula(premises[1].formula, right));
    expect!(depth, has_assumption(premises[0].assumptions, premises[0].formula, right, formula_of));
    expect!(depth, has_assumption(premises[1].assumptions, premises[1].formula, left, formula_of));
    Ok(union_excluding(premises, &[left, right], formula_of))
}

fn dispatch(
    rule: Rule,
    node_id: NodeId,
    node: &ProofNode,
    premises: &[&Premise],
    formula_of: &dyn Fn(NodeId) -> &Formula,
) -> RuleResult {
    match rule {
        Rule::Assumption => assumption_rule(node_id, node, premises),
        Rule::AndIntro => and_intro(node, premises),
        Rule::AndElim => and_elim(node, premises),
        Rule::OrIntro => or_intro(node, premises),
        Rule::OrElim => or_elim(node, premises, formula_of),
        Rule::NotIntro | Rule::NotElim => not_rule(node, premises, formula_of),
        Rule::IfIntro => if_intro(node, premises, formula_of),
        Rule::IfElim => if_elim(node, premises),
        Rule::IffIntro | Rule::IffElim => iff_rule(node, premises, formula_of),
    }
}

/// Every ordering of `0..n`, generated by Heap's algorithm — whose first
/// emitted ordering is always the identity, so the caller's original
/// premise order is tried before any other.
fn permutations(n: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    let mut a: Vec<usize> = (0..n).collect();
    result.push(a.clone());
    if n <= 1 {
        return result;
    }
    fn heap(k: usize, a: &mut Vec<usize>, result: &mut Vec<Vec<usize>>) {
        if k == 1 {
            return;
        }
        heap(k - 1, a, result);
        for i in 0..k - 1 {
            if k % 2 == 0 {
                a.swap(i, k - 1);
            } else {
                a.swap(0, k - 1);
            }
            result.push(a.clone());
            heap(k - 1, a, result);
        }
    }
    heap(n, &mut a, &mut result);
    result
}

/// Verifies a single proof node against its already-verified premises,
/// trying every permutation of premise order and returning the resulting
/// assumption set on the first success. On total failure, returns the
/// diagnostic from whichever ordering satisfied the most preconditions.
pub fn verify(
    node_id: NodeId,
    node: &ProofNode,
    premises_in_order: &[Premise],
    formula_of: &dyn Fn(NodeId) -> &Formula,
) -> Result<FnvHashSet<NodeId>, Diag> {
    let mut best: Option<(usize, String)> = None;
    for perm in permutations(premises_in_order.len()) {
        let ordered: Vec<&Premise> = perm.iter().map(|&i| &premises_in_order[i]).collect();
        match dispatch(node.justification, node_id, node, &ordered, formula_of) {
            Ok(assumptions) => return Ok(assumptions),
            Err((depth, msg)) => {
                let is_better = match &best {
                    None => true,
                    Some((best_depth, _)) => depth > *best_depth,
                };
                if is_better {
                    best = Some((depth, msg));
                }
            }
        }
    }
    let (_, msg) = best.unwrap_or_else(|| (0, "no premise ordering was attempted".to_string()));
    Err(Diag::verification(msg))
}
