//! `Formula` is a tagged tree over [`Term`](crate::term::Term) and
//! sub-`Formula`s: predicates, the five connectives, and the two
//! quantifiers. Unlike the hand-rolled tagged union this distills from
//! (a C `union` behind a `Type` tag, see DESIGN.md), `Formula` is a genuine
//! Rust `enum` — tag exhaustiveness is enforced by the compiler at every
//! `match`.

use std::collections::VecDeque;
use std::fmt;

use fnv::FnvHashSet;
use tinyvec::TinyVec;

use crate::sexpr;
use crate::term::Term;

/// A formula tree. Every variant owns its sub-formulas and (for `Pred`) its
/// argument terms outright.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Formula {
    /// A predicate; a proposition iff `args` is empty.
    Pred { name: String, args: Vec<Term> },
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    If(Box<Formula>, Box<Formula>),
    Iff(Box<Formula>, Box<Formula>),
    Forall(String, Box<Formula>),
    Exists(String, Box<Formula>),
}

/// The top-level tag of a formula, used by class predicates and by the
/// verifier's `hasConnective` check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    Pred,
    Not,
    And,
    Or,
    If,
    Iff,
    Forall,
    Exists,
}

const PROPOSITIONAL_CONNECTIVES: [Tag; 5] = [Tag::Not, Tag::And, Tag::Or, Tag::If, Tag::Iff];
const BASE_CONNECTIVES: [Tag; 7] =
    [Tag::Not, Tag::And, Tag::Or, Tag::If, Tag::Iff, Tag::Forall, Tag::Exists];

// Construction helpers --------------------------------------------------------

impl Formula {
    /// A 0-ary predicate: `Prop(name)` in the source's builder naming.
    #[must_use]
    pub fn prop(name: impl Into<String>) -> Self {
        Formula::Pred { name: name.into(), args: Vec::new() }
    }

    #[must_use]
    pub fn pred(name: impl Into<String>, args: Vec<Term>) -> Self {
        Formula::Pred { name: name.into(), args }
    }

    #[must_use]
    pub fn not(arg: Formula) -> Self {
        Formula::Not(Box::new(arg))
    }

    #[must_use]
    pub fn and(left: Formula, right: Formula) -> Self {
        Formula::And(Box::new(left), Box::new(right))
    }

    #[must_use]
    pub fn or(left: Formula, right: Formula) -> Self {
        Formula::Or(Box::new(left), Box::new(right))
    }

    #[must_use]
    pub fn implies(left: Formula, right: Formula) -> Self {
        Formula::If(Box::new(left), Box::new(right))
    }

    #[must_use]
    pub fn iff(left: Formula, right: Formula) -> Self {
        Formula::Iff(Box::new(left), Box::new(right))
    }

    #[must_use]
    pub fn forall(var: impl Into<String>, arg: Formula) -> Self {
        Formula::Forall(var.into(), Box::new(arg))
    }

    #[must_use]
    pub fn exists(var: impl Into<String>, arg: Formula) -> Self {
        Formula::Exists(var.into(), Box::new(arg))
    }
}

// Pred/Term code reuse ---------------------------------------------------------
//
// The source interprets a Pred as a throwaway Term (`Pred::applyToAsTerm`)
// purely to reuse Term's constant/function walks instead of duplicating
// them. We get the same reuse without a dummy allocation: a Pred's argument
// list is exactly a Term's argument list, so the walks below delegate
// straight to `Term::all_constants`/`Term::all_functions` per argument.

fn pred_all_constants(args: &[Term]) -> Vec<&Term> {
    args.iter().flat_map(Term::all_constants).collect()
}

fn pred_all_functions(args: &[Term]) -> Vec<&Term> {
    args.iter().flat_map(Term::all_functions).collect()
}

fn pred_depth(args: &[Term]) -> usize {
    1 + args.iter().map(Term::depth).max().unwrap_or(0)
}

// Structural queries -----------------------------------------------------------

impl Formula {
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Formula::Pred { .. } => Tag::Pred,
            Formula::Not(_) => Tag::Not,
            Formula::And(..) => Tag::And,
            Formula::Or(..) => Tag::Or,
            Formula::If(..) => Tag::If,
            Formula::Iff(..) => Tag::Iff,
            Formula::Forall(..) => Tag::Forall,
            Formula::Exists(..) => Tag::Exists,
        }
    }

    /// Deep clone, named to mirror the source's explicit `copy()`.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Immediate sub-formulas, left to right: empty for `Pred`, one element
    /// for `Not`/quantifiers, two for a binary connective.
    #[must_use]
    pub fn subformulae(&self) -> TinyVec<[&Formula; 2]> {
        match self {
            Formula::Pred { .. } => TinyVec::new(),
            Formula::Not(a) => TinyVec::from([a.as_ref()].as_slice()),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::If(l, r) | Formula::Iff(l, r) => {
                let mut v = TinyVec::new();
                v.push(l.as_ref());
                v.push(r.as_ref());
                v
            }
            Formula::Forall(_, a) | Formula::Exists(_, a) => TinyVec::from([a.as_ref()].as_slice()),
        }
    }

    /// Breadth-first traversal of the tree, self excluded.
    #[must_use]
    pub fn all_subformulae(&self) -> Vec<&Formula> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&Formula> = VecDeque::new();
        queue.push_back(self);
        while let Some(node) = queue.pop_front() {
            for sub in node.subformulae() {
                out.push(sub);
                queue.push_back(sub);
            }
        }
        out
    }

    /// `self` followed by `all_subformulae()`.
    #[must_use]
    pub fn all_formulae(&self) -> Vec<&Formula> {
        let mut out = vec![self];
        out.extend(self.all_subformulae());
        out
    }

    /// All `Pred` nodes in pre-order (left-to-right depth-first). Ordering
    /// deliberately differs from `all_subformulae`'s BFS: rule checks and
    /// identifier rewriting (the TPTP renamer) care about appearance order.
    #[must_use]
    pub fn all_predicates(&self) -> Vec<&Formula> {
        let mut out = Vec::new();
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates<'a>(&'a self, out: &mut Vec<&'a Formula>) {
        match self {
            Formula::Pred { .. } => out.push(self),
            _ => {
                for sub in self.subformulae() {
                    sub.collect_predicates(out);
                }
            }
        }
    }

    /// The subsequence of `all_predicates()` whose args are empty.
    #[must_use]
    pub fn all_propositions(&self) -> Vec<&Formula> {
        self.all_predicates().into_iter().filter(|p| p.is_proposition()).collect()
    }

    /// Concatenation, in predicate order, of each predicate's argument
    /// constants.
    #[must_use]
    pub fn all_constants(&self) -> Vec<&Term> {
        self.all_predicates()
            .into_iter()
            .flat_map(|p| match p {
                Formula::Pred { args, .. } => pred_all_constants(args),
                _ => unreachable!("all_predicates only yields Pred nodes"),
            })
            .collect()
    }

    /// Concatenation, in predicate order, of each predicate's argument
    /// functions.
    #[must_use]
    pub fn all_functions(&self) -> Vec<&Term> {
        self.all_predicates()
            .into_iter()
            .flat_map(|p| match p {
                Formula::Pred { args, .. } => pred_all_functions(args),
                _ => unreachable!("all_predicates only yields Pred nodes"),
            })
            .collect()
    }

    /// Every sub-formula (self included) whose top tag is `Forall`/`Exists`,
    /// in breadth-first order.
    #[must_use]
    pub fn all_quantified(&self) -> Vec<&Formula> {
        self.all_formulae()
            .into_iter()
            .filter(|f| matches!(f.tag(), Tag::Forall | Tag::Exists))
            .collect()
    }

    /// 1 for `Pred` (terms are leaves); else 1 + max child depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Formula::Pred { .. } => 1,
            _ => 1 + self.subformulae().iter().map(|f| f.depth()).max().unwrap_or(0),
        }
    }

    /// For `Pred`, `1 + max arg-term depth` (0 if no args); else 1 + max
    /// child `depth_with_terms`.
    #[must_use]
    pub fn depth_with_terms(&self) -> usize {
        match self {
            Formula::Pred { args, .. } => pred_depth(args),
            _ => 1 + self.subformulae().iter().map(|f| f.depth_with_terms()).max().unwrap_or(0),
        }
    }

    /// Union of all names in the formula: predicate names, quantifier
    /// variables, and every identifier in every argument term.
    #[must_use]
    pub fn identifiers(&self) -> FnvHashSet<String> {
        match self {
            Formula::Pred { name, args } => {
                let mut out = FnvHashSet::default();
                out.insert(name.clone());
                for arg in args {
                    out.extend(arg.identifiers());
                }
                out
            }
            Formula::Forall(var, body) | Formula::Exists(var, body) => {
                let mut out = body.identifiers();
                out.insert(var.clone());
                out
            }
            _ => {
                let mut out = FnvHashSet::default();
                for sub in self.subformulae() {
                    out.extend(sub.identifiers());
                }
                out
            }
        }
    }
}

// Bound-variable analysis -------------------------------------------------------
//
// A single traversal shape, parameterised at each call site by what to
// extract at a Pred leaf, walks the tree while maintaining a stack of
// currently-open quantifier formulas (innermost last). At each Pred, every
// extracted item is matched against the stack innermost-first; only the
// first (innermost) match is paired — outer binders of the same name are
// shadowed, never paired.

fn walk_quantifiers<'a>(
    formula: &'a Formula,
    stack: &mut Vec<&'a Formula>,
    on_pred: &mut dyn FnMut(&'a Formula, &[&'a Formula]),
) {
    match formula {
        Formula::Pred { .. } => on_pred(formula, stack),
        Formula::Not(a) => walk_quantifiers(a, stack, on_pred),
        Formula::And(l, r) | Formula::Or(l, r) | Formula::If(l, r) | Formula::Iff(l, r) => {
            walk_quantifiers(l, stack, on_pred);
            walk_quantifiers(r, stack, on_pred);
        }
        Formula::Forall(_, body) | Formula::Exists(_, body) => {
            stack.push(formula);
            walk_quantifiers(body, stack, on_pred);
            stack.pop();
        }
    }
}

fn quantifier_var(f: &Formula) -> &str {
    match f {
        Formula::Forall(v, _) | Formula::Exists(v, _) => v.as_str(),
        _ => unreachable!("the quantifier stack only ever holds Forall/Exists formulas"),
    }
}

fn innermost_matching<'a>(stack: &[&'a Formula], name: &str) -> Option<&'a Formula> {
    stack.iter().rev().find(|q| quantifier_var(q) == name).copied()
}

impl Formula {
    /// Pairs of (bound constant term, binding quantifier formula).
    #[must_use]
    pub fn bound_term_variables(&self) -> Vec<(&Term, &Formula)> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        walk_quantifiers(self, &mut stack, &mut |pred, stack| {
            if let Formula::Pred { args, .. } = pred {
                for term in pred_all_constants(args) {
                    if let Some(q) = innermost_matching(stack, term.name()) {
                        out.push((term, q));
                    }
                }
            }
        });
        out
    }

    /// Pairs of (bound function-application term, binding quantifier formula).
    #[must_use]
    pub fn bound_function_variables(&self) -> Vec<(&Term, &Formula)> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        walk_quantifiers(self, &mut stack, &mut |pred, stack| {
            if let Formula::Pred { args, .. } = pred {
                for term in pred_all_functions(args) {
                    if let Some(q) = innermost_matching(stack, term.name()) {
                        out.push((term, q));
                    }
                }
            }
        });
        out
    }

    /// Pairs of (bound predicate-variable formula, binding quantifier formula).
    #[must_use]
    pub fn bound_predicate_variables(&self) -> Vec<(&Formula, &Formula)> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        walk_quantifiers(self, &mut stack, &mut |pred, stack| {
            if let Formula::Pred { name, .. } = pred {
                if let Some(q) = innermost_matching(stack, name) {
                    out.push((pred, q));
                }
            }
        });
        out
    }
}

// Class predicates ---------------------------------------------------------------

impl Formula {
    #[must_use]
    pub fn is_proposition(&self) -> bool {
        matches!(self, Formula::Pred { args, .. } if args.is_empty())
    }

    fn only_connectives(&self, allowed: &[Tag]) -> bool {
        self.all_formulae().iter().all(|f| matches!(f.tag(), Tag::Pred) || allowed.contains(&f.tag()))
    }

    #[must_use]
    pub fn is_propositional(&self) -> bool {
        self.only_connectives(&PROPOSITIONAL_CONNECTIVES)
            && self.all_predicates().iter().all(|p| p.is_proposition())
    }

    #[must_use]
    pub fn is_zeroth_order(&self) -> bool {
        self.only_connectives(&PROPOSITIONAL_CONNECTIVES)
    }

    #[must_use]
    pub fn is_first_order(&self) -> bool {
        self.only_connectives(&BASE_CONNECTIVES)
            && self.bound_predicate_variables().is_empty()
            && self.bound_function_variables().is_empty()
    }

    #[must_use]
    pub fn is_second_order(&self) -> bool {
        self.only_connectives(&BASE_CONNECTIVES)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", sexpr::render(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_1_atomic_proposition() {
        let f = Formula::prop("A");
        assert_eq!(f.depth(), 1);
        assert!(f.is_propositional());
        assert!(f.is_zeroth_order());
        assert!(f.is_first_order());
        assert!(f.is_second_order());
        assert_eq!(f.all_constants().len(), 0);
        assert_eq!(f.all_functions().len(), 0);
        assert_eq!(f.all_predicates().len(), 1);
        assert!(f.is_proposition());
    }

    #[test]
    fn scenario_2_peano_style_equation() {
        let f = Formula::and(
            Formula::pred(
                "eq",
                vec![Term::function("S", vec![Term::constant("1")]), Term::constant("2")],
            ),
            Formula::pred(
                "eq",
                vec![Term::function("S", vec![Term::constant("2")]), Term::constant("3")],
            ),
        );
        assert_eq!(f.depth(), 2);
        assert_eq!(f.depth_with_terms(), 4);
        assert!(!f.is_propositional());
        assert!(f.is_zeroth_order());
        assert!(f.is_first_order());
        assert_eq!(f.all_functions().len(), 2);
        assert_eq!(f.all_constants().len(), 4);
        assert_eq!(f.all_predicates().len(), 2);
    }

    #[test]
    fn scenario_3_nested_quantifiers() {
        let f = Formula::exists(
            "x",
            Formula::forall("y", Formula::pred("eq", vec![Term::constant("x"), Term::constant("y")])),
        );
        assert_eq!(sexpr::render(&f), "(exists x (forall y (eq x y)))");
        assert_eq!(f.bound_term_variables().len(), 2);
        assert!(!f.is_propositional());
        assert!(!f.is_zeroth_order());
        assert!(f.is_first_order());
    }

    #[test]
    fn scenario_4_induction_schema_is_second_order_only() {
        let f = Formula::forall(
            "P",
            Formula::implies(
                Formula::and(
                    Formula::pred("P", vec![Term::constant("0")]),
                    Formula::forall(
                        "n",
                        Formula::implies(
                            Formula::pred("P", vec![Term::constant("n")]),
                            Formula::pred(
                                "P",
                                vec![Term::function("add", vec![Term::constant("n"), Term::constant("1")])],
                            ),
                        ),
                    ),
                ),
                Formula::forall("n", Formula::pred("P", vec![Term::constant("n")])),
            ),
        );
        assert_eq!(f.bound_predicate_variables().len(), 4);
        assert_eq!(f.bound_term_variables().len(), 3);
        assert!(f.is_second_order());
        assert!(!f.is_first_order());
    }

    #[test]
    fn shadowing_pairs_item_with_innermost_binder_only() {
        // Forall x (Forall x (P(x))) -- the inner x shadows the outer one.
        let f = Formula::forall("x", Formula::forall("x", Formula::pred("P", vec![Term::constant("x")])));
        let bound = f.bound_term_variables();
        assert_eq!(bound.len(), 1);
        let (_, quantifier) = bound[0];
        match quantifier {
            Formula::Forall(_, body) => {
                assert!(matches!(**body, Formula::Pred { .. }));
            }
            _ => panic!("expected a Forall"),
        }
    }

    #[test]
    fn all_subformulae_is_breadth_first_self_excluded() {
        let f = Formula::and(
            Formula::prop("A"),
            Formula::or(Formula::prop("B"), Formula::not(Formula::prop("C"))),
        );
        let names: Vec<String> = f.all_subformulae().iter().map(|s| sexpr::render(s)).collect();
        assert_eq!(names, vec!["A", "(or B (not C))", "B", "(not C)", "C"]);
    }

    #[test]
    fn all_predicates_is_pre_order() {
        let f = Formula::and(
            Formula::prop("A"),
            Formula::or(
                Formula::pred("B", vec![Term::constant("a"), Term::constant("d")]),
                Formula::not(Formula::pred("C", vec![Term::constant("d")])),
            ),
        );
        let names: Vec<String> = f.all_predicates().iter().map(|p| sexpr::render(p)).collect();
        assert_eq!(names, vec!["A", "(B a d)", "(C d)"]);
    }

    #[test]
    fn all_propositions_filters_zero_arity_predicates() {
        let f = Formula::and(
            Formula::prop("A"),
            Formula::or(Formula::pred("B", vec![Term::constant("a")]), Formula::not(Formula::prop("C"))),
        );
        let names: Vec<String> = f.all_propositions().iter().map(|p| sexpr::render(p)).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn copy_is_structurally_equal() {
        let f = Formula::and(Formula::prop("A"), Formula::prop("B"));
        let g = f.copy();
        assert_eq!(f, g);
    }
}
