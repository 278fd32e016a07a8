//! Renders a first-order [`Formula`] to a TPTP `fof(...)` clause.
//!
//! TPTP identifiers are case-sensitive in a way this surface syntax is not:
//! variables (and, here, every constant actually bound by a quantifier)
//! must start with an uppercase letter; functors and predicates must start
//! with a lowercase letter; an unbound constant is written as a
//! double-quoted distinct-object instead. `to_first_order_tptp` deep-renames
//! a formula into that convention rather than mutating it in place — the
//! original source copies the tree first and mutates the copy for the same
//! reason: the caller's formula must come back unchanged.

use fnv::{FnvHashMap, FnvHashSet};

use crate::diag::Diag;
use crate::formula::Formula;
use crate::term::Term;

/// Strips everything but ASCII alphanumerics, prepends a filler letter if
/// what's left doesn't start with a letter (or is empty), then folds the
/// case of the first character to match TPTP's variable/functor convention.
fn legalize(name: &str, upper: bool) -> String {
    let mut filtered: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let needs_filler = match filtered.chars().next() {
        Some(c) => !c.is_ascii_alphabetic(),
        None => true,
    };
    if needs_filler {
        filtered.insert(0, if upper { 'S' } else { 's' });
    }
    let mut chars = filtered.chars();
    let first = chars.next().expect("filler guarantees at least one character");
    let folded_first = if upper { first.to_ascii_uppercase() } else { first.to_ascii_lowercase() };
    let mut out = String::new();
    out.push(folded_first);
    out.push_str(chars.as_str());
    out
}

fn quote_constant(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Assigns each distinct original name a stable, collision-free legal TPTP
/// identifier, reused everywhere that name recurs (a quantifier binder and
/// every bound occurrence of its variable must render identically).
#[derive(Default)]
struct Renamer {
    upper: FnvHashMap<String, String>,
    upper_used: FnvHashSet<String>,
    lower: FnvHashMap<String, String>,
    lower_used: FnvHashSet<String>,
}

impl Renamer {
    fn assign(table: &mut FnvHashMap<String, String>, used: &mut FnvHashSet<String>, name: &str, upper: bool) -> String {
        if let Some(existing) = table.get(name) {
            return existing.clone();
        }
        let base = legalize(name, upper);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while used.contains(&candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        used.insert(candidate.clone());
        table.insert(name.to_string(), candidate.clone());
        candidate
    }

    fn legal_upper(&mut self, name: &str) -> String {
        Self::assign(&mut self.upper, &mut self.upper_used, name, true)
    }

    fn legal_lower(&mut self, name: &str) -> String {
        Self::assign(&mut self.lower, &mut self.lower_used, name, false)
    }
}

fn tptp_term(term: &Term, bound_term_names: &FnvHashSet<String>, renamer: &mut Renamer) -> String {
    if term.is_constant() {
        if bound_term_names.contains(term.name()) {
            renamer.legal_upper(term.name())
        } else {
            quote_constant(term.name())
        }
    } else {
        let name = renamer.legal_lower(term.name());
        let args: Vec<String> = term.args().iter().map(|a| tptp_term(a, bound_term_names, renamer)).collect();
        format!("{}({})", name, args.join(","))
    }
}

fn tptp_formula(formula: &Formula, bound_term_names: &FnvHashSet<String>, renamer: &mut Renamer) -> String {
    match formula {
        Formula::Pred { name, args } => {
            let legal = renamer.legal_lower(name);
            if args.is_empty() {
                legal
            } else {
                let rendered: Vec<String> = args.iter().map(|a| tptp_term(a, bound_term_names, renamer)).collect();
                format!("{}({})", legal, rendered.join(","))
            }
        }
        Formula::Not(a) => format!("~({})", tptp_formula(a, bound_term_names, renamer)),
        Formula::And(l, r) => {
            format!("({} & {})", tptp_formula(l, bound_term_names, renamer), tptp_formula(r, bound_term_names, renamer))
        }
        Formula::Or(l, r) => {
            format!("({} | {})", tptp_formula(l, bound_term_names, renamer), tptp_formula(r, bound_term_names, renamer))
        }
        Formula::If(l, r) => {
            format!("({} => {})", tptp_formula(l, bound_term_names, renamer), tptp_formula(r, bound_term_names, renamer))
        }
        Formula::Iff(l, r) => {
            format!("({} <=> {})", tptp_formula(l, bound_term_names, renamer), tptp_formula(r, bound_term_names, renamer))
        }
        Formula::Forall(v, b) => {
            let legal = renamer.legal_upper(v);
            format!("(! [{}] : {})", legal, tptp_formula(b, bound_term_names, renamer))
        }
        Formula::Exists(v, b) => {
            let legal = renamer.legal_upper(v);
            format!("(? [{}] : {})", legal, tptp_formula(b, bound_term_names, renamer))
        }
    }
}

/// Renders `formula` as a TPTP `fof(name,type,...).` clause, `type` being
/// the caller-supplied TPTP formula role (`"axiom"`, `"conjecture"`, …).
/// `formula` must be first-order (`Formula::is_first_order`); propositional
/// formulas are a strict subset and always qualify, second-order formulas
/// never do.
pub fn to_first_order_tptp(name: &str, clause_type: &str, formula: &Formula) -> Result<String, Diag> {
    if !formula.is_first_order() {
        return Err(Diag::domain(format!(
            "'{name}' is not first-order: TPTP export requires no bound predicate or function variables"
        )));
    }
    let bound_term_names: FnvHashSet<String> =
        formula.bound_term_variables().iter().map(|(t, _)| t.name().to_string()).collect();
    let mut renamer = Renamer::default();
    let body = tptp_formula(formula, &bound_term_names, &mut renamer);
    let legal_name = legalize(name, false);
    Ok(format!("fof({legal_name},{clause_type},{body})."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legalize_prepends_filler_for_non_letter_start() {
        assert_eq!(legalize("1x", false), "s1x");
        assert_eq!(legalize("1x", true), "S1x");
    }

    #[test]
    fn legalize_strips_non_alphanumerics_and_folds_first_char() {
        assert_eq!(legalize("my-var", true), "Myvar");
    }

    #[test]
    fn renders_quantified_formula_with_bound_variable_and_free_constant() {
        let f = Formula::and(
            Formula::forall("x", Formula::pred("P", vec![Term::constant("x")])),
            Formula::pred("Q", vec![Term::constant("c")]),
        );
        let rendered = to_first_order_tptp("f1", "axiom", &f).unwrap();
        assert_eq!(rendered, "fof(f1,axiom,((! [X] : p(X)) & q(\"c\"))).");
    }

    #[test]
    fn clause_type_is_threaded_through_verbatim() {
        let f = Formula::prop("A");
        let rendered = to_first_order_tptp("goal", "conjecture", &f).unwrap();
        assert_eq!(rendered, "fof(goal,conjecture,a).");
    }

    #[test]
    fn rejects_second_order_formula() {
        let f = Formula::forall(
            "P",
            Formula::pred("P", vec![Term::constant("0")]),
        );
        let err = to_first_order_tptp("induction", "axiom", &f).unwrap_err();
        assert!(matches!(err, Diag::Domain { .. }));
    }

    #[test]
    fn distinct_names_legalizing_to_the_same_identifier_do_not_collide() {
        let f = Formula::and(
            Formula::pred("a-b", vec![]),
            Formula::pred("a_b", vec![]),
        );
        let rendered = to_first_order_tptp("dedup", "axiom", &f).unwrap();
        assert_eq!(rendered, "fof(dedup,axiom,(ab & ab2)).");
    }
}
