//! `Term` stores a constant, variable, function, or function-variable node.
//!
//! There is no representational distinction between a variable and a
//! constant, or between a function and a function variable: a term with no
//! arguments is a *constant*, a term with one or more arguments is a
//! *function application*, and whether either is actually bound to a
//! quantifier is a property of the enclosing [`crate::formula::Formula`],
//! not of the term itself.

use fnv::FnvHashSet;

/// A single node of a term tree: an identifier plus an ordered list of
/// argument sub-terms. Every node exclusively owns its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    name: String,
    args: Vec<Term>,
}

impl Term {
    /// Builds a constant (or term variable) term with no arguments.
    #[must_use]
    pub fn constant(name: impl Into<String>) -> Self {
        Term {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Builds a function application (or function variable) term.
    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Term>) -> Self {
        Term {
            name: name.into(),
            args,
        }
    }

    /// The identifier at this node.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered argument list; empty iff this term is a constant.
    #[must_use]
    pub fn args(&self) -> &[Term] {
        &self.args
    }

    /// True iff this term has no arguments.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.args.is_empty()
    }

    /// Deep clone. Equivalent to `self.clone()`, kept as a named operation
    /// since owned trees are conventionally cloned through an explicit
    /// `copy()` rather than relying on callers to know `Clone` suffices.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Immediate children of arity 0, left to right.
    #[must_use]
    pub fn subconstants(&self) -> Vec<&Term> {
        self.args.iter().filter(|a| a.is_constant()).collect()
    }

    /// All descendants (not including self) of arity 0, left-to-right
    /// pre-order.
    #[must_use]
    pub fn all_subconstants(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        for arg in &self.args {
            if arg.is_constant() {
                out.push(arg);
            } else {
                out.extend(arg.all_subconstants());
            }
        }
        out
    }

    /// `[self]` if self is a constant, else `all_subconstants()`.
    #[must_use]
    pub fn all_constants(&self) -> Vec<&Term> {
        if self.is_constant() {
            vec![self]
        } else {
            self.all_subconstants()
        }
    }

    /// All descendants (not including self) of arity >= 1, pre-order.
    #[must_use]
    pub fn all_subfunctions(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        for arg in &self.args {
            if !arg.is_constant() {
                out.push(arg);
            }
            out.extend(arg.all_subfunctions());
        }
        out
    }

    /// `self` (if arity >= 1) followed by `all_subfunctions()`.
    #[must_use]
    pub fn all_functions(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        if !self.is_constant() {
            out.push(self);
        }
        out.extend(self.all_subfunctions());
        out
    }

    /// 1 for a leaf; 1 + max(child depth) otherwise.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.args.iter().map(Term::depth).max().unwrap_or(0)
    }

    /// The set of every name occurring in the tree, including this node's.
    #[must_use]
    pub fn identifiers(&self) -> FnvHashSet<String> {
        let mut out = FnvHashSet::default();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers(&self, out: &mut FnvHashSet<String>) {
        out.insert(self.name.clone());
        for arg in &self.args {
            arg.collect_identifiers(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(n: &str, args: Vec<Term>) -> Term {
        Term::function(n, args)
    }
    fn c(n: &str) -> Term {
        Term::constant(n)
    }

    #[test]
    fn constant_has_no_args_and_depth_one() {
        let x = c("x");
        assert!(x.is_constant());
        assert_eq!(x.depth(), 1);
        assert!(x.subconstants().is_empty());
        assert_eq!(x.all_constants(), vec![&x]);
    }

    #[test]
    fn subconstants_are_immediate_zero_arity_children_left_to_right() {
        let t = f("f", vec![c("z"), f("g", vec![c("x")]), f("h", vec![c("x"), c("y")]), c("y")]);
        let names: Vec<&str> = t.subconstants().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["z", "y"]);
    }

    #[test]
    fn all_subconstants_is_pre_order_over_descendants() {
        let t = f("f", vec![c("z"), f("g", vec![c("x")]), f("h", vec![c("x"), c("y")]), c("y")]);
        let names: Vec<&str> = t.all_subconstants().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["z", "x", "x", "y", "y"]);
    }

    #[test]
    fn all_subfunctions_excludes_top_level() {
        let t = f(
            "f",
            vec![c("z"), f("g", vec![c("x")]), f("h", vec![c("x"), f("i", vec![c("y")])]), c("y")],
        );
        let names: Vec<&str> = t.all_subfunctions().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["g", "h", "i"]);
    }

    #[test]
    fn all_functions_includes_top_level_first() {
        let t = f(
            "f",
            vec![c("z"), f("g", vec![c("x")]), f("h", vec![c("x"), f("i", vec![c("y")])]), c("y")],
        );
        let names: Vec<&str> = t.all_functions().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["f", "g", "h", "i"]);
    }

    #[test]
    fn structural_equality_is_by_name_and_args() {
        let a = f("f", vec![c("x"), c("y")]);
        let b = f("f", vec![c("x"), c("y")]);
        let d = f("f", vec![c("x"), c("z")]);
        assert_eq!(a, b);
        assert_ne!(a, d);
    }

    #[test]
    fn copy_is_structurally_equal_and_independently_owned() {
        let t = f("f", vec![c("x")]);
        let mut cp = t.copy();
        assert_eq!(t, cp);
        cp.args.push(c("y"));
        assert_ne!(t, cp);
    }

    #[test]
    fn identifiers_includes_self_and_all_descendants() {
        let t = f("f", vec![c("x"), f("g", vec![c("y")])]);
        let ids = t.identifiers();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("f") && ids.contains("x") && ids.contains("g") && ids.contains("y"));
    }
}
