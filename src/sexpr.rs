//! Hand-rolled tokenizer, recursive-descent parser, and renderer for the
//! S-expression surface syntax. No parser-combinator crate: the grammar is
//! small enough (atoms, parenthesized lists, one level of list nesting per
//! connective) that a direct recursive descent reads more plainly than
//! pulling in a combinator library for it.
//!
//! Connective keywords are lowercase on both the parse and render side:
//! `not`, `and`, `or`, `if`, `iff`, `forall`, `exists`. A head matching one
//! of these keywords only dispatches to the connective's construction when
//! the list's member count also matches that connective's arity; a head
//! that matches by name but not by arity (`(and A)`) falls through to a
//! predicate, exactly like a head that doesn't match any keyword at all.

use crate::diag::Diag;
use crate::formula::Formula;
use crate::term::Term;

/// A parsed S-expression, before it is interpreted as a `Formula` or `Term`.
/// Carries the 1-based line/column of its opening token for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
enum SExpr {
    Atom { value: String, line: usize, column: usize },
    List { items: Vec<SExpr>, line: usize, column: usize },
}

impl SExpr {
    fn position(&self) -> (usize, usize) {
        match self {
            SExpr::Atom { line, column, .. } => (*line, *column),
            SExpr::List { line, column, .. } => (*line, *column),
        }
    }
}

fn line_col(input: &str, byte_offset: usize) -> (usize, usize) {
    let consumed = &input.as_bytes()[..byte_offset.min(input.len())];
    let line = bytecount::count(consumed, b'\n') + 1;
    let column = match consumed.iter().rposition(|&b| b == b'\n') {
        Some(pos) => byte_offset - pos,
        None => byte_offset + 1,
    };
    (line, column)
}

// Tokenizer -------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
enum TokenKind {
    LParen,
    RParen,
    Atom(String),
}

struct Token {
    kind: TokenKind,
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, Diag> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, offset: i });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, offset: i });
                i += 1;
            }
            '"' => {
                let start = i;
                i += 1;
                let content_start = i;
                while i < bytes.len() && bytes[i] as char != '"' {
                    i += 1;
                }
                if i >= bytes.len() {
                    let (line, column) = line_col(input, start);
                    return Err(Diag::syntax("unterminated quoted atom", line, column));
                }
                let value = input[content_start..i].to_string();
                tokens.push(Token { kind: TokenKind::Atom(value), offset: start });
                i += 1;
            }
            _ => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                        break;
                    }
                    i += 1;
                }
                tokens.push(Token { kind: TokenKind::Atom(input[start..i].to_string()), offset: start });
            }
        }
    }
    Ok(tokens)
}

// Parser ------------------------------------------------------------------------

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn error_at_end(&self, message: &str) -> Diag {
        let offset = self.tokens.last().map_or(0, |t| t.offset + 1);
        let (line, column) = line_col(self.input, offset.max(self.input.len()));
        Diag::syntax(message, line, column)
    }

    fn parse_sexpr(&mut self) -> Result<SExpr, Diag> {
        match self.peek() {
            None => Err(self.error_at_end("unexpected end of input")),
            Some(Token { kind: TokenKind::RParen, offset }) => {
                let (line, column) = line_col(self.input, *offset);
                Err(Diag::syntax("unexpected ')'", line, column))
            }
            Some(Token { kind: TokenKind::Atom(value), offset }) => {
                let (line, column) = line_col(self.input, *offset);
                let value = value.clone();
                self.pos += 1;
                Ok(SExpr::Atom { value, line, column })
            }
            Some(Token { kind: TokenKind::LParen, offset }) => {
                let (line, column) = line_col(self.input, *offset);
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    match self.peek() {
                        None => return Err(self.error_at_end("unterminated list, expected ')'")),
                        Some(Token { kind: TokenKind::RParen, .. }) => {
                            self.pos += 1;
                            break;
                        }
                        _ => items.push(self.parse_sexpr()?),
                    }
                }
                Ok(SExpr::List { items, line, column })
            }
        }
    }
}

fn parse_single(input: &str) -> Result<SExpr, Diag> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(Diag::syntax("empty input", 1, 1));
    }
    let mut parser = Parser { input, tokens: &tokens, pos: 0 };
    let expr = parser.parse_sexpr()?;
    if parser.pos != tokens.len() {
        let (line, column) = line_col(input, tokens[parser.pos].offset);
        return Err(Diag::syntax("unexpected trailing input", line, column));
    }
    Ok(expr)
}

// SExpr -> Term / Formula ---------------------------------------------------------

fn head_name(expr: &SExpr) -> Result<&str, Diag> {
    match expr {
        SExpr::Atom { value, .. } => Ok(value.as_str()),
        SExpr::List { line, column, .. } => {
            Err(Diag::syntax("expected an identifier in head position, not a list", *line, *column))
        }
    }
}

fn sexpr_to_term(expr: &SExpr) -> Result<Term, Diag> {
    match expr {
        SExpr::Atom { value, .. } => Ok(Term::constant(value.clone())),
        SExpr::List { items, line, column } => {
            if items.is_empty() {
                return Err(Diag::syntax("a term cannot be an empty list", *line, *column));
            }
            let name = head_name(&items[0])?.to_string();
            let args = items[1..].iter().map(sexpr_to_term).collect::<Result<Vec<_>, _>>()?;
            Ok(Term::function(name, args))
        }
    }
}

const UNARY_CONNECTIVES: &[&str] = &["not"];
const BINARY_CONNECTIVES: &[&str] = &["and", "or", "if", "iff"];
const QUANTIFIERS: &[&str] = &["forall", "exists"];

/// A connective head only gets its special construction when the member
/// count matches that connective's expected arity; otherwise it falls
/// through and is treated as an ordinary predicate name (spec.md §4.C step
/// 5: "If `head` names a connective AND the list's member count matches
/// that connective's expected arity"). `(and A)` is therefore
/// `Pred("and", [Const "A"])`, not a syntax error.
fn sexpr_to_formula(expr: &SExpr) -> Result<Formula, Diag> {
    match expr {
        SExpr::Atom { value, .. } => Ok(Formula::prop(value.clone())),
        SExpr::List { items, line, column } => {
            if items.is_empty() {
                return Err(Diag::syntax("a formula cannot be an empty list", *line, *column));
            }
            let head = head_name(&items[0])?.to_string();
            let rest = &items[1..];

            if UNARY_CONNECTIVES.contains(&head.as_str()) && rest.len() == 1 {
                return Ok(Formula::not(sexpr_to_formula(&rest[0])?));
            }

            if BINARY_CONNECTIVES.contains(&head.as_str()) && rest.len() == 2 {
                let left = sexpr_to_formula(&rest[0])?;
                let right = sexpr_to_formula(&rest[1])?;
                return Ok(match head.as_str() {
                    "and" => Formula::and(left, right),
                    "or" => Formula::or(left, right),
                    "if" => Formula::implies(left, right),
                    "iff" => Formula::iff(left, right),
                    _ => unreachable!("head was checked against BINARY_CONNECTIVES"),
                });
            }

            if QUANTIFIERS.contains(&head.as_str()) && rest.len() == 2 {
                let var = match &rest[0] {
                    SExpr::Atom { value, .. } => value.clone(),
                    SExpr::List { line, column, .. } => {
                        return Err(Diag::syntax(
                            "lists of quantifier variables are unsupported, expected a single identifier",
                            *line,
                            *column,
                        ))
                    }
                };
                let body = sexpr_to_formula(&rest[1])?;
                return Ok(match head.as_str() {
                    "forall" => Formula::forall(var, body),
                    "exists" => Formula::exists(var, body),
                    _ => unreachable!("head was checked against QUANTIFIERS"),
                });
            }

            let args = rest.iter().map(sexpr_to_term).collect::<Result<Vec<_>, _>>()?;
            Ok(Formula::pred(head, args))
        }
    }
}

// Public API ----------------------------------------------------------------------

/// Parses a single formula from its S-expression surface syntax.
pub fn parse_formula(input: &str) -> Result<Formula, Diag> {
    let expr = parse_single(input)?;
    sexpr_to_formula(&expr)
}

/// Parses a single term from its S-expression surface syntax.
pub fn parse_term(input: &str) -> Result<Term, Diag> {
    let expr = parse_single(input)?;
    sexpr_to_term(&expr)
}

/// Renders a term back to S-expression surface syntax.
#[must_use]
pub fn render_term(term: &Term) -> String {
    if term.is_constant() {
        term.name().to_string()
    } else {
        let args: Vec<String> = term.args().iter().map(render_term).collect();
        format!("({} {})", term.name(), args.join(" "))
    }
}

/// Renders a formula back to S-expression surface syntax, using lowercase
/// connective keywords.
#[must_use]
pub fn render(formula: &Formula) -> String {
    match formula {
        Formula::Pred { name, args } => {
            if args.is_empty() {
                name.clone()
            } else {
                let rendered: Vec<String> = args.iter().map(render_term).collect();
                format!("({} {})", name, rendered.join(" "))
            }
        }
        Formula::Not(a) => format!("(not {})", render(a)),
        Formula::And(l, r) => format!("(and {} {})", render(l), render(r)),
        Formula::Or(l, r) => format!("(or {} {})", render(l), render(r)),
        Formula::If(l, r) => format!("(if {} {})", render(l), render(r)),
        Formula::Iff(l, r) => format!("(iff {} {})", render(l), render(r)),
        Formula::Forall(v, b) => format!("(forall {} {})", v, render(b)),
        Formula::Exists(v, b) => format!("(exists {} {})", v, render(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_proposition() {
        let f = parse_formula("A").unwrap();
        assert_eq!(f, Formula::prop("A"));
    }

    #[test]
    fn parses_predicate_with_term_args() {
        let f = parse_formula("(eq (S 1) 2)").unwrap();
        assert_eq!(
            f,
            Formula::pred("eq", vec![Term::function("S", vec![Term::constant("1")]), Term::constant("2")])
        );
    }

    #[test]
    fn parses_nested_quantifiers() {
        let f = parse_formula("(exists x (forall y (eq x y)))").unwrap();
        assert_eq!(
            f,
            Formula::exists("x", Formula::forall("y", Formula::pred("eq", vec![Term::constant("x"), Term::constant("y")])))
        );
    }

    #[test]
    fn render_round_trips_on_connective_keywords() {
        let source = "(iff (not A) (and B C))";
        let f = parse_formula(source).unwrap();
        assert_eq!(render(&f), source);
    }

    #[test]
    fn wrong_arity_connective_head_falls_through_to_a_predicate() {
        let f = parse_formula("(and A)").unwrap();
        assert_eq!(f, Formula::pred("and", vec![Term::constant("A")]));
    }

    #[test]
    fn rejects_list_as_quantifier_variable() {
        let err = parse_formula("(forall (x y) (eq x y))").unwrap_err();
        assert!(matches!(err, Diag::Syntax { .. }));
    }

    #[test]
    fn rejects_unbalanced_parens() {
        let err = parse_formula("(and A B").unwrap_err();
        assert!(matches!(err, Diag::Syntax { .. }));
    }

    #[test]
    fn quoted_atoms_may_contain_reserved_characters() {
        let t = parse_term("\"a constant with spaces\"").unwrap();
        assert_eq!(t, Term::constant("a constant with spaces"));
    }
}
