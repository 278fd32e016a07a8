//! End-to-end tests driving a whole proof graph from JSON through
//! `verify_all`, rather than constructing `ProofNode`s by hand as the
//! unit tests in `src/verify.rs` do.

use natded::diag::Diag;
use natded::graph::ProofGraph;

#[test]
fn or_elim_over_json_discharges_every_assumption_sharing_a_discharged_formula() {
    // A |- A via (or A A): OrIntro from a first A, then OrElim whose two
    // case-branches are themselves bare `A` assumptions (so each trivially
    // satisfies "has L/R as an assumption" against itself). Discharge is by
    // structural equality, not node identity, so every assumption with
    // formula A -- the disjunction's own premise included -- is excluded.
    let json = r#"{
        "nodes": [
            {"id": 1, "formula": "A", "justification": "Assumption"},
            {"id": 2, "formula": "(or A A)", "justification": "OrIntro"},
            {"id": 3, "formula": "A", "justification": "Assumption"},
            {"id": 4, "formula": "A", "justification": "Assumption"},
            {"id": 5, "formula": "A", "justification": "OrElim"}
        ],
        "links": [
            {"from": 1, "to": 2},
            {"from": 2, "to": 5},
            {"from": 3, "to": 5},
            {"from": 4, "to": 5}
        ]
    }"#;
    let graph = ProofGraph::from_json(json).unwrap();
    let results = graph.verify_all();
    assert_eq!(results.len(), 5);
    for (id, outcome) in &results {
        assert!(outcome.is_ok(), "node {id} failed: {outcome:?}");
    }
    let or_elim_assumptions = &results.iter().find(|(id, _)| *id == 4).unwrap().1;
    assert!(or_elim_assumptions.as_ref().unwrap().is_empty());
}

#[test]
fn premise_order_from_links_is_insertion_order_and_permutation_search_still_accepts() {
    // AndIntro's conjunction is (and A B); links list B's edge before A's,
    // so the graph hands verify premises in [B, A] order. The permutation
    // search inside `verify` must still find the [A, B] ordering.
    let json = r#"{
        "nodes": [
            {"id": 1, "formula": "A", "justification": "Assumption"},
            {"id": 2, "formula": "B", "justification": "Assumption"},
            {"id": 3, "formula": "(and A B)", "justification": "AndIntro"}
        ],
        "links": [
            {"from": 2, "to": 3},
            {"from": 1, "to": 3}
        ]
    }"#;
    let graph = ProofGraph::from_json(json).unwrap();
    assert_eq!(graph.node(2).parents, vec![1, 0]);
    let results = graph.verify_all();
    assert!(results.iter().all(|(_, outcome)| outcome.is_ok()));
}

#[test]
fn a_failing_node_does_not_block_verification_of_its_siblings() {
    let json = r#"{
        "nodes": [
            {"id": 1, "formula": "A", "justification": "Assumption"},
            {"id": 2, "formula": "B", "justification": "Assumption"},
            {"id": 3, "formula": "(and A C)", "justification": "AndIntro"},
            {"id": 4, "formula": "(and B B)", "justification": "AndIntro"}
        ],
        "links": [
            {"from": 1, "to": 3},
            {"from": 2, "to": 3},
            {"from": 2, "to": 4},
            {"from": 2, "to": 4}
        ]
    }"#;
    let graph = ProofGraph::from_json(json).unwrap();
    let results = graph.verify_all();
    let outcome_for = |id: usize| &results.iter().find(|(nid, _)| *nid == id).unwrap().1;
    assert!(outcome_for(0).is_ok());
    assert!(outcome_for(1).is_ok());
    assert!(outcome_for(2).is_err(), "(and A C) should fail: A's first premise is A but conjunct is C");
    assert!(outcome_for(3).is_ok(), "(and B B) from two B premises should succeed independently of its failing sibling");
}

#[test]
fn malformed_json_is_reported_as_a_syntax_diagnostic() {
    let err = ProofGraph::from_json("{not json").unwrap_err();
    assert!(matches!(err, Diag::Syntax { .. }));
}

#[test]
fn a_link_to_an_unknown_node_id_is_a_syntax_diagnostic() {
    let json = r#"{
        "nodes": [{"id": 1, "formula": "A", "justification": "Assumption"}],
        "links": [{"from": 1, "to": 99}]
    }"#;
    let err = ProofGraph::from_json(json).unwrap_err();
    assert!(matches!(err, Diag::Syntax { .. }));
}
