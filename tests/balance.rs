//! Tests for the linear volume-balance coefficients.

use lakefill::balance::{BalanceTerms, Coeff};

#[test]
fn scalar_and_per_node_mix() {
    // Cell areas 1, 3, 5, 7.
    let terms = BalanceTerms {
        c: Coeff::Scalar(-3.0),
        k: Coeff::PerNode(vec![0.0, 1.0, 2.0, 3.0]),
    };
    let (c, k) = terms.at_node(0, 1.0);
    assert!((c - -3.0).abs() < 1e-12);
    assert!(k.abs() < 1e-12);

    let terms = BalanceTerms {
        c: Coeff::PerNode(vec![0.0, -1.0, -2.0, -3.0]),
        k: Coeff::Scalar(2.0),
    };
    let (c, k) = terms.at_node(3, 7.0);
    assert!((c - -21.0).abs() < 1e-12);
    assert!((k - 14.0).abs() < 1e-12);
}

#[test]
fn none_is_zero_everywhere() {
    let terms = BalanceTerms::none();
    for node in 0..4 {
        let (c, k) = terms.at_node(node, 100.0);
        assert_eq!(c, 0.0);
        assert_eq!(k, 0.0);
    }
    assert_eq!(BalanceTerms::default(), terms);
}
