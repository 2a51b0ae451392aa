pub mod canonical_order;
pub mod negation_normal;
pub mod remove_impls;
pub mod transformer;

pub use canonical_order::{canonical_cmp, canonical_order};
pub use negation_normal::negation_normal_form;
pub use remove_impls::remove_implications;

use super::Formula;

/// Implication elimination, negation normal form and canonical operand order.
///
/// Every formula handed to the tableau passes through here. Duplicate and clash
/// detection downstream compare the results structurally.
pub fn canonicalize(formula: &Formula) -> Formula {
    canonical_order(&negation_normal_form(formula))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{BinaryOp, UnaryOp};
    use crate::parse::parse_formula;

    fn canon(s: &str) -> Formula {
        canonicalize(&parse_formula(s).unwrap())
    }

    const FORMULAS: [&str; 12] = [
        "p0",
        "~~false",
        "p1 ^ (p2 ^ p3)",
        "~~p1 U q5",
        "p0 v ~Np3",
        "Gk2p3 -> true",
        "p9 -> k1Gp9",
        "~p3 -> (p4 -> Fp3)",
        "~(~~p9 v p4) v Fp2",
        "k3(k2p2 v (r1 -> Gt3))",
        "~(p W (q -> ~Fr))",
        "~k1(p ^ ~k1q) ^ N~(p U q)",
    ];

    #[test]
    fn idempotent() {
        for s in FORMULAS {
            let once = canon(s);
            assert_eq!(once, canonicalize(&once), "{s}");
        }
    }

    #[test]
    fn normal_form_invariant() {
        for s in FORMULAS {
            let f = canon(s);
            for sub in f.subformulas() {
                match sub {
                    Formula::Binary(BinaryOp::Implication, _, _) => {
                        panic!("implication left in {f}")
                    }
                    Formula::Unary(UnaryOp::Negation, c) => {
                        assert!(c.is_literal(), "negated compound {sub} in {f}")
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn commutative() {
        assert_eq!(canon("p ^ q"), canon("q ^ p"));
        assert_eq!(canon("p v q"), canon("q v p"));
        assert_eq!(canon("G(k1(p ^ q) v Nr)"), canon("G(Nr v k1(q ^ p))"));
        assert_eq!(canon("~(p ^ q)"), canon("~(q ^ p)"));
        assert_eq!(canon("(p -> q) ^ r"), canon("r ^ (q v ~p)"));
    }

    #[test]
    fn rendered() {
        assert_eq!("((Fp3 v ~p4) v ~p3)", canon("~~p3 -> (p4 -> Fp3)").to_string());
        assert_eq!("(NFp ^ ~p)", canon("~p ^ N Fp").to_string());
    }
}
