use crate::logic::{Atom, BinaryOp, Formula, UnaryOp};

use super::{remove_impls::remove_implications, transformer::FormulaTransformer};

/// Pushes every negation down to the atoms and knowledge applications.
///
/// Implications are eliminated first. A negated knowledge application stays a
/// literal; only its operand is normalized.
pub fn negation_normal_form(formula: &Formula) -> Formula {
    NegationNormalForm.transform(&remove_implications(formula))
}

struct NegationNormalForm;

impl NegationNormalForm {
    fn negate(&mut self, formula: &Formula) -> Formula {
        self.transform_not(formula)
    }
}

impl FormulaTransformer for NegationNormalForm {
    fn transform_not(&mut self, child: &Formula) -> Formula {
        match child {
            Formula::Atom(Atom::True) => Formula::ff(),
            Formula::Atom(Atom::False) => Formula::tt(),
            Formula::Atom(a) => Formula::not(Formula::Atom(a.clone())),
            Formula::Unary(UnaryOp::Negation, c) => self.transform(c),
            Formula::Unary(UnaryOp::Always, c) => Formula::eventually(self.negate(c)),
            Formula::Unary(UnaryOp::Eventually, c) => Formula::always(self.negate(c)),
            Formula::Unary(UnaryOp::Next, c) => Formula::next(self.negate(c)),
            Formula::Unary(UnaryOp::Knowledge(agent), c) => {
                Formula::not(Formula::knows(agent.clone(), self.transform(c)))
            }
            Formula::Binary(BinaryOp::Conjunction, l, r) => {
                Formula::or(self.negate(l), self.negate(r))
            }
            Formula::Binary(BinaryOp::Disjunction, l, r) => {
                Formula::and(self.negate(l), self.negate(r))
            }
            // ~(φ U ψ) == ~ψ W (~φ ^ ~ψ)
            Formula::Binary(BinaryOp::Until, l, r) => {
                let both = Formula::and(self.negate(l), self.negate(r));
                Formula::unless(self.negate(r), both)
            }
            // ~(φ W ψ) == ~ψ U (~φ ^ ~ψ)
            Formula::Binary(BinaryOp::Unless, l, r) => {
                let both = Formula::and(self.negate(l), self.negate(r));
                Formula::until(self.negate(r), both)
            }
            Formula::Binary(BinaryOp::Implication, _, _) => {
                unreachable!("implication encountered during negation normal form transformation")
            }
        }
    }

    fn transform_impl(&mut self, _left: &Formula, _right: &Formula) -> Formula {
        unreachable!("implication encountered during negation normal form transformation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_formula;

    fn nnf(s: &str) -> String {
        negation_normal_form(&parse_formula(s).unwrap()).to_string()
    }

    #[test]
    fn atoms() {
        assert_eq!("p0", nnf("p0"));
        assert_eq!("~p0", nnf("~p0"));
        assert_eq!("p0", nnf("~~p0"));
        assert_eq!("false", nnf("~~false"));
        assert_eq!("true", nnf("~false"));
        assert_eq!("false", nnf("~true"));
    }

    #[test]
    fn de_morgan() {
        assert_eq!("(~p0 v ~p1)", nnf("~(p0 ^ p1)"));
        assert_eq!("(~p0 ^ ~p1)", nnf("~(p0 v p1)"));
        assert_eq!("(p9 ^ ~p4)", nnf("~(~p9 v p4)"));
        assert_eq!("((p0 v ~q) ^ ~r)", nnf("~((~p0 ^ q) v r)"));
    }

    #[test]
    fn temporal_duals() {
        assert_eq!("F~p0", nnf("~Gp0"));
        assert_eq!("G~p0", nnf("~Fp0"));
        assert_eq!("N~p0", nnf("~Np0"));
        assert_eq!("FNG~p", nnf("~GN Fp"));
        assert_eq!("(~q5 W (~p1 ^ ~q5))", nnf("~(p1 U q5)"));
        assert_eq!("(~q U (~p ^ ~q))", nnf("~(p W q)"));
    }

    #[test]
    fn knowledge_is_terminal() {
        assert_eq!("~k1p0", nnf("~k1p0"));
        assert_eq!("~k1(~p0 v p1)", nnf("~k1~(p0 ^ ~p1)"));
        assert_eq!("k1k2p0", nnf("~~k1k2p0"));
        assert_eq!("F~k1p0", nnf("~Gk1p0"));
    }

    #[test]
    fn implications() {
        assert_eq!("(p0 ^ ~p1)", nnf("~(p0 -> p1)"));
        assert_eq!("(~p3 v (~p4 v Fp3))", nnf("~~p3 -> (p4 -> Fp3)"));
        assert_eq!("G(~p9 v p0)", nnf("G(p9 -> p0)"));
    }

    #[test]
    fn no_negated_compound() {
        let test_strs = [
            "~(p0 -> (q U ~Gr))",
            "~k3(k2p2 v (r1 -> Gt3))",
            "~(~(~~p9 v p4) v Fp2)",
            "~N(p W ~(q ^ Fr))",
        ];

        for s in test_strs {
            let f = negation_normal_form(&parse_formula(s).unwrap());
            for sub in f.subformulas() {
                if let Formula::Unary(UnaryOp::Negation, c) = sub {
                    assert!(c.is_literal(), "{sub} in {f} is not in negation normal form");
                }
                assert!(!matches!(
                    sub,
                    Formula::Binary(BinaryOp::Implication, _, _)
                ));
            }
        }
    }
}
