use std::cmp::Ordering;

use crate::logic::{BinaryOp, Formula};

use super::transformer::FormulaTransformer;

/// Reorders the operands of every conjunction and disjunction so that
/// formulas equal up to commutativity become identical trees.
pub fn canonical_order(formula: &Formula) -> Formula {
    CanonicalOrder.transform(formula)
}

/// Total order on canonical operands: conjunctions and disjunctions first, then
/// the remaining binary formulas, then unary formulas, then atoms. Operands of
/// the same kind are compared by their rendered form.
pub fn canonical_cmp(a: &Formula, b: &Formula) -> Ordering {
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.to_string().cmp(&b.to_string()))
}

fn rank(f: &Formula) -> u8 {
    match f {
        Formula::Binary(op, _, _) if op.is_commutative() => 0,
        Formula::Binary(..) => 1,
        Formula::Unary(..) => 2,
        Formula::Atom(_) => 3,
    }
}

struct CanonicalOrder;

impl CanonicalOrder {
    fn ordered(&mut self, op: BinaryOp, left: &Formula, right: &Formula) -> Formula {
        let left = self.transform(left);
        let right = self.transform(right);
        if canonical_cmp(&left, &right) == Ordering::Greater {
            Formula::Binary(op, right.into(), left.into())
        } else {
            Formula::Binary(op, left.into(), right.into())
        }
    }
}

impl FormulaTransformer for CanonicalOrder {
    fn transform_and(&mut self, left: &Formula, right: &Formula) -> Formula {
        self.ordered(BinaryOp::Conjunction, left, right)
    }

    fn transform_or(&mut self, left: &Formula, right: &Formula) -> Formula {
        self.ordered(BinaryOp::Disjunction, left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_formula;

    fn order(s: &str) -> String {
        canonical_order(&parse_formula(s).unwrap()).to_string()
    }

    #[test]
    fn atoms() {
        assert_eq!("(p0 ^ p1)", order("p1 ^ p0"));
        assert_eq!("(p0 v p1)", order("p0 v p1"));
        assert_eq!("(false v true)", order("true v false"));
    }

    #[test]
    fn kinds() {
        assert_eq!("(~p5 ^ p9)", order("p9 ^ ~p5"));
        assert_eq!("((p3 ^ p4) v ~p3)", order("~p3 v (p4 ^ p3)"));
        assert_eq!("((p U q) ^ Gr)", order("Gr ^ (p U q)"));
        assert_eq!("((p0 v q) ^ (p U q))", order("(p U q) ^ (q v p0)"));
    }

    #[test]
    fn nested() {
        assert_eq!(
            "((p0 ^ q0) v (p2 ^ p3))",
            order("(p3 ^ p2) v (p0 ^ q0)")
        );
        assert_eq!(
            order("(p3 ^ p2) v (p0 ^ q0)"),
            order("(q0 ^ p0) v (p2 ^ p3)")
        );
        assert_eq!("G(k1(p v q) ^ q)", order("G(q ^ k1(q v p))"));
    }

    #[test]
    fn non_commutative_untouched() {
        assert_eq!("(q U p)", order("q U p"));
        assert_eq!("(q W (p ^ r))", order("q W (r ^ p)"));
    }

    #[test]
    fn idempotent() {
        let test_strs = [
            "(p3 ^ p2) v (p0 ^ q0)",
            "~p3 v (p4 ^ p3)",
            "k3(k2p2 v (Gt3 v r1))",
            "(NFp ^ ~p) v (q U r)",
        ];

        for s in test_strs {
            let once = canonical_order(&parse_formula(s).unwrap());
            assert_eq!(once, canonical_order(&once));
        }
    }
}
