use crate::logic::{AgentId, Atom, BinaryOp, Formula, UnaryOp};

/// Rebuilds a formula bottom-up. Every method defaults to reconstructing the
/// node it visits from its transformed children, so a rewrite only overrides
/// the operators it cares about.
pub trait FormulaTransformer {
    fn transform(&mut self, formula: &Formula) -> Formula {
        match formula {
            Formula::Atom(a) => self.transform_atom(a),
            Formula::Unary(UnaryOp::Negation, c) => self.transform_not(c),
            Formula::Unary(UnaryOp::Always, c) => self.transform_always(c),
            Formula::Unary(UnaryOp::Eventually, c) => self.transform_eventually(c),
            Formula::Unary(UnaryOp::Next, c) => self.transform_next(c),
            Formula::Unary(UnaryOp::Knowledge(agent), c) => self.transform_knowledge(agent, c),
            Formula::Binary(BinaryOp::Conjunction, l, r) => self.transform_and(l, r),
            Formula::Binary(BinaryOp::Disjunction, l, r) => self.transform_or(l, r),
            Formula::Binary(BinaryOp::Implication, l, r) => self.transform_impl(l, r),
            Formula::Binary(BinaryOp::Until, l, r) => self.transform_until(l, r),
            Formula::Binary(BinaryOp::Unless, l, r) => self.transform_unless(l, r),
        }
    }

    fn transform_atom(&mut self, atom: &Atom) -> Formula {
        Formula::Atom(atom.clone())
    }

    fn transform_not(&mut self, child: &Formula) -> Formula {
        Formula::not(self.transform(child))
    }

    fn transform_always(&mut self, child: &Formula) -> Formula {
        Formula::always(self.transform(child))
    }

    fn transform_eventually(&mut self, child: &Formula) -> Formula {
        Formula::eventually(self.transform(child))
    }

    fn transform_next(&mut self, child: &Formula) -> Formula {
        Formula::next(self.transform(child))
    }

    fn transform_knowledge(&mut self, agent: &AgentId, child: &Formula) -> Formula {
        Formula::knows(agent.clone(), self.transform(child))
    }

    fn transform_and(&mut self, left: &Formula, right: &Formula) -> Formula {
        Formula::and(self.transform(left), self.transform(right))
    }

    fn transform_or(&mut self, left: &Formula, right: &Formula) -> Formula {
        Formula::or(self.transform(left), self.transform(right))
    }

    fn transform_impl(&mut self, left: &Formula, right: &Formula) -> Formula {
        Formula::implies(self.transform(left), self.transform(right))
    }

    fn transform_until(&mut self, left: &Formula, right: &Formula) -> Formula {
        Formula::until(self.transform(left), self.transform(right))
    }

    fn transform_unless(&mut self, left: &Formula, right: &Formula) -> Formula {
        Formula::unless(self.transform(left), self.transform(right))
    }
}
