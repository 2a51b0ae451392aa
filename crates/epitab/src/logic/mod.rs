pub mod transform;

use std::{collections::BTreeSet, fmt};

pub use transform::canonicalize;

/// Identifier of an agent, i.e. the digit string following a `k`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(String);

impl AgentId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atom {
    Prop(String),
    True,
    False,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnaryOp {
    Negation,
    Always,
    Eventually,
    Next,
    Knowledge(AgentId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinaryOp {
    Conjunction,
    Disjunction,
    Implication,
    Until,
    Unless,
}

impl BinaryOp {
    pub fn is_commutative(self) -> bool {
        matches!(self, BinaryOp::Conjunction | BinaryOp::Disjunction)
    }

    fn spelling(self) -> &'static str {
        match self {
            BinaryOp::Conjunction => "^",
            BinaryOp::Disjunction => "v",
            BinaryOp::Implication => "->",
            BinaryOp::Until => "U",
            BinaryOp::Unless => "W",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Formula {
    Atom(Atom),
    Unary(UnaryOp, Box<Formula>),
    Binary(BinaryOp, Box<Formula>, Box<Formula>),
}

impl Formula {
    pub fn prop<S: Into<String>>(name: S) -> Self {
        Formula::Atom(Atom::Prop(name.into()))
    }

    pub fn tt() -> Self {
        Formula::Atom(Atom::True)
    }

    pub fn ff() -> Self {
        Formula::Atom(Atom::False)
    }

    pub fn not(f: Formula) -> Self {
        Formula::Unary(UnaryOp::Negation, f.into())
    }

    pub fn always(f: Formula) -> Self {
        Formula::Unary(UnaryOp::Always, f.into())
    }

    pub fn eventually(f: Formula) -> Self {
        Formula::Unary(UnaryOp::Eventually, f.into())
    }

    pub fn next(f: Formula) -> Self {
        Formula::Unary(UnaryOp::Next, f.into())
    }

    pub fn knows(agent: AgentId, f: Formula) -> Self {
        Formula::Unary(UnaryOp::Knowledge(agent), f.into())
    }

    pub fn and(l: Formula, r: Formula) -> Self {
        Formula::Binary(BinaryOp::Conjunction, l.into(), r.into())
    }

    pub fn or(l: Formula, r: Formula) -> Self {
        Formula::Binary(BinaryOp::Disjunction, l.into(), r.into())
    }

    pub fn implies(l: Formula, r: Formula) -> Self {
        Formula::Binary(BinaryOp::Implication, l.into(), r.into())
    }

    pub fn until(l: Formula, r: Formula) -> Self {
        Formula::Binary(BinaryOp::Until, l.into(), r.into())
    }

    pub fn unless(l: Formula, r: Formula) -> Self {
        Formula::Binary(BinaryOp::Unless, l.into(), r.into())
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Formula::Atom(Atom::False))
    }

    /// Knowledge application `k_i φ`.
    pub fn knowledge(&self) -> Option<(&AgentId, &Formula)> {
        match self {
            Formula::Unary(UnaryOp::Knowledge(a), c) => Some((a, &**c)),
            _ => None,
        }
    }

    /// Negated knowledge application `¬k_i φ`.
    pub fn negated_knowledge(&self) -> Option<(&AgentId, &Formula)> {
        match self {
            Formula::Unary(UnaryOp::Negation, c) => c.knowledge(),
            _ => None,
        }
    }

    pub fn is_knowledge(&self) -> bool {
        self.knowledge().is_some()
    }

    /// Literals are atoms and knowledge applications; these are the formulas
    /// that can clash with their negation on a branch.
    pub fn is_literal(&self) -> bool {
        matches!(self, Formula::Atom(_)) || self.is_knowledge()
    }

    /// The literal wrapped by a negation, if this is a negated literal.
    pub fn negated_literal(&self) -> Option<&Formula> {
        match self {
            Formula::Unary(UnaryOp::Negation, c) if c.is_literal() => Some(&**c),
            _ => None,
        }
    }

    pub fn next_operand(&self) -> Option<&Formula> {
        match self {
            Formula::Unary(UnaryOp::Next, c) => Some(&**c),
            _ => None,
        }
    }

    /// The formula that fulfils this eventuality: `φ` for `Fφ`, `ψ` for `φ U ψ`.
    pub fn eventuality_target(&self) -> Option<&Formula> {
        match self {
            Formula::Unary(UnaryOp::Eventually, c) => Some(&**c),
            Formula::Binary(BinaryOp::Until, _, r) => Some(&**r),
            _ => None,
        }
    }

    /// Pre-order sequence of all subformulas, starting with `self`.
    pub fn subformulas(&self) -> Vec<&Formula> {
        let mut subs = vec![];
        let mut stack = vec![self];
        while let Some(f) = stack.pop() {
            subs.push(f);
            match f {
                Formula::Atom(_) => {}
                Formula::Unary(_, c) => stack.push(&**c),
                Formula::Binary(_, l, r) => {
                    stack.push(&**r);
                    stack.push(&**l);
                }
            }
        }
        subs
    }

    /// Number of symbols (atoms and operators), ignoring parentheses.
    pub fn symbol_count(&self) -> usize {
        match self {
            Formula::Atom(_) => 1,
            Formula::Unary(_, c) => 1 + c.symbol_count(),
            Formula::Binary(_, l, r) => 1 + l.symbol_count() + r.symbol_count(),
        }
    }

    pub fn agents(&self) -> BTreeSet<AgentId> {
        self.subformulas()
            .into_iter()
            .filter_map(|f| f.knowledge().map(|(a, _)| a.clone()))
            .collect()
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Prop(name) => f.write_str(name),
            Atom::True => f.write_str("true"),
            Atom::False => f.write_str("false"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Negation => f.write_str("~"),
            UnaryOp::Always => f.write_str("G"),
            UnaryOp::Eventually => f.write_str("F"),
            UnaryOp::Next => f.write_str("N"),
            UnaryOp::Knowledge(a) => write!(f, "k{a}"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Atom(a) => write!(f, "{a}"),
            Formula::Unary(op, c) => write!(f, "{op}{c}"),
            Formula::Binary(op, l, r) => write!(f, "({l} {op} {r})"),
        }
    }
}

mod serde {
    use super::{AgentId, Formula};
    use crate::parse::parse_formula;
    use ::serde::de::{Deserializer, Error, Visitor};
    use ::serde::{Deserialize, Serialize, Serializer};
    use std::fmt;

    struct FormulaVisitor;

    impl<'a> Visitor<'a> for FormulaVisitor {
        type Value = Formula;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a formula")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            parse_formula(v).map_err(E::custom)
        }
    }

    impl Serialize for Formula {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Formula {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_str(FormulaVisitor)
        }
    }

    impl Serialize for AgentId {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(self.as_str())
        }
    }

    impl<'de> Deserialize<'de> for AgentId {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            if s.chars().all(|c| c.is_ascii_digit()) {
                Ok(AgentId::new(s))
            } else {
                Err(D::Error::custom(format!("invalid agent id '{s}'")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_formula;

    fn p(n: &str) -> Formula {
        Formula::prop(n)
    }

    #[test]
    fn display() {
        let f = Formula::or(
            Formula::not(p("p0")),
            Formula::knows(AgentId::new("1"), Formula::always(p("q1"))),
        );
        assert_eq!("(~p0 v k1Gq1)", f.to_string());

        let f = Formula::until(Formula::tt(), Formula::next(Formula::ff()));
        assert_eq!("(true U Nfalse)", f.to_string());
    }

    #[test]
    fn display_reparses() {
        let test_strs = [
            "p0",
            "~~false",
            "k1k2p0",
            "(p0 v ~Np3)",
            "k3(k2p2 v (r1 -> Gt3))",
            "((~p9 ^ p4) U Fp3)",
            "(p0 W (q1 ^ k p2))",
        ];

        for s in test_strs {
            let f = parse_formula(s).unwrap();
            assert_eq!(f, parse_formula(&f.to_string()).unwrap());
        }
    }

    #[test]
    fn subformulas_pre_order() {
        let f = parse_formula("(p0 ^ ~q1) U k1p2").unwrap();
        let subs: Vec<String> = f.subformulas().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            vec![
                "((p0 ^ ~q1) U k1p2)",
                "(p0 ^ ~q1)",
                "p0",
                "~q1",
                "q1",
                "k1p2",
                "p2"
            ],
            subs
        );
    }

    #[test]
    fn symbol_count() {
        assert_eq!(1, parse_formula("true").unwrap().symbol_count());
        assert_eq!(2, parse_formula("~p0").unwrap().symbol_count());
        assert_eq!(3, parse_formula("p0 ^ p1").unwrap().symbol_count());
        assert_eq!(5, parse_formula("k3(k2p2 v r1)").unwrap().symbol_count());
    }

    #[test]
    fn literals() {
        let k = parse_formula("k1p0").unwrap();
        let nk = parse_formula("~k1p0").unwrap();
        let nn = parse_formula("~Np0").unwrap();

        assert!(k.is_literal());
        assert!(p("q").is_literal());
        assert_eq!(Some(&k), nk.negated_literal());
        assert_eq!(None, nn.negated_literal());
        assert_eq!(
            Some((&AgentId::new("1"), &p("p0"))),
            nk.negated_knowledge()
        );
    }

    #[test]
    fn agents() {
        let f = parse_formula("k1p0 ^ ~k2(k1q v k3r)").unwrap();
        let agents = f.agents();
        let agents: Vec<&str> = agents.iter().map(AgentId::as_str).collect();
        assert_eq!(vec!["1", "2", "3"], agents);
    }

    #[test]
    fn serde_roundtrip() {
        let f = parse_formula("k1(p0 -> Fq)").unwrap();
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!("\"k1(p0 -> Fq)\"", json);
        let back: Formula = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }
}
