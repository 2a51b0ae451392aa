use std::iter::Peekable;

use crate::logic::{AgentId, Atom, BinaryOp, Formula, UnaryOp};

use super::{ParseErr, ParseResult, Token, TokenKind, Tokenizer};

pub fn parse_formula(formula: &str) -> ParseResult<Formula> {
    TemporalParser::parse(formula)
}

/// Recursive descent parser for epistemic temporal formulas.
///
/// Binding strength, from loosest to tightest: `W`, `U`, `->` (right
/// associative), `v`, `^`, then the prefix operators `~`, `k<i>`, `G`, `F`
/// and `N`.
pub struct TemporalParser<'t> {
    tokens: Peekable<Tokenizer<'t>>,
}

impl<'f> TemporalParser<'f> {
    pub fn parse(formula: &'f str) -> ParseResult<Formula> {
        let mut parser = Self {
            tokens: Tokenizer::new(formula).peekable(),
        };
        if parser.tokens.peek().is_none() {
            return Err(ParseErr::EmptyFormula);
        }
        let node = parser.parse_unless()?;
        match parser.tokens.peek() {
            None => Ok(*node),
            Some(Err(e)) => Err(e.clone()),
            Some(Ok(t)) => Err(ParseErr::Expected(
                "end of input".to_string(),
                format!("{} at position {}", t, t.src_pos),
            )),
        }
    }

    fn parse_unless(&mut self) -> ParseResult<Box<Formula>> {
        let mut stub = self.parse_until()?;

        while self.next_is(TokenKind::Unless) {
            self.bump()?;
            let right = self.parse_until()?;
            stub = Box::new(Formula::Binary(BinaryOp::Unless, stub, right));
        }

        Ok(stub)
    }

    fn parse_until(&mut self) -> ParseResult<Box<Formula>> {
        let mut stub = self.parse_impl()?;

        while self.next_is(TokenKind::Until) {
            self.bump()?;
            let right = self.parse_impl()?;
            stub = Box::new(Formula::Binary(BinaryOp::Until, stub, right));
        }

        Ok(stub)
    }

    fn parse_impl(&mut self) -> ParseResult<Box<Formula>> {
        let left = self.parse_or()?;

        if self.next_is(TokenKind::Impl) {
            self.bump()?;
            let right = self.parse_impl()?;
            Ok(Box::new(Formula::Binary(BinaryOp::Implication, left, right)))
        } else {
            Ok(left)
        }
    }

    fn parse_or(&mut self) -> ParseResult<Box<Formula>> {
        let mut stub = self.parse_and()?;

        while self.next_is(TokenKind::Or) {
            self.bump()?;
            let right = self.parse_and()?;
            stub = Box::new(Formula::Binary(BinaryOp::Disjunction, stub, right));
        }

        Ok(stub)
    }

    fn parse_and(&mut self) -> ParseResult<Box<Formula>> {
        let mut stub = self.parse_unary()?;

        while self.next_is(TokenKind::And) {
            self.bump()?;
            let right = self.parse_unary()?;
            stub = Box::new(Formula::Binary(BinaryOp::Conjunction, stub, right));
        }

        Ok(stub)
    }

    fn parse_unary(&mut self) -> ParseResult<Box<Formula>> {
        let op = match self.peek_kind() {
            Some(TokenKind::Not) => UnaryOp::Negation,
            Some(TokenKind::Always) => UnaryOp::Always,
            Some(TokenKind::Eventually) => UnaryOp::Eventually,
            Some(TokenKind::Next) => UnaryOp::Next,
            Some(TokenKind::Knowledge) => {
                let spelling = self.cur_token()?.spelling;
                UnaryOp::Knowledge(AgentId::new(&spelling[1..]))
            }
            _ => return self.parse_paren(),
        };
        self.bump()?;
        Ok(Box::new(Formula::Unary(op, self.parse_unary()?)))
    }

    fn parse_paren(&mut self) -> ParseResult<Box<Formula>> {
        if self.next_is(TokenKind::LParen) {
            self.bump()?;
            let exp = self.parse_unless()?;
            self.eat(TokenKind::RParen)?;
            Ok(exp)
        } else {
            self.parse_atom()
        }
    }

    fn parse_atom(&mut self) -> ParseResult<Box<Formula>> {
        let (kind, spelling) = {
            let t = self.cur_token()?;
            (t.kind, t.spelling)
        };

        let atom = match kind {
            TokenKind::True => Atom::True,
            TokenKind::False => Atom::False,
            TokenKind::Prop => Atom::Prop(spelling.to_string()),
            _ => {
                return Err(ParseErr::Expected(
                    "proposition or constant".to_string(),
                    self.got_msg(),
                ))
            }
        };
        self.bump()?;
        Ok(Box::new(Formula::Atom(atom)))
    }

    fn peek_kind(&mut self) -> Option<TokenKind> {
        match self.tokens.peek() {
            Some(Ok(Token { kind, .. })) => Some(*kind),
            _ => None,
        }
    }

    fn next_is(&mut self, expected: TokenKind) -> bool {
        self.peek_kind() == Some(expected)
    }

    fn bump(&mut self) -> ParseResult<()> {
        match self.tokens.next() {
            Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(e),
            None => Err(ParseErr::Expected(
                "token".to_string(),
                "end of input".to_string(),
            )),
        }
    }

    fn eat(&mut self, expected: TokenKind) -> ParseResult<()> {
        if self.next_is(expected) {
            self.bump()
        } else {
            Err(ParseErr::Expected(expected.to_string(), self.got_msg()))
        }
    }

    fn got_msg(&mut self) -> String {
        match self.tokens.peek() {
            Some(Ok(t)) => format!("{} at position {}", t, t.src_pos),
            Some(Err(e)) => e.to_string(),
            _ => "end of input".to_string(),
        }
    }

    fn cur_token(&mut self) -> ParseResult<&Token<'f>> {
        match self.tokens.peek() {
            Some(Ok(t)) => Ok(t),
            Some(Err(e)) => Err(e.clone()),
            _ => Err(ParseErr::Expected(
                "token".to_string(),
                "end of input".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_map {
        ($func:ident, $( $f:expr, $e:expr );*) => {{
            $(
                let f = $func($f).expect($f);
                assert_eq!($e, f.to_string());
            )*
        }};
    }

    macro_rules! test_list_invalid {
        ($func:ident, $( $f:expr ),*) => {{
            $(
                let res = $func($f);
                assert!(res.is_err(), "f: {}\nFormula: {:?}", $f, res);
            )*
        }};
    }

    #[test]
    fn atoms() {
        test_map!(
            parse_formula,
            "p0", "p0";
            "true", "true";
            "false", "false";
            "  t8 ", "t8";
            "(((q)))", "q"
        );
    }

    #[test]
    fn unary() {
        test_map!(
            parse_formula,
            "~~false", "~~false";
            "!p", "~p";
            "k1p0", "k1p0";
            "k1k2k3p4", "k1k2k3p4";
            "k p", "kp";
            "Nk1p0", "Nk1p0";
            "G F N ~r2", "GFN~r2";
            "~k1(p0 -> p9)", "~k1(p0 -> p9)"
        );
    }

    #[test]
    fn precedence() {
        test_map!(
            parse_formula,
            "p1 v p2 ^ p3", "(p1 v (p2 ^ p3))";
            "p1 & p2 | p3", "((p1 ^ p2) v p3)";
            "~p9 ^ p4 -> Fp3", "((~p9 ^ p4) -> Fp3)";
            "~p9 -> p4 -> Fp3", "(~p9 -> (p4 -> Fp3))";
            "~p9 ^ p4 U Fp3", "((~p9 ^ p4) U Fp3)";
            "p U q W r", "((p U q) W r)";
            "p W q U r", "(p W (q U r))";
            "p -> q U r", "((p -> q) U r)";
            "Gp ^ q", "(Gp ^ q)";
            "G(p ^ q)", "G(p ^ q)";
            "k3(k2p2v(r1->Gt3))", "k3(k2p2 v (r1 -> Gt3))"
        );
    }

    #[test]
    fn knowledge_agent() {
        let f = parse_formula("k12p").unwrap();
        assert_eq!(Some((&AgentId::new("12"), &Formula::prop("p"))), f.knowledge());
    }

    #[test]
    fn invalid() {
        test_list_invalid!(
            parse_formula,
            "",
            "   ",
            "->p",
            "p ^",
            "p q",
            "(p v q",
            "p v q)",
            "~",
            "k1",
            "p U U q",
            "a",
            "p ^ x"
        );
    }

    #[test]
    fn error_messages() {
        assert_eq!(Err(ParseErr::EmptyFormula), parse_formula(""));
        assert_eq!(
            Err(ParseErr::Expected(
                ")".to_string(),
                "end of input".to_string()
            )),
            parse_formula("(p v q")
        );
        assert_eq!(
            Err(ParseErr::Expected(
                "end of input".to_string(),
                "q at position 2".to_string()
            )),
            parse_formula("p q")
        );
        assert_eq!(Err(ParseErr::UnknownChar('x', 4)), parse_formula("p ^ x"));
    }
}
