use std::convert::TryFrom;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_BRANCHES, MAX_NODES};
use crate::parse::ParseErr;

pub mod graph;
pub mod tableau;

pub enum CalculusKind {
    PcTableau,
    Tableau,
}

impl fmt::Display for CalculusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CalculusKind::PcTableau => "pc-tableau",
                CalculusKind::Tableau => "tableau",
            }
        )
    }
}

impl<'a> TryFrom<&'a str> for CalculusKind {
    type Error = &'static str;

    fn try_from(s: &'a str) -> Result<Self, Self::Error> {
        match s {
            "pc-tableau" => Ok(CalculusKind::PcTableau),
            "tableau" => Ok(CalculusKind::Tableau),
            _ => Err("Unknown calculus"),
        }
    }
}

pub type TableauResult<T> = Result<T, TableauErr>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Branches,
    Nodes,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Branches => write!(f, "branches"),
            Limit::Nodes => write!(f, "states"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableauErr {
    Parse(ParseErr),
    Unsatisfiable,
    BudgetExceeded(Limit, usize),
}

impl From<ParseErr> for TableauErr {
    fn from(e: ParseErr) -> Self {
        TableauErr::Parse(e)
    }
}

impl TableauErr {
    /// Attributes a parse error to the 1-based `line` of a formula list.
    pub fn at_line(self, line: usize) -> TableauErr {
        match self {
            TableauErr::Parse(e) => TableauErr::Parse(e.at_line(line)),
            e => e,
        }
    }
}

impl fmt::Display for TableauErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableauErr::Parse(e) => fmt::Display::fmt(e, f),
            TableauErr::Unsatisfiable => write!(f, "The formula set is unsatisfiable"),
            TableauErr::BudgetExceeded(limit, max) => {
                write!(f, "Construction exceeded the limit of {max} {limit}")
            }
        }
    }
}

/// Selects the epistemic logic: S5 knowledge (reflexive) or KD45 belief.
#[derive(Debug, Default, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    #[serde(rename = "KNOWLEDGE")]
    Knowledge,
    #[serde(rename = "BELIEF")]
    Belief,
}

impl Mode {
    pub fn is_knowledge(&self) -> bool {
        matches!(self, Mode::Knowledge)
    }

    pub fn is_belief(&self) -> bool {
        matches!(self, Mode::Belief)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Knowledge => "S5+PLTL",
            Mode::Belief => "KD45+PLTL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Budget {
    pub max_branches: usize,
    pub max_nodes: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Budget {
            max_branches: MAX_BRANCHES,
            max_nodes: MAX_NODES,
        }
    }
}

#[derive(Debug, Default, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub mode: Mode,
    pub budget: Budget,
}

impl Params {
    pub fn knowledge() -> Self {
        Params::default()
    }

    pub fn belief() -> Self {
        Params {
            mode: Mode::Belief,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_from_json() {
        let p: Params = serde_json::from_str(r#"{"mode": "BELIEF"}"#).unwrap();
        assert_eq!(Params::belief(), p);

        let p: Params =
            serde_json::from_str(r#"{"budget": {"maxBranches": 12, "maxNodes": 3}}"#).unwrap();
        assert_eq!(Mode::Knowledge, p.mode);
        assert_eq!(12, p.budget.max_branches);
        assert_eq!(3, p.budget.max_nodes);

        let p: Params = serde_json::from_str(r#"{"budget": {"maxNodes": 3}}"#).unwrap();
        assert_eq!(MAX_BRANCHES, p.budget.max_branches);

        assert!(serde_json::from_str::<Params>(r#"{"mode": "S4"}"#).is_err());
    }

    #[test]
    fn calculus_kind() {
        for name in ["pc-tableau", "tableau"] {
            let kind = CalculusKind::try_from(name).unwrap();
            assert_eq!(name, kind.to_string());
        }
        assert!(CalculusKind::try_from("prop-tableaux").is_err());
    }

    #[test]
    fn err_at_line() {
        let e = TableauErr::from(ParseErr::EmptyFormula.at_line(1)).at_line(4);
        assert_eq!(
            TableauErr::Parse(ParseErr::Line(4, Box::new(ParseErr::EmptyFormula))),
            e
        );
        assert_eq!(TableauErr::Unsatisfiable, TableauErr::Unsatisfiable.at_line(4));
    }

    #[test]
    fn err_display() {
        assert_eq!(
            "Construction exceeded the limit of 10 branches",
            TableauErr::BudgetExceeded(Limit::Branches, 10).to_string()
        );
        assert_eq!(
            "Expected a formula but got an empty input",
            TableauErr::from(ParseErr::EmptyFormula).to_string()
        );
    }
}
