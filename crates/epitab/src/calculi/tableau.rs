use std::collections::HashSet;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::{Limit, Mode, Params, TableauErr, TableauResult};
use crate::calculus::{Calculus, CloseMsg};
use crate::logic::{canonicalize, BinaryOp, Formula, UnaryOp};
use crate::parse::parse_formula_list;
use crate::tamper_protect::{seal, ProtectedState};

/// A branch formula together with the rules already applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedFormula {
    formula: Formula,
    alpha_visited: bool,
    beta_visited: bool,
    sub_complete_visited: bool,
}

impl TaggedFormula {
    pub fn new(formula: Formula) -> Self {
        Self {
            formula,
            alpha_visited: false,
            beta_visited: false,
            sub_complete_visited: false,
        }
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn is_saturated(&self) -> bool {
        self.alpha_visited && self.beta_visited && self.sub_complete_visited
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    formulae: Vec<TaggedFormula>,
    #[serde(skip)]
    modified: bool,
}

impl Branch {
    /// Creates a branch from `formulas`, keeping the first occurrence of duplicates.
    pub fn new<I: IntoIterator<Item = Formula>>(formulas: I) -> Self {
        let mut b = Self {
            formulae: vec![],
            modified: true,
        };
        for f in formulas {
            b.append(f);
        }
        b
    }

    pub fn formulae(&self) -> impl Iterator<Item = &Formula> {
        self.formulae.iter().map(TaggedFormula::formula)
    }

    pub fn tagged(&self) -> &[TaggedFormula] {
        &self.formulae
    }

    pub fn len(&self) -> usize {
        self.formulae.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulae.is_empty()
    }

    pub fn contains(&self, f: &Formula) -> bool {
        self.formulae.iter().any(|t| t.formula == *f)
    }

    /// Returns `true` iff the branch contains neither `false` nor a literal
    /// together with its negation.
    pub fn is_proper(&self) -> bool {
        let mut positive = HashSet::new();
        let mut negative = HashSet::new();

        for t in self.formulae.iter().rev() {
            let f = &t.formula;
            if f.is_false() {
                return false;
            }
            if f.is_literal() {
                if negative.contains(f) {
                    return false;
                }
                positive.insert(f);
            } else if let Some(lit) = f.negated_literal() {
                if positive.contains(lit) {
                    return false;
                }
                negative.insert(lit);
            }
        }

        true
    }

    pub fn is_saturated(&self) -> bool {
        self.formulae.iter().all(TaggedFormula::is_saturated)
    }

    fn clashes_with(&self, f: &Formula) -> bool {
        if f.is_false() {
            return true;
        }
        if f.is_literal() {
            return self
                .formulae
                .iter()
                .any(|t| t.formula.negated_literal() == Some(f));
        }
        match f.negated_literal() {
            Some(lit) => self.contains(lit),
            None => false,
        }
    }

    /// Appends `f` unless already present.
    /// Returns `false` iff the branch became improper.
    fn append(&mut self, f: Formula) -> bool {
        if self.contains(&f) {
            return true;
        }
        let clash = self.clashes_with(&f);
        self.formulae.push(TaggedFormula::new(f));
        self.modified = true;
        !clash
    }

    fn expand_alpha(&mut self, mode: Mode) -> bool {
        let mut i = 0;
        while i < self.formulae.len() {
            if !self.formulae[i].alpha_visited {
                self.formulae[i].alpha_visited = true;
                for f in alpha_consequences(&self.formulae[i].formula, mode) {
                    if !self.append(f) {
                        return false;
                    }
                }
            }
            i += 1;
        }
        true
    }

    /// Applies every pending beta rule. The second alternative of each split
    /// goes to a copy pushed onto `split`, the first one stays here.
    fn expand_beta(&mut self, split: &mut Vec<Branch>) -> bool {
        self.modified = false;

        let mut i = 0;
        while i < self.formulae.len() {
            if !self.formulae[i].beta_visited {
                self.formulae[i].beta_visited = true;
                if let Some((first, second)) = beta_alternatives(&self.formulae[i].formula) {
                    if !self.contains(&first) && !self.contains(&second) {
                        let mut copy = self.clone();
                        if copy.append(second) {
                            split.push(copy);
                        } else {
                            trace!("discarding improper beta alternative");
                        }
                        if !self.append(first) {
                            return false;
                        }
                    }
                }
            }
            i += 1;
        }
        true
    }

    /// Decides every same-agent knowledge subformula below a positive
    /// knowledge formula. The negative choice goes to copies in `split`.
    fn complete_subformulas(&mut self, split: &mut Vec<Branch>) {
        let mut i = 0;
        while i < self.formulae.len() {
            if !self.formulae[i].sub_complete_visited {
                self.formulae[i].sub_complete_visited = true;

                let candidates: Vec<Formula> = match self.formulae[i].formula.knowledge() {
                    Some((agent, body)) => body
                        .subformulas()
                        .into_iter()
                        .filter(|s| matches!(s.knowledge(), Some((a, _)) if a == agent))
                        .cloned()
                        .collect(),
                    None => vec![],
                };

                for s in candidates {
                    let neg = Formula::not(s.clone());
                    if self.contains(&s) || self.contains(&neg) {
                        continue;
                    }
                    let mut copy = self.clone();
                    // the copy still has to decide the remaining candidates
                    copy.formulae[i].sub_complete_visited = false;
                    if copy.append(neg) {
                        split.push(copy);
                    }
                    // a clash here leaves the branch for the next properness check
                    self.append(s);
                }
            }
            i += 1;
        }
    }
}

fn alpha_consequences(f: &Formula, mode: Mode) -> Vec<Formula> {
    match f {
        Formula::Binary(BinaryOp::Conjunction, l, r) => vec![(**l).clone(), (**r).clone()],
        Formula::Unary(UnaryOp::Always, c) => vec![(**c).clone(), Formula::next(f.clone())],
        Formula::Unary(UnaryOp::Knowledge(_), c) if mode.is_knowledge() => vec![(**c).clone()],
        _ => vec![],
    }
}

fn beta_alternatives(f: &Formula) -> Option<(Formula, Formula)> {
    match f {
        Formula::Binary(BinaryOp::Disjunction, l, r) => Some(((**l).clone(), (**r).clone())),
        Formula::Unary(UnaryOp::Eventually, c) => {
            let postpone = Formula::and(Formula::not((**c).clone()), Formula::next(f.clone()));
            Some(((**c).clone(), canonicalize(&postpone)))
        }
        Formula::Binary(BinaryOp::Until | BinaryOp::Unless, l, r) => {
            let hold = Formula::and(Formula::not((**r).clone()), (**l).clone());
            let postpone = Formula::and(hold, Formula::next(f.clone()));
            Some(((**r).clone(), canonicalize(&postpone)))
        }
        _ => None,
    }
}

#[derive(Debug)]
struct BranchSet {
    branches: Vec<Branch>,
    modified: bool,
    params: Params,
}

impl BranchSet {
    fn new(formulas: &[Formula], params: Params) -> TableauResult<Self> {
        let root = Branch::new(formulas.iter().cloned());
        if !root.is_proper() {
            trace!("initial branch is improper");
            return Err(TableauErr::Unsatisfiable);
        }
        Ok(Self {
            branches: vec![root],
            modified: true,
            params,
        })
    }

    fn apply_alpha_rules(&mut self) {
        let mode = self.params.mode;
        let mut b = 0;
        while b < self.branches.len() {
            let branch = &mut self.branches[b];
            let before = branch.len();
            let proper = branch.expand_alpha(mode);
            if branch.len() != before {
                self.modified = true;
            }
            if proper {
                b += 1;
            } else {
                trace!("alpha rules closed branch {b}");
                self.branches.remove(b);
            }
        }
    }

    fn apply_beta_rules(&mut self) -> TableauResult<()> {
        let mut b = 0;
        while b < self.branches.len() {
            if !self.branches[b].modified {
                b += 1;
                continue;
            }

            let mut split = vec![];
            let branch = &mut self.branches[b];
            let before = branch.len();
            let proper = branch.expand_beta(&mut split);
            if branch.len() != before || !split.is_empty() {
                self.modified = true;
            }

            self.branches.extend(split);
            if proper {
                b += 1;
            } else {
                trace!("beta rules closed branch {b}");
                self.branches.remove(b);
            }
            self.check_budget()?;
        }
        Ok(())
    }

    fn complete_subformulas(&mut self) -> TableauResult<()> {
        let mut b = 0;
        while b < self.branches.len() {
            let mut split = vec![];
            let branch = &mut self.branches[b];
            let before = branch.len();
            branch.complete_subformulas(&mut split);
            if branch.len() != before || !split.is_empty() {
                self.modified = true;
            }

            self.branches.extend(split);
            if self.branches[b].is_proper() {
                b += 1;
            } else {
                self.branches.remove(b);
            }
            self.check_budget()?;
        }
        Ok(())
    }

    fn check_budget(&self) -> TableauResult<()> {
        let max = self.params.budget.max_branches;
        if self.branches.len() > max {
            debug!("tableau exceeded {max} branches");
            return Err(TableauErr::BudgetExceeded(Limit::Branches, max));
        }
        Ok(())
    }
}

/// Saturates the given set of canonical formulas and returns every open
/// branch. Fails with [`TableauErr::Unsatisfiable`] if all branches close.
pub fn build_tableau(formulas: &[Formula], params: &Params) -> TableauResult<Vec<Branch>> {
    let mut set = BranchSet::new(formulas, *params)?;

    let mut rounds = 0;
    while set.modified {
        set.modified = false;
        set.apply_alpha_rules();
        set.apply_beta_rules()?;
        set.complete_subformulas()?;
        rounds += 1;
    }
    debug_assert!(set.branches.iter().all(Branch::is_saturated));

    let mut branches: Vec<Branch> = vec![];
    for b in set.branches {
        let duplicate = branches
            .iter()
            .any(|o| o.len() == b.len() && b.formulae().all(|f| o.contains(f)));
        if !duplicate {
            branches.push(b);
        }
    }
    debug!(
        "tableau over {} formulas: {} open branches after {rounds} rounds",
        formulas.len(),
        branches.len()
    );

    if branches.is_empty() {
        Err(TableauErr::Unsatisfiable)
    } else {
        Ok(branches)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableauState {
    formulae: Vec<Formula>,
    mode: Mode,
    branches: Vec<Branch>,
    seal: String,
}

impl ProtectedState for TableauState {
    fn compute_seal_info(&self) -> String {
        let formulae = self
            .formulae
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let branches = self
            .branches
            .iter()
            .map(|b| {
                b.formulae()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("|");
        format!(
            "pc-tableau|{}|{}|[{}]",
            self.mode.to_string().to_uppercase(),
            formulae,
            branches
        )
    }
}

impl TableauState {
    pub fn new(formulae: Vec<Formula>, mode: Mode, branches: Vec<Branch>) -> Self {
        let mut state = Self {
            formulae,
            mode,
            branches,
            seal: String::new(),
        };
        state.seal = seal(state.compute_seal_info());
        state
    }

    pub fn formulae(&self) -> &[Formula] {
        &self.formulae
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn seal(&self) -> &str {
        &self.seal
    }
}

/// The propositional-completion tableau without pseudo-model construction.
pub struct PcTableau<'f> {
    _f: &'f str,
}

impl<'f> Calculus<'f> for PcTableau<'f> {
    type Params = Params;
    type State = TableauState;
    type Error = TableauErr;

    fn parse_formula(formula: &'f str, params: Option<Self::Params>) -> TableauResult<Self::State> {
        let params = params.unwrap_or_default();
        let formulae: Vec<Formula> = parse_formula_list(formula)?
            .iter()
            .map(canonicalize)
            .collect();

        let branches = match build_tableau(&formulae, &params) {
            Ok(branches) => branches,
            Err(TableauErr::Unsatisfiable) => vec![],
            Err(e) => return Err(e),
        };
        Ok(TableauState::new(formulae, params.mode, branches))
    }

    fn validate(state: Self::State) -> bool {
        state.verify_seal(&state.seal)
    }

    fn check_close(state: Self::State) -> CloseMsg {
        if state.branches.is_empty() {
            CloseMsg {
                closed: true,
                msg: "The tableau is closed, the formula set is unsatisfiable".to_string(),
            }
        } else {
            CloseMsg {
                closed: false,
                msg: format!("The tableau has {} open branches", state.branches.len()),
            }
        }
    }
}
