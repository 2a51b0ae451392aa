pub mod calculi;
pub mod calculus;
mod consts;
pub mod logic;
pub mod parse;
pub mod tamper_protect;

pub use calculi::graph::{build_graph, Graph, GraphTableau, Label};
pub use calculi::tableau::{build_tableau, Branch, PcTableau};
pub use calculi::{CalculusKind, Mode, Params, TableauErr};
pub use calculus::Calculus;
pub use logic::{canonicalize, AgentId, Formula};
pub use parse::{formula_lines, parse_formula, parse_formula_list};
