use std::collections::BTreeSet;

use actix_web::{error, web, HttpResponse, Result};
use epitab::logic::transform::negation_normal_form;
use epitab::{canonicalize, parse_formula, AgentId, Formula};
use serde::Serialize;

use crate::FormulaForm;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormulaInfo {
    formula: Formula,
    nnf: Formula,
    canonical: Formula,
    symbol_count: usize,
    agents: BTreeSet<AgentId>,
}

pub(crate) async fn parse(form: web::Form<FormulaForm>) -> Result<HttpResponse> {
    let FormulaForm { formula } = form.0;

    let formula = parse_formula(&formula).map_err(error::ErrorBadRequest)?;
    let canonical = canonicalize(&formula);
    let info = FormulaInfo {
        nnf: negation_normal_form(&formula),
        symbol_count: canonical.symbol_count(),
        agents: formula.agents(),
        canonical,
        formula,
    };

    Ok(HttpResponse::Ok().json(info))
}
