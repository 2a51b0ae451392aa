use actix_web::{error, web, HttpResponse, Responder, Result};
use epitab::calculi::graph::{GraphState, GraphTableau};
use epitab::calculi::tableau::{PcTableau, TableauState};
use epitab::{formula_lines, Calculus, Params, TableauErr};

use crate::{ParseForm, StateForm};

/// Runs `parse` on each formula line separately. Errors keep their line number.
fn parse_per_line<'f, S>(
    formula: &'f str,
    parse: impl Fn(&'f str) -> Result<S, TableauErr>,
) -> Result<Vec<S>, TableauErr> {
    formula_lines(formula)
        .map(|(n, f)| parse(f).map_err(|e| e.at_line(n)))
        .collect()
}

fn params(params: Option<String>) -> Result<Option<Params>> {
    Ok(match params {
        Some(p) => Some(serde_json::from_str(&p)?),
        None => None,
    })
}

pub(crate) async fn pc() -> impl Responder {
    HttpResponse::Ok().body(
        "Calculus pc-tableau loaded.
Interact via the /parse /close and /validate endpoints"
            .to_string(),
    )
}

pub(crate) async fn pc_parse(form: web::Form<ParseForm>) -> Result<HttpResponse> {
    let ParseForm {
        formula,
        params: p,
        per_line,
    } = form.0;
    let p = params(p)?;

    if per_line {
        let states = parse_per_line(&formula, |f| PcTableau::parse_formula(f, p))
            .map_err(error::ErrorBadRequest)?;
        return Ok(HttpResponse::Ok().json(states));
    }

    let state = PcTableau::parse_formula(&formula, p).map_err(error::ErrorBadRequest)?;

    Ok(HttpResponse::Ok().json(state))
}

pub(crate) async fn pc_validate(form: web::Form<StateForm>) -> Result<HttpResponse> {
    let StateForm { state } = form.0;

    let state: TableauState = serde_json::from_str(&state)?;
    let res = PcTableau::validate(state);

    Ok(HttpResponse::Ok().json(res))
}

pub(crate) async fn pc_close(form: web::Form<StateForm>) -> Result<HttpResponse> {
    let StateForm { state } = form.0;

    let state: TableauState = serde_json::from_str(&state)?;
    let res = PcTableau::check_close(state);

    Ok(HttpResponse::Ok().json(res))
}

pub(crate) async fn graph() -> impl Responder {
    HttpResponse::Ok().body(
        "Calculus tableau loaded.
Interact via the /parse /close and /validate endpoints"
            .to_string(),
    )
}

pub(crate) async fn graph_parse(form: web::Form<ParseForm>) -> Result<HttpResponse> {
    let ParseForm {
        formula,
        params: p,
        per_line,
    } = form.0;
    let p = params(p)?;

    if per_line {
        let states = parse_per_line(&formula, |f| GraphTableau::parse_formula(f, p))
            .map_err(error::ErrorBadRequest)?;
        return Ok(HttpResponse::Ok().json(states));
    }

    let state = GraphTableau::parse_formula(&formula, p).map_err(error::ErrorBadRequest)?;

    Ok(HttpResponse::Ok().json(state))
}

pub(crate) async fn graph_validate(form: web::Form<StateForm>) -> Result<HttpResponse> {
    let StateForm { state } = form.0;

    let state: GraphState = serde_json::from_str(&state)?;
    let res = GraphTableau::validate(state);

    Ok(HttpResponse::Ok().json(res))
}

pub(crate) async fn graph_close(form: web::Form<StateForm>) -> Result<HttpResponse> {
    let StateForm { state } = form.0;

    let state: GraphState = serde_json::from_str(&state)?;
    let res = GraphTableau::check_close(state);

    Ok(HttpResponse::Ok().json(res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use epitab::parse::ParseErr;

    #[test]
    fn per_line_states() {
        let states =
            parse_per_line("# intro\np\n\np ^ ~p\n", |f| PcTableau::parse_formula(f, None))
                .unwrap();
        assert_eq!(2, states.len());
        assert_eq!(1, states[0].branches().len());
        assert!(states[1].branches().is_empty());
    }

    #[test]
    fn per_line_error_line() {
        let err = parse_per_line("p\n# fine\n(q", |f| GraphTableau::parse_formula(f, None))
            .unwrap_err();
        match err {
            TableauErr::Parse(ParseErr::Line(3, _)) => {}
            _ => panic!("expected error on line 3, got {err:?}"),
        }
    }
}
