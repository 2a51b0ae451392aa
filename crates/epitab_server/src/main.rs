use actix_web::{middleware, web, App, HttpResponse, HttpServer, Responder};

use serde::Deserialize;

mod formula;
mod tableau;

#[derive(Deserialize)]
struct ParseForm {
    formula: String,
    params: Option<String>,
    #[serde(rename = "perLine", default)]
    per_line: bool,
}

#[derive(Deserialize)]
struct StateForm {
    state: String,
}

#[derive(Deserialize)]
struct FormulaForm {
    formula: String,
}

async fn index() -> impl Responder {
    HttpResponse::Ok().body(
        "Epitab API Server

Available calculus endpoints:
pc-tableau
tableau",
    )
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let addr = std::env::var("EPITAB_ADDR").unwrap_or_else(|_| "127.0.0.1:7000".to_string());
    log::info!("listening on {addr}");

    HttpServer::new(|| {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*")))
            .route("/", web::get().to(index))
            .route("/parse", web::post().to(formula::parse))
            // Propositionally complete tableau
            .route("/pc-tableau", web::get().to(tableau::pc))
            .route("/pc-tableau/parse", web::post().to(tableau::pc_parse))
            .route("/pc-tableau/validate", web::post().to(tableau::pc_validate))
            .route("/pc-tableau/close", web::post().to(tableau::pc_close))
            // Tableau with pseudo-model construction
            .route("/tableau", web::get().to(tableau::graph))
            .route("/tableau/parse", web::post().to(tableau::graph_parse))
            .route("/tableau/validate", web::post().to(tableau::graph_validate))
            .route("/tableau/close", web::post().to(tableau::graph_close))
    })
    .bind(addr)?
    .run()
    .await
}
