//! JSON binding for the bracket engine. Every body is the `{success, message, data?}` envelope.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT,
//! BRACKET_MAX_TX_ATTEMPTS, BRACKET_CONSOLATION.

use actix_web::{
    get, post,
    http::StatusCode,
    web::{Data, Json, Path},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use elimination_bracket::{
    AllowAll, ApiResponse, BracketId, BracketService, BuildBracketRequest, Caller, EngineConfig,
    EngineResult, ErrorCode, LogNotifier, MatchId, MemoryStore, ReportResultRequest, ServerConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type AppState = Data<BracketService>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Path segment: bracket id (e.g. /api/brackets/{id})
#[derive(Deserialize)]
struct BracketPath {
    id: BracketId,
}

/// Path segments: bracket id and match id.
#[derive(Deserialize)]
struct MatchPath {
    id: BracketId,
    match_id: MatchId,
}

/// Identity is established upstream and forwarded in this header.
fn caller(req: &HttpRequest) -> Caller {
    let id = req
        .headers()
        .get("x-caller-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous");
    Caller::new(id)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::FailedPrecondition => StatusCode::CONFLICT,
        ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: EngineResult<T>, message: &str) -> HttpResponse {
    let body = ApiResponse::from_result(result, message);
    let status = body.code.map_or(StatusCode::OK, status_for);
    HttpResponse::build(status).json(body)
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "elimination-bracket",
    })
}

/// Seed participants and create the whole bracket (once per id).
#[post("/api/brackets")]
async fn api_build_bracket(state: AppState, req: HttpRequest, body: Json<BuildBracketRequest>) -> HttpResponse {
    respond(
        state.build_bracket(&caller(&req), body.into_inner()),
        "Bracket built",
    )
}

/// Bracket with all of its matches.
#[get("/api/brackets/{id}")]
async fn api_get_bracket(state: AppState, path: Path<BracketPath>) -> HttpResponse {
    respond(state.get_bracket(path.id), "Bracket loaded")
}

/// Report the winner of one match; advances the bracket.
#[post("/api/brackets/{id}/matches/{match_id}/result")]
async fn api_report_result(
    state: AppState,
    req: HttpRequest,
    path: Path<MatchPath>,
    body: Json<ReportResultRequest>,
) -> HttpResponse {
    respond(
        state.report_result(&caller(&req), path.id, path.match_id, body.into_inner()),
        "Result recorded",
    )
}

/// Whether every match is resolved, with standings once it is.
#[get("/api/brackets/{id}/completion")]
async fn api_check_completion(state: AppState, path: Path<BracketPath>) -> HttpResponse {
    respond(state.check_completion(path.id), "Completion checked")
}

/// Commit standings for a resolved bracket (retry after a failed post-result commit).
#[post("/api/brackets/{id}/completion")]
async fn api_commit_ranking(state: AppState, req: HttpRequest, path: Path<BracketPath>) -> HttpResponse {
    respond(state.commit_ranking(&caller(&req), path.id), "Standings committed")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let server = ServerConfig::from_env();
    let engine = EngineConfig::from_env();
    log::info!(
        "Starting server at http://{}:{} ({} tx attempts, consolation by default: {})",
        server.host,
        server.port,
        engine.max_transaction_attempts,
        engine.default_consolation
    );

    let state = Data::new(BracketService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(AllowAll),
        Arc::new(LogNotifier),
        engine,
    ));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_build_bracket)
            .service(api_get_bracket)
            .service(api_report_result)
            .service(api_check_completion)
            .service(api_commit_ranking)
    })
    .bind((server.host.as_str(), server.port))?
    .run()
    .await
}
