use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use strip_packer::types::{Demand, Placement, deserialize_u32_from_number};
use strip_packer::{Algorithm, AnnealConfig, PackError, SearchLimits, Solver, SolverConfig, Status};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Time limit for requests that do not set one.
const DEFAULT_TIME_LIMIT_MS: u64 = 10_000;

#[derive(Deserialize, Serialize)]
struct PackRequest {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    width: u32,
    items: Vec<ItemRequest>,
    #[serde(default)]
    algorithm: Algorithm,
    #[serde(default)]
    limits: SearchLimits,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Serialize)]
struct ItemRequest {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    count: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    height: u32,
}

#[derive(Serialize)]
struct PackResponse {
    length: u32,
    elapsed_secs: f64,
    status: Status,
    placements: Vec<PlacementResponse>,
}

#[derive(Serialize)]
struct PlacementResponse {
    item: usize,
    left: u32,
    top: u32,
    right: u32,
    bottom: u32,
    rotated: bool,
}

impl From<&Placement> for PlacementResponse {
    fn from(p: &Placement) -> Self {
        Self {
            item: p.item,
            left: p.left(),
            top: p.top(),
            right: p.right(),
            bottom: p.bottom(),
            rotated: p.rotated,
        }
    }
}

fn request_limits(limits: SearchLimits) -> SearchLimits {
    if limits.time_limit_ms.is_some() {
        limits
    } else {
        limits.with_time_limit_ms(DEFAULT_TIME_LIMIT_MS)
    }
}

fn status_for(err: &PackError) -> StatusCode {
    match err {
        PackError::InvalidWidth(_) => StatusCode::BAD_REQUEST,
        PackError::Infeasible { .. }
        | PackError::LengthOverflow { .. }
        | PackError::BudgetExhausted { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

async fn pack(Json(req): Json<PackRequest>) -> Result<Json<PackResponse>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /pack"
    );

    if req.width == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "roll width must be non-zero".to_string(),
        ));
    }

    let demands: Vec<Demand> = req
        .items
        .iter()
        .map(|item| {
            if item.width == 0 || item.height == 0 {
                return Err("item dimensions must be non-zero".to_string());
            }
            Ok(Demand::new(item.width, item.height, item.count))
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let mut anneal = AnnealConfig::default();
    if let Some(seed) = req.seed {
        anneal = anneal.with_seed(seed);
    }
    let config = SolverConfig::new()
        .with_algorithm(req.algorithm)
        .with_limits(request_limits(req.limits))
        .with_anneal(anneal);
    let solver = Solver::new(req.width, demands, config);

    let solution = tokio::task::spawn_blocking(move || solver.solve())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| (status_for(&e), e.to_string()))?;

    Ok(Json(PackResponse {
        length: solution.length,
        elapsed_secs: solution.elapsed_secs,
        status: solution.status,
        placements: solution.placements.iter().map(PlacementResponse::from).collect(),
    }))
}

#[tokio::main]
async fn main() {
    let _sentry = sentry::init(sentry::ClientOptions {
        dsn: std::env::var("SENTRY_DSN").ok().and_then(|dsn| dsn.parse().ok()),
        release: sentry::release_name!(),
        ..Default::default()
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/pack", post(pack))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
