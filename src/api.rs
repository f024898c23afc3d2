//! REST API for a Proofchain node
//!
//! Turns HTTP requests into calls on the shared [`Ledger`]. Request bodies
//! are validated here; the ledger itself trusts its inputs.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::{Block, Ledger};
use crate::crypto::NodeId;
use crate::error::ChainError;
use crate::miner::proof_of_work;
use crate::network::Peer;
use crate::transaction::Transaction;

const WELCOME_MESSAGE: &str = "Takes team work to make the dream work.";

/// Everything a request handler needs: the ledger and this node's identity.
///
/// Clones share one proof-search slot.
#[derive(Clone)]
pub struct Node {
    pub ledger: Ledger,
    pub node_id: NodeId,
    mining_deadline: Option<Duration>,
    search_running: Arc<AtomicBool>,
}

impl Node {
    pub fn new(ledger: Ledger, node_id: NodeId) -> Self {
        Self {
            ledger,
            node_id,
            mining_deadline: None,
            search_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Give up waiting for a proof after `deadline`.
    ///
    /// The search thread itself cannot be interrupted: it keeps its slot on
    /// the blocking pool until it finishes, and its result is discarded.
    /// Until then further mine requests fail with
    /// [`ChainError::MiningInProgress`], so timed-out searches never pile up.
    pub fn with_mining_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.mining_deadline = deadline;
        self
    }

    /// Solve the next proof off the async runtime, then pay this node the
    /// mining reward and seal the pool.
    ///
    /// At most one search runs at a time.
    pub async fn mine(&self) -> Result<Block, ApiError> {
        let slot = SearchSlot::claim(&self.search_running).ok_or(ChainError::MiningInProgress)?;
        let job = self.ledger.begin_mining()?;
        let last_proof = job.last_proof;
        let search = tokio::task::spawn_blocking(move || {
            let _slot = slot;
            proof_of_work(last_proof)
        });

        let proof = match self.mining_deadline {
            Some(limit) => tokio::time::timeout(limit, search)
                .await
                .map_err(|_| ChainError::MiningTimeout(limit))?,
            None => search.await,
        }
        .map_err(|e| ApiError::InternalError(format!("Proof search failed: {}", e)))?;

        Ok(self.ledger.complete_mining(&job, proof, &self.node_id)?)
    }
}

/// Holds the node's single proof-search slot; released on drop, including
/// when the search thread panics.
struct SearchSlot(Arc<AtomicBool>);

impl SearchSlot {
    fn claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SearchSlot(flag.clone()))
    }
}

impl Drop for SearchSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BlockchainError(ChainError),
    InvalidInput(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BlockchainError(e) => {
                let status = match &e {
                    ChainError::StaleTip { .. } => StatusCode::CONFLICT,
                    ChainError::MiningTimeout(_) | ChainError::MiningInProgress => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    ChainError::InvalidNodeId(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::BlockchainError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(format!("Malformed request: {}", rejection.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterNodeRequest {
    pub ip: String,
}

#[derive(Serialize)]
pub struct ChainResponse {
    pub blockchain: Vec<Block>,
    pub network: Vec<Peer>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub parent_hash: String,
}

#[derive(Serialize)]
pub struct RegisterNodeResponse {
    pub message: String,
    pub nodes: Vec<Peer>,
}

#[derive(Serialize)]
struct SuccessResponse {
    message: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration of every request.
async fn logging_middleware(
    State(node): State<Arc<Node>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        node_id = %node.node_id,
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/chain", get(full_chain))
        .route("/mine", get(mine))
        .route("/transactions/new", post(new_transaction))
        .route("/nodes/register", post(register_node))
        .layer(middleware::from_fn_with_state(node.clone(), logging_middleware))
        .with_state(node)
        .layer(cors)
}

/// Serve the API on `bind_addr` until the process ends.
pub async fn run_api_server(node: Arc<Node>, bind_addr: &str) -> Result<(), ChainError> {
    let app = build_api_router(node);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    tracing::info!("API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "node_id": node.node_id,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn full_chain(State(node): State<Arc<Node>>) -> Json<ChainResponse> {
    let snapshot = node.ledger.snapshot();
    Json(ChainResponse {
        blockchain: snapshot.chain,
        network: snapshot.nodes,
    })
}

async fn mine(State(node): State<Arc<Node>>) -> Result<Json<MineResponse>, ApiError> {
    let block = node.mine().await?;

    tracing::info!(
        index = block.index,
        proof = block.proof,
        node_id = %node.node_id,
        "New block forged"
    );

    Ok(Json(MineResponse {
        message: "New Block Forged".to_string(),
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        parent_hash: block.parent_hash,
    }))
}

async fn new_transaction(
    State(node): State<Arc<Node>>,
    payload: Result<Json<Transaction>, JsonRejection>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let Json(tx) = payload?;
    let index = node.ledger.add_transaction(tx.sender, tx.receiver, tx.amount);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: format!("Transaction will be added to Block {}", index),
        }),
    ))
}

async fn register_node(
    State(node): State<Arc<Node>>,
    payload: Result<Json<RegisterNodeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterNodeResponse>), ApiError> {
    let Json(req) = payload?;
    let (_, nodes) = node.ledger.register_node_and_list(req.ip)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterNodeResponse {
            message: "Node registered".to_string(),
            nodes,
        }),
    ))
}
