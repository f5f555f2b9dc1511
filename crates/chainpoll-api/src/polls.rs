use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use tracing::info;
use zeroize::Zeroizing;

use chainpoll_chain::{PrivateKeySigner, signer_from_key};
use chainpoll_types::api::{CreatePollRequest, CreatePollResponse, VoteRequest, VoteResponse};
use chainpoll_types::models::Poll;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// Header carrying the caller's signing key. The underscore spelling is
/// accepted for clients that send the parameter name verbatim.
pub const PRIVATE_KEY_HEADER: &str = "private-key";
const PRIVATE_KEY_HEADER_ALT: &str = "private_key";

pub async fn create_poll(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    body: Result<Json<CreatePollRequest>, JsonRejection>,
) -> Result<Json<CreatePollResponse>, ApiError> {
    let Json(req) = body?;

    if req.question.trim().is_empty() {
        return Err(ApiError::validation("question", "must not be empty"));
    }
    if req.options.len() < 2 {
        return Err(ApiError::validation("options", "at least two options are required"));
    }
    if req.options.iter().any(|o| o.trim().is_empty()) {
        return Err(ApiError::validation("options", "options must not be empty"));
    }

    let signer = signer_from_headers(&headers)?;

    let tx_hash = state
        .chain
        .create_poll(&signer, &req.question, &req.options)
        .await?;
    info!("User {} submitted createPoll tx {}", user.username, tx_hash);

    Ok(Json(CreatePollResponse {
        transaction_hash: tx_hash.to_string(),
    }))
}

pub async fn get_polls(State(state): State<AppState>) -> Result<Json<Vec<Poll>>, ApiError> {
    Ok(Json(state.chain.list_polls().await?))
}

/// Returns current results without submitting anything if this key has
/// already voted on the poll.
pub async fn vote(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, ApiError> {
    let Json(req) = body?;
    let signer = signer_from_headers(&headers)?;

    if state.chain.has_voted(req.poll_id, signer.address()).await? {
        let results = state.chain.results(req.poll_id).await?;
        return Ok(Json(VoteResponse {
            has_voted: true,
            results,
        }));
    }

    let tx_hash = state
        .chain
        .cast_vote(&signer, req.poll_id, req.option_id)
        .await?;
    info!(
        "User {} voted on poll {} in tx {}",
        user.username, req.poll_id, tx_hash
    );

    let results = state.chain.results(req.poll_id).await?;
    Ok(Json(VoteResponse {
        has_voted: false,
        results,
    }))
}

fn signer_from_headers(headers: &HeaderMap) -> Result<PrivateKeySigner, ApiError> {
    let value = headers
        .get(PRIVATE_KEY_HEADER)
        .or_else(|| headers.get(PRIVATE_KEY_HEADER_ALT))
        .ok_or_else(|| ApiError::validation("private-key", "header is required"))?;

    let key = Zeroizing::new(
        value
            .to_str()
            .map_err(|_| ApiError::validation("private-key", "header must be ASCII hex"))?
            .to_string(),
    );

    Ok(signer_from_key(&key)?)
}
