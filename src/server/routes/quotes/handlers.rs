use super::extract::{PageNumber, SourceAddr, VoteRequest};
use super::views::{Pager, QuoteView, render_card, render_page};
use crate::db::{ListOrder, NewQuote};
use crate::error::BoardError;
use crate::sanitize::normalize_for_storage;
use crate::server::router::BoardState;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Redirect},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

async fn list_page(
    state: &BoardState,
    order: ListOrder,
    page: i64,
    endpoint: &'static str,
    title: &str,
) -> Result<Html<String>, BoardError> {
    let quotes = state
        .store
        .list(order, page, state.page_size)
        .await
        .map_err(|e| BoardError::store("fetching quotes", e))?;

    let views: Vec<QuoteView> = quotes.iter().map(QuoteView::from).collect();
    let pager = Pager {
        endpoint,
        page,
        has_next: quotes.len() == state.page_size as usize,
    };
    Ok(Html(render_page(title, &views, Some(&pager))))
}

/// GET /
pub(super) async fn latest_handler(
    State(state): State<BoardState>,
    PageNumber(page): PageNumber,
) -> Result<Html<String>, BoardError> {
    list_page(&state, ListOrder::Recency, page, "/", "Latest quotes").await
}

/// GET /top
pub(super) async fn top_handler(
    State(state): State<BoardState>,
    PageNumber(page): PageNumber,
) -> Result<Html<String>, BoardError> {
    list_page(&state, ListOrder::Score, page, "/top", "Top quotes").await
}

/// GET /random
pub(super) async fn random_handler(
    State(state): State<BoardState>,
) -> Result<Html<String>, BoardError> {
    let quote = state
        .store
        .pick_random()
        .await
        .map_err(|e| BoardError::store("fetching random quote", e))?;

    Ok(Html(render_page(
        "Random quote",
        &[QuoteView::from(&quote)],
        None,
    )))
}

/// GET /quote/{id}
pub(super) async fn view_handler(
    State(state): State<BoardState>,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, BoardError> {
    let id = raw_id
        .parse::<i64>()
        .map_err(|_| BoardError::bad_request(format!("invalid quote id {raw_id:?}")))?;

    let quote = state
        .store
        .get_by_id(id)
        .await
        .map_err(|e| BoardError::store("fetching quote", e))?;

    Ok(Html(render_page(
        &format!("Quote #{id}"),
        &[QuoteView::from(&quote)],
        None,
    )))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SubmitForm {
    #[serde(default)]
    quote: String,
    #[serde(default)]
    comment: String,
}

/// POST /add
///
/// Newlines are folded into storage line breaks before insert; display sanitizing happens on
/// every render instead.
pub(super) async fn add_handler(
    State(state): State<BoardState>,
    SourceAddr(source_address): SourceAddr,
    Form(form): Form<SubmitForm>,
) -> Result<Redirect, BoardError> {
    if form.quote.trim().is_empty() {
        return Err(BoardError::bad_request("quote text must not be empty"));
    }

    let comment = normalize_for_storage(&form.comment);
    let submission = NewQuote {
        text: normalize_for_storage(&form.quote),
        comment: (!comment.trim().is_empty()).then_some(comment),
        submitted_at: Utc::now(),
        source_address,
    };

    let id = state
        .store
        .create(submission)
        .await
        .map_err(|e| BoardError::store("adding quote", e))?;

    info!(id, "quote added");
    Ok(Redirect::to("/"))
}

/// GET /vote?id=N&type=up|down
///
/// Returns the re-read card. A vote racing in between the update and the read may already be
/// reflected in the shown score.
pub(super) async fn vote_handler(
    State(state): State<BoardState>,
    VoteRequest { id, vote }: VoteRequest,
) -> Result<Html<String>, BoardError> {
    state
        .store
        .vote(id, vote)
        .await
        .map_err(|e| BoardError::store("applying vote", e))?;

    let quote = state
        .store
        .get_by_id(id)
        .await
        .map_err(|e| BoardError::store("fetching updated quote", e))?;

    debug!(id, %vote, score = quote.score, votes = quote.vote_count, "vote applied");
    Ok(Html(render_card(&QuoteView::from(&quote))))
}
