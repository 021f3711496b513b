use crate::db::Vote;
use crate::error::BoardError;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Query},
    http::{Uri, request::Parts},
};
use serde::Deserialize;
use std::{convert::Infallible, net::SocketAddr};

/// 1-indexed page from `?page=`. Absent, unparsable or non-positive values mean page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageNumber(pub(crate) i64);

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<String>,
}

impl PageNumber {
    fn from_uri(uri: &Uri) -> Self {
        let page = Query::<PageParams>::try_from_uri(uri)
            .ok()
            .and_then(|Query(params)| params.page)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1);
        Self(page)
    }
}

impl<S> FromRequestParts<S> for PageNumber
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_uri(&parts.uri))
    }
}

/// `?id=N&type=up|down`, validated before anything reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VoteRequest {
    pub(crate) id: i64,
    pub(crate) vote: Vote,
}

#[derive(Debug, Deserialize)]
struct VoteParams {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl VoteRequest {
    fn from_uri(uri: &Uri) -> Result<Self, BoardError> {
        let Query(params) = Query::<VoteParams>::try_from_uri(uri)
            .map_err(|e| BoardError::bad_request(format!("invalid vote request: {e}")))?;

        let vote = params
            .kind
            .as_deref()
            .unwrap_or_default()
            .parse::<Vote>()
            .map_err(|e| BoardError::bad_request(format!("invalid vote request: {e}")))?;

        let id = params
            .id
            .as_deref()
            .and_then(|raw| raw.parse::<i64>().ok())
            .ok_or_else(|| BoardError::bad_request("invalid vote request: id must be an integer"))?;

        Ok(Self { id, vote })
    }
}

impl<S> FromRequestParts<S> for VoteRequest
where
    S: Send + Sync,
{
    type Rejection = BoardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_uri(&parts.uri)
    }
}

/// Peer address recorded with a submission; `unknown` when the server was not started with
/// connect info (e.g. in-process tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceAddr(pub(crate) String);

impl<S> FromRequestParts<S> for SourceAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map_or_else(|| "unknown".to_string(), |ConnectInfo(addr)| addr.to_string());
        Ok(Self(addr))
    }
}
