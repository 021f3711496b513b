use crate::config::DatabaseConfig;
use crate::db::models::{DbQuote, ListOrder, NewQuote, Quote, Vote, page_offset};
use crate::db::schema::SQLITE_INIT;
use crate::db::timestamp;
use crate::db::traits::QuoteStore;
use crate::error::{BoxError, DeadlineExceeded, StoreError};
use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RactorErr, RpcReplyPort, SpawnErr};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error as ThisError;
use tokio::time::Instant;
use tracing::info;

const QUOTE_COLUMNS: &str = "id, text, comment, submitted_at, source_address, score, vote_count";

/// Extra time the caller waits past the store deadline, so the actor's own verdict
/// (committed, or rolled back as expired) normally reaches the caller.
const REPLY_GRACE_MS: u64 = 1_000;

/// Every message carries the instant after which its result is no longer wanted.
#[derive(Debug)]
pub enum DbActorMessage {
    /// Insert a quote and return its id.
    Create(NewQuote, Instant, RpcReplyPort<Result<i64, StoreError>>),

    /// Get a quote by id.
    GetById(i64, Instant, RpcReplyPort<Result<Quote, StoreError>>),

    /// One page of quotes in the given order.
    List(
        ListOrder,
        i64,
        u32,
        Instant,
        RpcReplyPort<Result<Vec<Quote>, StoreError>>,
    ),

    /// One quote chosen by the engine's random ordering.
    PickRandom(Instant, RpcReplyPort<Result<Quote, StoreError>>),

    /// Apply a single vote.
    Vote(i64, Vote, Instant, RpcReplyPort<Result<(), StoreError>>),
}

/// The actor could not be reached or did not answer in time.
#[derive(Debug, ThisError)]
#[error("DbActor {call} RPC failed: {source}")]
pub struct DbRpcError {
    pub call: &'static str,
    #[source]
    pub source: RactorErr<DbActorMessage>,
}

/// Cloneable handle to the database actor.
///
/// Every call gets a deadline of `call_timeout_ms`. Work that would finish past it is rolled
/// back and reported as [`DeadlineExceeded`]; a dead or unresponsive actor is reported as
/// [`DbRpcError`]. Both arrive as a read or write failure.
#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
    call_timeout_ms: u64,
}

impl DbActorHandle {
    /// Stops the actor; its pool is closed on the way out.
    pub fn shutdown(&self) {
        self.actor.stop(Some("shutdown".to_string()));
    }

    fn deadline(&self) -> Instant {
        Instant::now() + Duration::from_millis(self.call_timeout_ms)
    }

    fn rpc_timeout_ms(&self) -> u64 {
        self.call_timeout_ms.saturating_add(REPLY_GRACE_MS)
    }
}

#[async_trait]
impl QuoteStore for DbActorHandle {
    async fn create(&self, quote: NewQuote) -> Result<i64, StoreError> {
        let deadline = self.deadline();
        ractor::call_t!(
            self.actor,
            DbActorMessage::Create,
            self.rpc_timeout_ms(),
            quote,
            deadline
        )
        .map_err(|source| {
            StoreError::write(DbRpcError {
                call: "Create",
                source,
            })
        })?
    }

    async fn get_by_id(&self, id: i64) -> Result<Quote, StoreError> {
        let deadline = self.deadline();
        ractor::call_t!(
            self.actor,
            DbActorMessage::GetById,
            self.rpc_timeout_ms(),
            id,
            deadline
        )
        .map_err(|source| {
            StoreError::read(DbRpcError {
                call: "GetById",
                source,
            })
        })?
    }

    async fn list(
        &self,
        order: ListOrder,
        page: i64,
        page_size: u32,
    ) -> Result<Vec<Quote>, StoreError> {
        let deadline = self.deadline();
        ractor::call_t!(
            self.actor,
            DbActorMessage::List,
            self.rpc_timeout_ms(),
            order,
            page,
            page_size,
            deadline
        )
        .map_err(|source| {
            StoreError::read(DbRpcError {
                call: "List",
                source,
            })
        })?
    }

    async fn pick_random(&self) -> Result<Quote, StoreError> {
        let deadline = self.deadline();
        ractor::call_t!(
            self.actor,
            DbActorMessage::PickRandom,
            self.rpc_timeout_ms(),
            deadline
        )
        .map_err(|source| {
            StoreError::read(DbRpcError {
                call: "PickRandom",
                source,
            })
        })?
    }

    async fn upvote(&self, id: i64) -> Result<(), StoreError> {
        self.vote(id, Vote::Up).await
    }

    async fn downvote(&self, id: i64) -> Result<(), StoreError> {
        self.vote(id, Vote::Down).await
    }

    async fn vote(&self, id: i64, vote: Vote) -> Result<(), StoreError> {
        let deadline = self.deadline();
        ractor::call_t!(
            self.actor,
            DbActorMessage::Vote,
            self.rpc_timeout_ms(),
            id,
            vote,
            deadline
        )
        .map_err(|source| {
            StoreError::write(DbRpcError {
                call: "Vote",
                source,
            })
        })?
    }
}

/// The caller gave up or the deadline passed; the result would be thrown away.
fn abandoned<T>(deadline: Instant, reply: &RpcReplyPort<T>) -> bool {
    reply.is_closed() || Instant::now() >= deadline
}

/// Bounds one storage step by `deadline`; dropping the future abandons the statement.
async fn within<T, F>(deadline: Instant, fut: F) -> Result<T, BoxError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(res) => res.map_err(BoxError::from),
        Err(_) => Err(DeadlineExceeded.into()),
    }
}

/// Commits only while the caller still waits; otherwise the transaction is dropped (rolled back).
async fn commit_if_wanted<T>(
    tx: Transaction<'static, Sqlite>,
    deadline: Instant,
    reply: &RpcReplyPort<T>,
) -> Result<(), StoreError> {
    if abandoned(deadline, reply) {
        return Err(StoreError::write(DeadlineExceeded));
    }
    tx.commit().await.map_err(StoreError::write)
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = DatabaseConfig;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        cfg: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(cfg.url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(cfg.busy_timeout())
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(cfg.max_connections())
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!(max_connections = cfg.max_connections(), "DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.pool.close().await;
        info!("DbActor stopped");
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::Create(quote, deadline, reply) => {
                let res = if abandoned(deadline, &reply) {
                    Err(StoreError::write(DeadlineExceeded))
                } else {
                    self.create_quote(&state.pool, quote, deadline, &reply).await
                };
                let _ = reply.send(res);
            }
            DbActorMessage::GetById(id, deadline, reply) => {
                let res = if abandoned(deadline, &reply) {
                    Err(StoreError::read(DeadlineExceeded))
                } else {
                    self.get_by_id(&state.pool, id, deadline).await
                };
                let _ = reply.send(res);
            }
            DbActorMessage::List(order, page, page_size, deadline, reply) => {
                let res = if abandoned(deadline, &reply) {
                    Err(StoreError::read(DeadlineExceeded))
                } else {
                    self.list(&state.pool, order, page, page_size, deadline)
                        .await
                };
                let _ = reply.send(res);
            }
            DbActorMessage::PickRandom(deadline, reply) => {
                let res = if abandoned(deadline, &reply) {
                    Err(StoreError::read(DeadlineExceeded))
                } else {
                    self.pick_random(&state.pool, deadline).await
                };
                let _ = reply.send(res);
            }
            DbActorMessage::Vote(id, vote, deadline, reply) => {
                let res = if abandoned(deadline, &reply) {
                    Err(StoreError::write(DeadlineExceeded))
                } else {
                    self.apply_vote(&state.pool, id, vote, deadline, &reply)
                        .await
                };
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn create_quote(
        &self,
        pool: &SqlitePool,
        quote: NewQuote,
        deadline: Instant,
        reply: &RpcReplyPort<Result<i64, StoreError>>,
    ) -> Result<i64, StoreError> {
        let mut tx = within(deadline, pool.begin())
            .await
            .map_err(StoreError::write)?;

        let id: i64 = within(
            deadline,
            sqlx::query_scalar(
                r#"
        INSERT INTO quotes (text, comment, submitted_at, source_address, score, vote_count)
        VALUES (?, ?, ?, ?, 0, 0)
        RETURNING id
        "#,
            )
            .bind(quote.text)
            .bind(quote.comment)
            .bind(timestamp::encode(&quote.submitted_at))
            .bind(quote.source_address)
            .fetch_one(&mut *tx),
        )
        .await
        .map_err(StoreError::write)?;

        commit_if_wanted(tx, deadline, reply).await?;
        Ok(id)
    }

    async fn get_by_id(
        &self,
        pool: &SqlitePool,
        id: i64,
        deadline: Instant,
    ) -> Result<Quote, StoreError> {
        let row = within(
            deadline,
            sqlx::query_as::<_, DbQuote>(&format!(
                "SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?"
            ))
            .bind(id)
            .fetch_optional(pool),
        )
        .await
        .map_err(StoreError::read)?;

        row.map(Quote::from).ok_or(StoreError::NotFound)
    }

    async fn list(
        &self,
        pool: &SqlitePool,
        order: ListOrder,
        page: i64,
        page_size: u32,
        deadline: Instant,
    ) -> Result<Vec<Quote>, StoreError> {
        if page_size == 0 {
            return Ok(Vec::new());
        }

        let rows = within(
            deadline,
            sqlx::query_as::<_, DbQuote>(&format!(
                "SELECT {QUOTE_COLUMNS} FROM quotes ORDER BY {} LIMIT ? OFFSET ?",
                order.order_by()
            ))
            .bind(i64::from(page_size))
            .bind(page_offset(page, page_size))
            .fetch_all(pool),
        )
        .await
        .map_err(StoreError::read)?;

        Ok(rows.into_iter().map(Quote::from).collect())
    }

    async fn pick_random(&self, pool: &SqlitePool, deadline: Instant) -> Result<Quote, StoreError> {
        let row = within(
            deadline,
            sqlx::query_as::<_, DbQuote>(&format!(
                "SELECT {QUOTE_COLUMNS} FROM quotes ORDER BY RANDOM() LIMIT 1"
            ))
            .fetch_optional(pool),
        )
        .await
        .map_err(StoreError::read)?;

        row.map(Quote::from).ok_or(StoreError::NotFound)
    }

    // Single UPDATE so the engine applies both increments together.
    async fn apply_vote(
        &self,
        pool: &SqlitePool,
        id: i64,
        vote: Vote,
        deadline: Instant,
        reply: &RpcReplyPort<Result<(), StoreError>>,
    ) -> Result<(), StoreError> {
        let mut tx = within(deadline, pool.begin())
            .await
            .map_err(StoreError::write)?;

        within(
            deadline,
            sqlx::query(
                r#"
        UPDATE quotes
        SET score = score + ?, vote_count = vote_count + 1
        WHERE id = ?
        "#,
            )
            .bind(vote.score_delta())
            .bind(id)
            .execute(&mut *tx),
        )
        .await
        .map_err(StoreError::write)?;

        commit_if_wanted(tx, deadline, reply).await
    }
}

/// Spawn the database actor and return a cloneable handle.
///
/// Fails when the database cannot be opened or the schema cannot be applied.
pub async fn spawn(cfg: &DatabaseConfig) -> Result<DbActorHandle, SpawnErr> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, cfg.clone()).await?;

    Ok(DbActorHandle {
        actor,
        call_timeout_ms: cfg.call_timeout_ms,
    })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
