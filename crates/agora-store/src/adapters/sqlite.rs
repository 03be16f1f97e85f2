//! # SQLite Store
//!
//! Durable [`ProjectionStore`] adapter. The unique index on `users.address`
//! is what makes identity auto-provisioning race-safe: find-or-create is an
//! `INSERT .. ON CONFLICT DO NOTHING` followed by a fetch of whichever row
//! won. Tally increments happen in SQL, and the proposal-accept two-row
//! transition runs inside one transaction.

use std::path::Path;
use std::str::FromStr;

use agora_types::{
    ArenaEntry, DirectRequest, DirectStatus, EscrowDeal, EscrowStatus, Proposal, ProposalStatus,
    Round, RoundStatus, TaskRequest, TaskRequestStatus, Topic, User, WalletAddress,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::domain::errors::StoreError;
use crate::domain::factory;
use crate::ports::{
    DirectFilter, NewArenaEntry, NewDirectRequest, NewEscrowDeal, NewProposal, NewRound,
    NewTaskRequest, NewTopic, ProjectionStore,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY,
    address         TEXT NOT NULL,
    display_name    TEXT NOT NULL,
    role            TEXT NOT NULL,
    reputation      INTEGER NOT NULL,
    tasks_completed INTEGER NOT NULL,
    created_at      TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS users_address_unique ON users (address);

CREATE TABLE IF NOT EXISTS rounds (
    id                TEXT PRIMARY KEY,
    sequence          INTEGER NOT NULL,
    prize             INTEGER NOT NULL,
    status            TEXT NOT NULL,
    ledger_round_id   INTEGER,
    winner_user_id    TEXT,
    selected_topic_id TEXT,
    creator_address   TEXT,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS topics (
    id               TEXT PRIMARY KEY,
    round_id         TEXT NOT NULL REFERENCES rounds(id),
    proposer_user_id TEXT NOT NULL REFERENCES users(id),
    title            TEXT NOT NULL,
    description      TEXT NOT NULL,
    votes            INTEGER NOT NULL,
    ledger_topic_id  INTEGER,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entries (
    id                TEXT PRIMARY KEY,
    round_id          TEXT NOT NULL REFERENCES rounds(id),
    submitter_user_id TEXT NOT NULL REFERENCES users(id),
    repository_url    TEXT NOT NULL,
    description       TEXT NOT NULL,
    demo_url          TEXT,
    ledger_entry_id   INTEGER,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS task_requests (
    id                 TEXT PRIMARY KEY,
    requester_user_id  TEXT NOT NULL REFERENCES users(id),
    title              TEXT NOT NULL,
    description        TEXT NOT NULL,
    budget             INTEGER NOT NULL,
    deadline           TEXT NOT NULL,
    status             TEXT NOT NULL,
    assigned_worker_id TEXT,
    created_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS proposals (
    id             TEXT PRIMARY KEY,
    request_id     TEXT NOT NULL REFERENCES task_requests(id),
    bidder_user_id TEXT NOT NULL REFERENCES users(id),
    price          INTEGER NOT NULL,
    estimated_days INTEGER NOT NULL,
    message        TEXT NOT NULL,
    status         TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS escrow_deals (
    id                TEXT PRIMARY KEY,
    request_id        TEXT NOT NULL REFERENCES task_requests(id),
    requester_user_id TEXT NOT NULL REFERENCES users(id),
    worker_user_id    TEXT NOT NULL REFERENCES users(id),
    amount            INTEGER NOT NULL,
    status            TEXT NOT NULL,
    ledger_deal_id    INTEGER,
    completed_at      TEXT,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS direct_requests (
    id             TEXT PRIMARY KEY,
    client_address TEXT NOT NULL,
    agent_address  TEXT NOT NULL,
    client_user_id TEXT NOT NULL REFERENCES users(id),
    agent_user_id  TEXT NOT NULL REFERENCES users(id),
    amount         INTEGER NOT NULL,
    description    TEXT NOT NULL,
    deadline       TEXT NOT NULL,
    status         TEXT NOT NULL,
    ledger_deal_id INTEGER,
    created_at     TEXT NOT NULL
);
";

const USER_COLS: &str = "id, address, display_name, role, reputation, tasks_completed, created_at";
const ROUND_COLS: &str =
    "id, sequence, prize, status, ledger_round_id, winner_user_id, selected_topic_id, creator_address, created_at";
const TOPIC_COLS: &str =
    "id, round_id, proposer_user_id, title, description, votes, ledger_topic_id, created_at";
const ENTRY_COLS: &str =
    "id, round_id, submitter_user_id, repository_url, description, demo_url, ledger_entry_id, created_at";
const REQUEST_COLS: &str =
    "id, requester_user_id, title, description, budget, deadline, status, assigned_worker_id, created_at";
const PROPOSAL_COLS: &str =
    "id, request_id, bidder_user_id, price, estimated_days, message, status, created_at";
const ESCROW_COLS: &str =
    "id, request_id, requester_user_id, worker_user_id, amount, status, ledger_deal_id, completed_at, created_at";
const DIRECT_COLS: &str =
    "id, client_address, agent_address, client_user_id, agent_user_id, amount, description, deadline, status, ledger_deal_id, created_at";

/// SQLite-backed [`ProjectionStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn db_err(err: rusqlite::Error) -> StoreError {
    StoreError::backend(err.to_string())
}

/// Wrap a domain parse failure so it can travel through rusqlite's row
/// mapping as a conversion error.
fn conv<E: std::fmt::Display>(idx: usize, err: E) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            err.to_string(),
        )),
    )
}

fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn ts_from_sql(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv(idx, e))
}

fn addr_from_sql(idx: usize, raw: &str) -> rusqlite::Result<WalletAddress> {
    WalletAddress::parse(raw).map_err(|e| conv(idx, e))
}

fn status_from_sql<T: FromStr<Err = String>>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    raw.parse().map_err(|e: String| conv(idx, e))
}

impl SqliteStore {
    /// Open (or create) the database at `path` and bootstrap the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::bootstrap(conn)
    }

    /// Private on-disk-free database, used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // -- row mappers ---------------------------------------------------------

    fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
        let address: String = row.get(1)?;
        let role: String = row.get(3)?;
        let created: String = row.get(6)?;
        Ok(User {
            id: row.get(0)?,
            address: addr_from_sql(1, &address)?,
            display_name: row.get(2)?,
            role: status_from_sql(3, &role)?,
            reputation: row.get::<_, i64>(4)? as u32,
            tasks_completed: row.get::<_, i64>(5)? as u32,
            created_at: ts_from_sql(6, &created)?,
        })
    }

    fn map_round(row: &Row<'_>) -> rusqlite::Result<Round> {
        let status: String = row.get(3)?;
        let creator: Option<String> = row.get(7)?;
        let created: String = row.get(8)?;
        Ok(Round {
            id: row.get(0)?,
            sequence: row.get::<_, i64>(1)? as u64,
            prize: row.get::<_, i64>(2)? as u64,
            status: status_from_sql(3, &status)?,
            ledger_round_id: row.get::<_, Option<i64>>(4)?.map(|v| v as u64),
            winner_user_id: row.get(5)?,
            selected_topic_id: row.get(6)?,
            creator_address: creator.map(|a| addr_from_sql(7, &a)).transpose()?,
            created_at: ts_from_sql(8, &created)?,
        })
    }

    fn map_topic(row: &Row<'_>) -> rusqlite::Result<Topic> {
        let created: String = row.get(7)?;
        Ok(Topic {
            id: row.get(0)?,
            round_id: row.get(1)?,
            proposer_user_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            votes: row.get::<_, i64>(5)? as u64,
            ledger_topic_id: row.get::<_, Option<i64>>(6)?.map(|v| v as u64),
            created_at: ts_from_sql(7, &created)?,
        })
    }

    fn map_entry(row: &Row<'_>) -> rusqlite::Result<ArenaEntry> {
        let created: String = row.get(7)?;
        Ok(ArenaEntry {
            id: row.get(0)?,
            round_id: row.get(1)?,
            submitter_user_id: row.get(2)?,
            repository_url: row.get(3)?,
            description: row.get(4)?,
            demo_url: row.get(5)?,
            ledger_entry_id: row.get::<_, Option<i64>>(6)?.map(|v| v as u64),
            created_at: ts_from_sql(7, &created)?,
        })
    }

    fn map_request(row: &Row<'_>) -> rusqlite::Result<TaskRequest> {
        let deadline: String = row.get(5)?;
        let status: String = row.get(6)?;
        let created: String = row.get(8)?;
        Ok(TaskRequest {
            id: row.get(0)?,
            requester_user_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            budget: row.get::<_, i64>(4)? as u64,
            deadline: ts_from_sql(5, &deadline)?,
            status: status_from_sql(6, &status)?,
            assigned_worker_id: row.get(7)?,
            created_at: ts_from_sql(8, &created)?,
        })
    }

    fn map_proposal(row: &Row<'_>) -> rusqlite::Result<Proposal> {
        let status: String = row.get(6)?;
        let created: String = row.get(7)?;
        Ok(Proposal {
            id: row.get(0)?,
            request_id: row.get(1)?,
            bidder_user_id: row.get(2)?,
            price: row.get::<_, i64>(3)? as u64,
            estimated_days: row.get::<_, i64>(4)? as u32,
            message: row.get(5)?,
            status: status_from_sql(6, &status)?,
            created_at: ts_from_sql(7, &created)?,
        })
    }

    fn map_escrow(row: &Row<'_>) -> rusqlite::Result<EscrowDeal> {
        let status: String = row.get(5)?;
        let completed: Option<String> = row.get(7)?;
        let created: String = row.get(8)?;
        Ok(EscrowDeal {
            id: row.get(0)?,
            request_id: row.get(1)?,
            requester_user_id: row.get(2)?,
            worker_user_id: row.get(3)?,
            amount: row.get::<_, i64>(4)? as u64,
            status: status_from_sql(5, &status)?,
            ledger_deal_id: row.get::<_, Option<i64>>(6)?.map(|v| v as u64),
            completed_at: completed.map(|t| ts_from_sql(7, &t)).transpose()?,
            created_at: ts_from_sql(8, &created)?,
        })
    }

    fn map_direct(row: &Row<'_>) -> rusqlite::Result<DirectRequest> {
        let client: String = row.get(1)?;
        let agent: String = row.get(2)?;
        let deadline: String = row.get(7)?;
        let status: String = row.get(8)?;
        let created: String = row.get(10)?;
        Ok(DirectRequest {
            id: row.get(0)?,
            client_address: addr_from_sql(1, &client)?,
            agent_address: addr_from_sql(2, &agent)?,
            client_user_id: row.get(3)?,
            agent_user_id: row.get(4)?,
            amount: row.get::<_, i64>(5)? as u64,
            description: row.get(6)?,
            deadline: ts_from_sql(7, &deadline)?,
            status: status_from_sql(8, &status)?,
            ledger_deal_id: row.get::<_, Option<i64>>(9)?.map(|v| v as u64),
            created_at: ts_from_sql(10, &created)?,
        })
    }

    // -- shared queries ------------------------------------------------------

    fn query_user_by_address(
        conn: &Connection,
        address: &WalletAddress,
    ) -> Result<Option<User>, StoreError> {
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE address = ?1"),
            params![address.as_str()],
            Self::map_user,
        )
        .optional()
        .map_err(db_err)
    }

    fn fetch<T>(
        conn: &Connection,
        sql: &str,
        id: &str,
        entity: &'static str,
        mapper: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        conn.query_row(sql, params![id], mapper)
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| StoreError::not_found(entity, id))
    }
}

impl ProjectionStore for SqliteStore {
    fn find_user_by_address(&self, address: &WalletAddress) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock();
        Self::query_user_by_address(&conn, address)
    }

    fn find_or_create_user(&self, address: &WalletAddress) -> Result<User, StoreError> {
        let user = factory::build_user(address);
        let conn = self.conn.lock();
        // Insert-or-fetch: the unique index arbitrates races, the follow-up
        // select returns whichever row won.
        conn.execute(
            "INSERT INTO users (id, address, display_name, role, reputation, tasks_completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(address) DO NOTHING",
            params![
                user.id,
                user.address.as_str(),
                user.display_name,
                user.role.as_str(),
                user.reputation as i64,
                user.tasks_completed as i64,
                ts_to_sql(&user.created_at),
            ],
        )
        .map_err(db_err)?;

        Self::query_user_by_address(&conn, address)?
            .ok_or_else(|| StoreError::backend("user vanished after upsert"))
    }

    fn get_user(&self, id: &str) -> Result<User, StoreError> {
        let conn = self.conn.lock();
        Self::fetch(
            &conn,
            &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
            id,
            "user",
            Self::map_user,
        )
    }

    fn insert_round(&self, new: NewRound) -> Result<Round, StoreError> {
        let round = factory::build_round(new);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO rounds (id, sequence, prize, status, ledger_round_id, winner_user_id, selected_topic_id, creator_address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                round.id,
                round.sequence as i64,
                round.prize as i64,
                round.status.as_str(),
                round.ledger_round_id.map(|v| v as i64),
                round.winner_user_id,
                round.selected_topic_id,
                round.creator_address.as_ref().map(|a| a.as_str().to_string()),
                ts_to_sql(&round.created_at),
            ],
        )
        .map_err(db_err)?;
        Ok(round)
    }

    fn get_round(&self, id: &str) -> Result<Round, StoreError> {
        let conn = self.conn.lock();
        Self::fetch(
            &conn,
            &format!("SELECT {ROUND_COLS} FROM rounds WHERE id = ?1"),
            id,
            "round",
            Self::map_round,
        )
    }

    fn update_round_status(&self, id: &str, status: RoundStatus) -> Result<Round, StoreError> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE rounds SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(StoreError::not_found("round", id));
        }
        Self::fetch(
            &conn,
            &format!("SELECT {ROUND_COLS} FROM rounds WHERE id = ?1"),
            id,
            "round",
            Self::map_round,
        )
    }

    fn complete_round(&self, id: &str, winner_user_id: &str) -> Result<Round, StoreError> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE rounds SET status = ?1, winner_user_id = ?2 WHERE id = ?3",
                params![RoundStatus::Completed.as_str(), winner_user_id, id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(StoreError::not_found("round", id));
        }
        Self::fetch(
            &conn,
            &format!("SELECT {ROUND_COLS} FROM rounds WHERE id = ?1"),
            id,
            "round",
            Self::map_round,
        )
    }

    fn insert_topic(&self, new: NewTopic) -> Result<Topic, StoreError> {
        let topic = factory::build_topic(new);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO topics (id, round_id, proposer_user_id, title, description, votes, ledger_topic_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                topic.id,
                topic.round_id,
                topic.proposer_user_id,
                topic.title,
                topic.description,
                topic.votes as i64,
                topic.ledger_topic_id.map(|v| v as i64),
                ts_to_sql(&topic.created_at),
            ],
        )
        .map_err(db_err)?;
        Ok(topic)
    }

    fn get_topic(&self, id: &str) -> Result<Topic, StoreError> {
        let conn = self.conn.lock();
        Self::fetch(
            &conn,
            &format!("SELECT {TOPIC_COLS} FROM topics WHERE id = ?1"),
            id,
            "topic",
            Self::map_topic,
        )
    }

    fn set_topic_votes(&self, id: &str, votes: u64) -> Result<Topic, StoreError> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE topics SET votes = ?1 WHERE id = ?2",
                params![votes as i64, id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(StoreError::not_found("topic", id));
        }
        Self::fetch(
            &conn,
            &format!("SELECT {TOPIC_COLS} FROM topics WHERE id = ?1"),
            id,
            "topic",
            Self::map_topic,
        )
    }

    fn increment_topic_votes(&self, id: &str) -> Result<Topic, StoreError> {
        let conn = self.conn.lock();
        // In-store increment; never read-modify-write.
        let changed = conn
            .execute("UPDATE topics SET votes = votes + 1 WHERE id = ?1", params![id])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(StoreError::not_found("topic", id));
        }
        Self::fetch(
            &conn,
            &format!("SELECT {TOPIC_COLS} FROM topics WHERE id = ?1"),
            id,
            "topic",
            Self::map_topic,
        )
    }

    fn insert_entry(&self, new: NewArenaEntry) -> Result<ArenaEntry, StoreError> {
        let entry = factory::build_entry(new);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO entries (id, round_id, submitter_user_id, repository_url, description, demo_url, ledger_entry_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id,
                entry.round_id,
                entry.submitter_user_id,
                entry.repository_url,
                entry.description,
                entry.demo_url,
                entry.ledger_entry_id.map(|v| v as i64),
                ts_to_sql(&entry.created_at),
            ],
        )
        .map_err(db_err)?;
        Ok(entry)
    }

    fn insert_task_request(&self, new: NewTaskRequest) -> Result<TaskRequest, StoreError> {
        let request = factory::build_task_request(new);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO task_requests (id, requester_user_id, title, description, budget, deadline, status, assigned_worker_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                request.id,
                request.requester_user_id,
                request.title,
                request.description,
                request.budget as i64,
                ts_to_sql(&request.deadline),
                request.status.as_str(),
                request.assigned_worker_id,
                ts_to_sql(&request.created_at),
            ],
        )
        .map_err(db_err)?;
        Ok(request)
    }

    fn get_task_request(&self, id: &str) -> Result<TaskRequest, StoreError> {
        let conn = self.conn.lock();
        Self::fetch(
            &conn,
            &format!("SELECT {REQUEST_COLS} FROM task_requests WHERE id = ?1"),
            id,
            "task request",
            Self::map_request,
        )
    }

    fn update_task_request_status(
        &self,
        id: &str,
        status: TaskRequestStatus,
    ) -> Result<TaskRequest, StoreError> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE task_requests SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(StoreError::not_found("task request", id));
        }
        Self::fetch(
            &conn,
            &format!("SELECT {REQUEST_COLS} FROM task_requests WHERE id = ?1"),
            id,
            "task request",
            Self::map_request,
        )
    }

    fn insert_proposal(&self, new: NewProposal) -> Result<Proposal, StoreError> {
        let proposal = factory::build_proposal(new);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO proposals (id, request_id, bidder_user_id, price, estimated_days, message, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                proposal.id,
                proposal.request_id,
                proposal.bidder_user_id,
                proposal.price as i64,
                proposal.estimated_days as i64,
                proposal.message,
                proposal.status.as_str(),
                ts_to_sql(&proposal.created_at),
            ],
        )
        .map_err(db_err)?;
        Ok(proposal)
    }

    fn get_proposal(&self, id: &str) -> Result<Proposal, StoreError> {
        let conn = self.conn.lock();
        Self::fetch(
            &conn,
            &format!("SELECT {PROPOSAL_COLS} FROM proposals WHERE id = ?1"),
            id,
            "proposal",
            Self::map_proposal,
        )
    }

    fn set_proposal_status(
        &self,
        id: &str,
        status: ProposalStatus,
    ) -> Result<Proposal, StoreError> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE proposals SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(StoreError::not_found("proposal", id));
        }
        Self::fetch(
            &conn,
            &format!("SELECT {PROPOSAL_COLS} FROM proposals WHERE id = ?1"),
            id,
            "proposal",
            Self::map_proposal,
        )
    }

    fn accept_proposal(&self, proposal_id: &str) -> Result<(Proposal, TaskRequest), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        let (request_id, bidder_id): (String, String) = tx
            .query_row(
                "SELECT request_id, bidder_user_id FROM proposals WHERE id = ?1",
                params![proposal_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(db_err)?
            .ok_or_else(|| StoreError::not_found("proposal", proposal_id))?;

        tx.execute(
            "UPDATE proposals SET status = ?1 WHERE id = ?2",
            params![ProposalStatus::Accepted.as_str(), proposal_id],
        )
        .map_err(db_err)?;

        let changed = tx
            .execute(
                "UPDATE task_requests SET status = ?1, assigned_worker_id = ?2 WHERE id = ?3",
                params![TaskRequestStatus::InProgress.as_str(), bidder_id, request_id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            // Rolls back the proposal update when the tx drops.
            return Err(StoreError::not_found("task request", request_id));
        }

        let proposal = Self::fetch(
            &tx,
            &format!("SELECT {PROPOSAL_COLS} FROM proposals WHERE id = ?1"),
            proposal_id,
            "proposal",
            Self::map_proposal,
        )?;
        let request = Self::fetch(
            &tx,
            &format!("SELECT {REQUEST_COLS} FROM task_requests WHERE id = ?1"),
            &request_id,
            "task request",
            Self::map_request,
        )?;

        tx.commit().map_err(db_err)?;
        Ok((proposal, request))
    }

    fn insert_escrow(&self, new: NewEscrowDeal) -> Result<EscrowDeal, StoreError> {
        let deal = factory::build_escrow(new);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO escrow_deals (id, request_id, requester_user_id, worker_user_id, amount, status, ledger_deal_id, completed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                deal.id,
                deal.request_id,
                deal.requester_user_id,
                deal.worker_user_id,
                deal.amount as i64,
                deal.status.as_str(),
                deal.ledger_deal_id.map(|v| v as i64),
                deal.completed_at.as_ref().map(ts_to_sql),
                ts_to_sql(&deal.created_at),
            ],
        )
        .map_err(db_err)?;
        Ok(deal)
    }

    fn get_escrow(&self, id: &str) -> Result<EscrowDeal, StoreError> {
        let conn = self.conn.lock();
        Self::fetch(
            &conn,
            &format!("SELECT {ESCROW_COLS} FROM escrow_deals WHERE id = ?1"),
            id,
            "escrow deal",
            Self::map_escrow,
        )
    }

    fn update_escrow_status(
        &self,
        id: &str,
        status: EscrowStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<EscrowDeal, StoreError> {
        let conn = self.conn.lock();
        let changed = match completed_at {
            Some(ts) => conn
                .execute(
                    "UPDATE escrow_deals SET status = ?1, completed_at = ?2 WHERE id = ?3",
                    params![status.as_str(), ts_to_sql(&ts), id],
                )
                .map_err(db_err)?,
            None => conn
                .execute(
                    "UPDATE escrow_deals SET status = ?1 WHERE id = ?2",
                    params![status.as_str(), id],
                )
                .map_err(db_err)?,
        };
        if changed == 0 {
            return Err(StoreError::not_found("escrow deal", id));
        }
        Self::fetch(
            &conn,
            &format!("SELECT {ESCROW_COLS} FROM escrow_deals WHERE id = ?1"),
            id,
            "escrow deal",
            Self::map_escrow,
        )
    }

    fn insert_direct(&self, new: NewDirectRequest) -> Result<DirectRequest, StoreError> {
        let deal = factory::build_direct(new);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO direct_requests (id, client_address, agent_address, client_user_id, agent_user_id, amount, description, deadline, status, ledger_deal_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                deal.id,
                deal.client_address.as_str(),
                deal.agent_address.as_str(),
                deal.client_user_id,
                deal.agent_user_id,
                deal.amount as i64,
                deal.description,
                ts_to_sql(&deal.deadline),
                deal.status.as_str(),
                deal.ledger_deal_id.map(|v| v as i64),
                ts_to_sql(&deal.created_at),
            ],
        )
        .map_err(db_err)?;
        Ok(deal)
    }

    fn get_direct(&self, id: &str) -> Result<DirectRequest, StoreError> {
        let conn = self.conn.lock();
        Self::fetch(
            &conn,
            &format!("SELECT {DIRECT_COLS} FROM direct_requests WHERE id = ?1"),
            id,
            "direct deal",
            Self::map_direct,
        )
    }

    fn update_direct_status(
        &self,
        id: &str,
        status: DirectStatus,
    ) -> Result<DirectRequest, StoreError> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE direct_requests SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(StoreError::not_found("direct deal", id));
        }
        Self::fetch(
            &conn,
            &format!("SELECT {DIRECT_COLS} FROM direct_requests WHERE id = ?1"),
            id,
            "direct deal",
            Self::map_direct,
        )
    }

    fn list_direct(&self, filter: &DirectFilter) -> Result<Vec<DirectRequest>, StoreError> {
        let mut sql = format!("SELECT {DIRECT_COLS} FROM direct_requests WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if let Some(agent) = &filter.agent {
            sql.push_str(" AND agent_address = ?");
            args.push(agent.as_str().to_string());
        }
        if let Some(client) = &filter.client {
            sql.push_str(" AND client_address = ?");
            args.push(client.as_str().to_string());
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(status.as_str().to_string());
        }
        if let Some(either) = &filter.either {
            sql.push_str(" AND (agent_address = ? OR client_address = ?)");
            args.push(either.as_str().to_string());
            args.push(either.as_str().to_string());
        }
        sql.push_str(" ORDER BY created_at DESC");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), Self::map_direct)
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }
}
