//! # Client Repository
//!
//! Narrow accessor over clients: status, credit limit, and on-the-fly
//! registration for shipments.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::validation::validate_required;
use mostrador_core::{Client, ClientStatus, Money, NewClient};

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Gets a client by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let mut conn = self.pool.acquire().await?;
        fetch_client(&mut conn, id).await
    }

    /// Reads a client's status. NotFound if the client doesn't exist.
    pub async fn read_status(&self, id: &str) -> DbResult<ClientStatus> {
        self.get_by_id(id)
            .await?
            .map(|c| c.status)
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Overwrites a client's status.
    pub async fn write_status(&self, id: &str, status: ClientStatus) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        write_status_in(&mut conn, id, status).await
    }

    /// Reads a client's credit limit.
    pub async fn read_credit_limit(&self, id: &str) -> DbResult<Money> {
        self.get_by_id(id)
            .await?
            .map(|c| c.credit_limit())
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Registers a new active client.
    pub async fn insert(&self, client: &NewClient) -> DbResult<Client> {
        let mut conn = self.pool.acquire().await?;
        insert_client_in(&mut conn, client).await
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

pub(crate) async fn fetch_client(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Client>> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, name, phone, email, address, status, credit_limit_cents, created_at
        FROM clients
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(client)
}

pub(crate) async fn write_status_in(
    conn: &mut SqliteConnection,
    id: &str,
    status: ClientStatus,
) -> DbResult<()> {
    debug!(client_id = %id, status = ?status, "Writing client status");

    let result = sqlx::query("UPDATE clients SET status = ?2 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Client", id));
    }

    Ok(())
}

pub(crate) async fn insert_client_in(
    conn: &mut SqliteConnection,
    new: &NewClient,
) -> DbResult<Client> {
    validate_required("name", &new.name)?;
    validate_required("address", &new.address)?;

    let client = Client {
        id: Uuid::new_v4().to_string(),
        name: new.name.trim().to_string(),
        phone: new.phone.clone(),
        email: new.email.clone(),
        address: new.address.trim().to_string(),
        status: ClientStatus::Active,
        credit_limit_cents: new.credit_limit_cents.max(0),
        created_at: Utc::now(),
    };

    debug!(id = %client.id, name = %client.name, "Inserting client");

    sqlx::query(
        r#"
        INSERT INTO clients (
            id, name, phone, email, address, status, credit_limit_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&client.id)
    .bind(&client.name)
    .bind(&client.phone)
    .bind(&client.email)
    .bind(&client.address)
    .bind(client.status)
    .bind(client.credit_limit_cents)
    .bind(client.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(client)
}

// =============================================================================
// Unit Tests
// =============================================================================
