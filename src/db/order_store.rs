use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::statement::prepared::PreparedStatement;
use scylla::value::{CqlValue, Row};
use std::sync::Arc;

use super::StoreError;
use crate::gateway::OrderDocumentStore;
use crate::models::Order;

// ============================================================================
// ScyllaDB Order Store - partitioned, create-only document store
// ============================================================================
//
// The "database" is a keyspace and the "container" a table whose partition key
// is the order id. Inserts use a lightweight transaction (IF NOT EXISTS) so a
// second insert for the same id is rejected instead of overwriting. Only the
// [applied] flag of the response is inspected.
//
// ============================================================================

pub struct ScyllaOrderStore {
    session: Arc<Session>,
    keyspace: String,
    table: String,
    insert_order: PreparedStatement,
}

impl ScyllaOrderStore {
    /// Create keyspace and table if needed and prepare the insert statement.
    /// Names must already be validated identifiers.
    pub async fn new(session: Arc<Session>, keyspace: &str, table: &str) -> Result<Self, StoreError> {
        ensure_schema(&session, keyspace, table).await?;

        let insert_order = session
            .prepare(insert_query(keyspace, table))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tracing::info!(keyspace = %keyspace, table = %table, "Order store ready");

        Ok(Self {
            session,
            keyspace: keyspace.to_string(),
            table: table.to_string(),
            insert_order,
        })
    }

    pub async fn insert_if_absent(&self, order: &Order) -> Result<(), StoreError> {
        let result = self
            .session
            .execute_unpaged(&self.insert_order, (&order.id, &order.product_name, order.price))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let rows = result
            .into_rows_result()
            .map_err(|e| StoreError::Response(e.to_string()))?;
        let row = rows
            .first_row::<Row>()
            .map_err(|e| StoreError::Response(e.to_string()))?;

        if applied_flag(&row)? {
            tracing::debug!(
                order_id = %order.id,
                keyspace = %self.keyspace,
                table = %self.table,
                "Inserted order document"
            );
            Ok(())
        } else {
            Err(StoreError::Conflict { id: order.id.clone() })
        }
    }

    /// Cheap round-trip used by the health monitor
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.session
            .query_unpaged("SELECT now() FROM system.local", &[])
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Query(e.to_string()))
    }
}

#[async_trait]
impl OrderDocumentStore for ScyllaOrderStore {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        self.insert_if_absent(order).await
    }
}

async fn ensure_schema(session: &Session, keyspace: &str, table: &str) -> Result<(), StoreError> {
    session
        .query_unpaged(
            format!(
                "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH REPLICATION = \
                 {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
            ),
            &[],
        )
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

    session
        .query_unpaged(
            format!(
                "CREATE TABLE IF NOT EXISTS {keyspace}.{table} (
                    id text PRIMARY KEY,
                    product_name text,
                    price double
                )"
            ),
            &[],
        )
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

    Ok(())
}

fn insert_query(keyspace: &str, table: &str) -> String {
    format!("INSERT INTO {keyspace}.{table} (id, product_name, price) VALUES (?, ?, ?) IF NOT EXISTS")
}

/// The first column of an LWT response is the boolean `[applied]`.
fn applied_flag(row: &Row) -> Result<bool, StoreError> {
    match row.columns.first() {
        Some(Some(CqlValue::Boolean(applied))) => Ok(*applied),
        other => Err(StoreError::Response(format!(
            "expected [applied] boolean, got {other:?}"
        ))),
    }
}
