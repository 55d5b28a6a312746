//! Queue store traits and the MySQL implementation.

use async_trait::async_trait;
use sqlx::{Connection, Executor, MySqlConnection};
use tracing::{debug, info};

use drushqueued_protocols::TaskId;

use crate::error::StoreError;
use crate::options::ConnectOptions;

/// Pending hosting tasks, at most one per resource (`rid`), oldest modified
/// node first.
///
/// The cast pins the column to `BIGINT UNSIGNED` so it decodes as `u64`
/// whatever integer width the schema uses for `nid`.
pub const PENDING_TASKS_QUERY: &str = "SELECT CAST(t.nid AS UNSIGNED) AS nid \
     FROM hosting_task AS t \
     INNER JOIN node AS n ON t.vid = n.vid \
     WHERE t.task_status = 0 \
     GROUP BY t.rid \
     ORDER BY n.changed, n.nid ASC";

/// Source of store connections.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Open a new connection. Fails with a connect error or a timeout.
    async fn connect(&self) -> Result<Box<dyn TaskConnection>, StoreError>;

    /// Connection target for log messages.
    fn target(&self) -> String;
}

/// One live store connection.
#[async_trait]
pub trait TaskConnection: Send {
    /// Fetch the pending task batch, in execution order.
    async fn fetch_pending_batch(&mut self) -> Result<Vec<TaskId>, StoreError>;
}

/// Task store backed by the Aegir MySQL database.
pub struct MySqlTaskStore {
    options: ConnectOptions,
}

impl MySqlTaskStore {
    /// Create a store for the given connection options.
    pub fn new(options: ConnectOptions) -> Self {
        Self { options }
    }

    /// Connection options in use.
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    async fn open(&self) -> Result<MySqlConnection, StoreError> {
        let target = self.options.target();
        let timeout = self.options.connect_timeout();

        tokio::time::timeout(timeout, self.handshake())
            .await
            .map_err(|_| StoreError::ConnectTimeout {
                target: target.clone(),
                timeout,
            })?
            .map_err(|source| StoreError::Connect { target, source })
    }

    /// Connect and prepare the session. Bounded by the connect timeout in `open`.
    async fn handshake(&self) -> Result<MySqlConnection, sqlx::Error> {
        let mut conn = MySqlConnection::connect_with(&self.options.to_mysql()).await?;

        // Every poll must see committed rows; never hold a transaction open.
        conn.execute("SET autocommit = 1").await?;

        Ok(conn)
    }
}

#[async_trait]
impl TaskStore for MySqlTaskStore {
    async fn connect(&self) -> Result<Box<dyn TaskConnection>, StoreError> {
        debug!("Connecting to {}", self.options.target());
        let conn = self.open().await?;
        info!("Connected to {}", self.options.target());
        Ok(Box::new(MySqlTaskConnection { conn }))
    }

    fn target(&self) -> String {
        self.options.target()
    }
}

/// A single MySQL session used for polling.
pub struct MySqlTaskConnection {
    conn: MySqlConnection,
}

#[async_trait]
impl TaskConnection for MySqlTaskConnection {
    async fn fetch_pending_batch(&mut self) -> Result<Vec<TaskId>, StoreError> {
        let ids: Vec<u64> = sqlx::query_scalar(PENDING_TASKS_QUERY)
            .fetch_all(&mut self.conn)
            .await?;

        Ok(ids.into_iter().map(TaskId::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_query_groups_by_resource() {
        assert!(PENDING_TASKS_QUERY.contains("GROUP BY t.rid"));
        assert!(PENDING_TASKS_QUERY.contains("WHERE t.task_status = 0"));
        assert!(PENDING_TASKS_QUERY.ends_with("ORDER BY n.changed, n.nid ASC"));
    }

    #[test]
    fn test_store_target() {
        let options = ConnectOptions::from_uri("mysql://aegir:pw@db:3306/hostmaster").unwrap();
        let store = MySqlTaskStore::new(options);
        assert_eq!(store.target(), "db:3306/hostmaster");
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        // Nothing listens on port 1 of the loopback interface.
        let options = ConnectOptions::from_uri("mysql://aegir:pw@127.0.0.1:1/hostmaster")
            .unwrap()
            .with_connect_timeout(Duration::from_secs(5));
        let store = MySqlTaskStore::new(options);

        let err = match store.connect().await {
            Ok(_) => panic!("connect to a closed port succeeded"),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            StoreError::Connect { .. } | StoreError::ConnectTimeout { .. }
        ));
    }

    #[tokio::test]
    async fn test_stalled_server_hits_connect_timeout() {
        // Accepts the TCP connection but never sends the MySQL greeting.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let options = ConnectOptions::from_uri(&format!("mysql://aegir:pw@127.0.0.1:{}/hostmaster", port))
            .unwrap()
            .with_connect_timeout(Duration::from_millis(300));
        let store = MySqlTaskStore::new(options);

        let started = std::time::Instant::now();
        let err = match store.connect().await {
            Ok(_) => panic!("connect to a silent server succeeded"),
            Err(e) => e,
        };
        assert!(matches!(err, StoreError::ConnectTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));

        server.abort();
    }
}
