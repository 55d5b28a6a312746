//! # drushqueued Store
//!
//! Client for the Aegir hosting queue stored in MySQL.
//!
//! ## Features
//!
//! - Connection options from a `mysql://` URI or a database name plus a MySQL
//!   option file (`my.cnf`)
//! - Bounded connect timeout, autocommit sessions
//! - The fixed pending-task query, one task per resource per poll
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drushqueued_store::{ConnectOptions, MySqlTaskStore, TaskStore};
//!
//! let options = ConnectOptions::from_uri("mysql://aegir:secret@db/hostmaster")?;
//! let store = MySqlTaskStore::new(options);
//! let mut conn = store.connect().await?;
//! let batch = conn.fetch_pending_batch().await?;
//! ```

pub mod error;
pub mod option_file;
pub mod options;
pub mod store;

pub use error::{ConfigError, StoreError};
pub use option_file::OptionFile;
pub use options::{ConnectForm, ConnectOptions};
pub use store::{MySqlTaskStore, PENDING_TASKS_QUERY, TaskConnection, TaskStore};
