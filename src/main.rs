//! drushqueued - run queued Aegir hosting tasks as soon as they show up.
//!
//! Polls the hostmaster database for pending hosting tasks and runs
//! `drush @hostmaster hosting-task <nid>` for each, optionally announcing
//! task starts and ends to a webhook and to event-stream clients.

mod cli;
mod logging;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use drushqueued_channel_sse::{EventStreamServer, SseSink, SubscriberRegistry};
use drushqueued_channel_webhook::WebhookSink;
use drushqueued_daemon::{CommandExecutor, EventPublisher, QueueRunner};
use drushqueued_store::MySqlTaskStore;

use crate::cli::Cli;

/// Print a startup error and exit with status 1.
fn fatal(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.loglevel, cli.log_file.as_deref())?;

    let options = cli.connect_options().unwrap_or_else(|e| fatal(e));
    let config = cli.runner_config();

    let mut publisher = EventPublisher::new();

    if let Some(webhook) = cli.webhook_config() {
        info!("Forwarding task events to {}", webhook.url);
        let sink = WebhookSink::new(webhook).unwrap_or_else(|e| fatal(e));
        publisher.add_sink(Arc::new(sink));
    }

    if let Some(sse) = cli.event_stream_config() {
        let registry = Arc::new(SubscriberRegistry::new());
        let server = EventStreamServer::bind(&sse, registry.clone())
            .await
            .unwrap_or_else(|e| fatal(e));
        info!("Serving task events on http://{}/eventsource/", server.local_addr());
        server.spawn();
        publisher.add_sink(Arc::new(SseSink::new(registry)));
    }

    let store = Arc::new(MySqlTaskStore::new(options));
    let executor = Arc::new(CommandExecutor::from_config(&config));
    let runner = QueueRunner::new(config, store, executor, publisher)?;

    runner.run().await;

    Ok(())
}
