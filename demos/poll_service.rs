//! # Example: Outbox Poller
//!
//! A queue of outbound messages is drained by at most three concurrent workers.
//! Every fifth message fails to show how failures surface as events while
//! dispatch carries on.
//!
//! Run with:
//! ```text
//! RUST_LOG=pollvisor=debug cargo run --example poll_service --features logging
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use pollvisor::{
    ExecutorFn, LogWriter, Service, ServiceConfig, Subscribe, TaskError, TaskSource,
};

/// In-memory outbox standing in for a database table.
struct Outbox {
    pending: Mutex<VecDeque<u32>>,
}

#[async_trait]
impl TaskSource for Outbox {
    type Task = u32;

    async fn fetch_next(&self) -> Result<Option<u32>, TaskError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|e| TaskError::fail(e.to_string()))?;
        Ok(pending.pop_front())
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pollvisor=info")),
        )
        .init();

    let outbox = Outbox {
        pending: Mutex::new((1..=20).collect()),
    };
    let deliver = ExecutorFn::new(|id: u32| async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        if id % 5 == 0 {
            return Err(TaskError::fail(format!("recipient of message {id} rejected it")));
        }
        println!("[outbox] delivered message {id}");
        Ok(())
    });

    let cfg = ServiceConfig::new("outbox")
        .with_idle_interval(Duration::from_secs(1))
        .with_busy_interval(Duration::from_millis(50))
        .with_max_workers(3)
        .with_exit_timeout(Duration::from_secs(2));

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let service = Service::builder(cfg, outbox, deliver)
        .with_subscribers(subs)
        .build()?;

    service.start()?;
    tokio::time::sleep(Duration::from_secs(3)).await;
    println!(
        "[main] state={} active_workers={}",
        service.state(),
        service.active_workers()
    );

    service.stop().await?;
    service.dispose().await;
    Ok(())
}
