//! # Basic Messenger Example
//!
//! Shows the core subscribe/publish cycle on a single messenger:
//! - strong and weak subscriptions
//! - waiting for one message with cancellation support
//! - the aggregate error a failing subscriber produces
//!
//! ## Run
//! ```bash
//! cargo run --example basic
//! ```

use std::sync::Arc;

use msgbus::{BusMessage, Messenger, PublishError};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug, PartialEq)]
struct JobDone {
    id: u64,
}

impl BusMessage for JobDone {}

struct Dashboard;

impl Dashboard {
    fn on_job_done(&self, message: &JobDone) {
        println!(" ├─► dashboard saw job {}", message.id);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let messenger = Messenger::new();

    // A strong subscription keeps its callable alive until unsubscribed.
    let logger = messenger.subscribe(|message: &JobDone| {
        println!(" ├─► logger saw job {}", message.id);
    });

    // A weak subscription lets the dashboard go away on its own.
    let dashboard = Arc::new(Dashboard);
    let _weak = messenger.subscribe_weak(&dashboard, Dashboard::on_job_done);

    println!("Publishing job 1:");
    messenger.publish(JobDone { id: 1 })?;

    // Once the dashboard is dropped, its subscription prunes itself.
    drop(dashboard);
    println!("Publishing job 2 (dashboard gone):");
    messenger.publish(JobDone { id: 2 })?;
    println!(" └─► {} subscription(s) left", messenger.count_subscriptions());

    // Wait for exactly one message, publishing it from another task.
    let waiter = {
        let messenger = messenger.clone();
        tokio::spawn(async move {
            messenger
                .wait_for_message::<JobDone>(CancellationToken::new())
                .await
        })
    };
    while messenger.count_subscriptions_for::<JobDone>() < 2 {
        tokio::task::yield_now().await;
    }
    messenger.publish(JobDone { id: 3 })?;
    println!("Waited for: {:?}", waiter.await??);

    // A panicking subscriber is collected into one aggregate error; the
    // other subscribers still run.
    let bomb = messenger.subscribe(|_: &JobDone| panic!("simulated failure"));
    match messenger.publish(JobDone { id: 4 }) {
        Err(PublishError::Delivery { failures, .. }) => {
            println!("Aggregate error with {} failure(s)", failures.len());
        }
        other => println!("Unexpected outcome: {other:?}"),
    }
    bomb.unsubscribe();
    logger.unsubscribe();

    Ok(())
}
