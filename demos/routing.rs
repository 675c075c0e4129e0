//! # Cross-Messenger Routing Example
//!
//! Two messengers connect to one directory: "render" publishes frames,
//! "ui" receives them on its own dedicated thread. The message type itself
//! declares where it routes and who may send it.
//!
//! ## Run
//! ```bash
//! cargo run --example routing
//! ```

use std::sync::Arc;
use std::time::Duration;

use msgbus::{
    BusMessage, Messenger, MessengerDirectory, Scheduler, ThreadScheduler, ThreadingBehavior,
};

#[derive(Clone, Debug)]
struct FrameRendered {
    frame: u64,
}

impl BusMessage for FrameRendered {
    // After the render bus's local fan-out, forward to the ui bus.
    fn routing_targets() -> &'static [&'static str] {
        &["ui"]
    }

    // Only the render bus may originate this message.
    fn allowed_sources() -> &'static [&'static str] {
        &["render"]
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let directory = MessengerDirectory::new();

    let render = Messenger::new();
    render.connect(&directory, ThreadingBehavior::Ignore, "render", None)?;

    // The ui messenger captures a single-thread scheduler: every routed
    // delivery runs on that thread, like a UI dispatcher.
    let ui_thread = ThreadScheduler::spawn("ui-thread")?;
    let ui = Messenger::new();
    ui.connect(
        &directory,
        ThreadingBehavior::EnsureHostScheduler,
        "ui",
        Some(Arc::clone(&ui_thread) as Arc<dyn Scheduler>),
    )?;

    let _subscription = ui.subscribe(|message: &FrameRendered| {
        println!(
            " ├─► ui received frame {} on {:?}",
            message.frame,
            std::thread::current().name().unwrap_or("?")
        );
    });

    println!("Publishing frames on the render bus:");
    for frame in 1..=3 {
        render.publish(FrameRendered { frame })?;
    }

    // Publishing from an unlisted source is rejected before any delivery.
    let rogue = Messenger::new();
    match rogue.publish(FrameRendered { frame: 99 }) {
        Err(error) => println!(" └─► rogue publisher rejected: {error}"),
        Ok(()) => println!(" └─► unexpected: rogue publish went through"),
    }

    // Routed deliveries are asynchronous; give the ui thread a moment.
    tokio::time::sleep(Duration::from_millis(200)).await;

    directory.disconnect_all();
    ui_thread.shutdown();
    Ok(())
}
