//! Demo: a clean task, a failing task and a duplicate name, each in its own
//! worker process.
//!
//! The binary is also its own worker program: when spawned by a supervisor it
//! serves the protocol and exits.
//!
//! ```text
//! RUST_LOG=debug cargo run --bin procvisor-demo
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use procvisor::{Config, LogWriter, Runtime, RuntimeError, Subscribe};
use tracing_subscriber::EnvFilter;

mod tasks;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to the signal channel in worker processes.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    if let Some(code) = procvisor::worker::serve_if_spawned(&tasks::catalog()).await {
        return code;
    }

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let runtime = Runtime::builder(Config::default())
        .with_subscribers(subs)
        .build();
    let guard = runtime.shutdown_guard();

    let result = tokio::select! {
        r = scenarios(&runtime) => r,
        killed = runtime.shutdown_on_signal() => {
            tracing::warn!(?killed, "interrupted");
            Ok(())
        }
    };
    drop(guard);
    runtime.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, label = e.as_label(), "demo failed");
            ExitCode::FAILURE
        }
    }
}

async fn scenarios(runtime: &Runtime) -> Result<(), RuntimeError> {
    // Clean round trip.
    let mut echo = runtime.supervisor("echo-1", tasks::echo())?;
    echo.start().await?;
    echo.send_signal("ping").await?;
    echo.send_signal("ping").await?;
    echo.close().await?;

    // Fault captured in the worker, surfaced on close.
    let mut boom = runtime.supervisor("boom-1", tasks::boom())?;
    boom.start().await?;
    boom.send_signal("detonate").await?;
    boom.send_signal("ping").await?;
    match boom.close().await {
        Err(RuntimeError::WorkerFaulted { name, report }) => {
            tracing::info!(%name, "worker fault surfaced on close");
            eprintln!("{report}");
        }
        other => other?,
    }

    // Same name twice while the first is running.
    let mut first = runtime.supervisor("t1", tasks::echo())?;
    first.start().await?;
    let mut second = runtime.supervisor("t1", tasks::echo())?;
    if let Err(e) = second.start().await {
        tracing::info!(error = %e, "second start rejected");
    }
    first.send_signal("ping").await?;
    first.close().await?;

    tracing::info!(active = ?runtime.active().await, "done");
    Ok(())
}
