use tokio_util::sync::CancellationToken;

/// Cancel `token` on SIGINT, or SIGTERM on unix. Schedulers that cancel an
/// in-progress job deliver one of these to the old process.
pub fn cancel_on_shutdown_signal(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = wait_for_signal() => {
                tracing::warn!("shutdown signal received, cancelling run");
                token.cancel();
            }
            () = token.cancelled() => {}
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::warn!("cannot install SIGTERM handler: {e}");
            return wait_for_ctrl_c().await;
        }
    };
    tokio::select! {
        () = wait_for_ctrl_c() => {}
        Some(()) = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    settle(tokio::signal::ctrl_c().await).await;
}

/// Resolves only for a signal that was actually received. A listener that
/// failed never resolves, so a setup error cannot cancel the run.
async fn settle(received: std::io::Result<()>) {
    if let Err(e) = received {
        tracing::warn!("cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
