//! Termination signal handling

/// Resolve once the OS asks the process to stop.
///
/// Listens for SIGINT, SIGTERM and SIGHUP on Unix and Ctrl-C elsewhere.
/// SIGKILL cannot be observed.
#[cfg(unix)]
pub async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};

    let kinds = [SignalKind::interrupt(), SignalKind::terminate(), SignalKind::hangup()];
    let mut streams = Vec::with_capacity(kinds.len());
    for kind in kinds {
        match signal(kind) {
            Ok(stream) => streams.push(stream),
            Err(e) => tracing::warn!("Failed to install handler for {:?}: {}", kind, e),
        }
    }

    if streams.is_empty() {
        wait_for_ctrl_c().await;
        return;
    }

    let waits = streams.iter_mut().map(|s| Box::pin(s.recv()));
    futures_util::future::select_all(waits).await;
}

#[cfg(not(unix))]
pub async fn wait_for_termination() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
