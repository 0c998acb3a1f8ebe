// ABOUTME: Shutdown signal handling for in-flight deployments.
// ABOUTME: Resolves on SIGINT or SIGTERM so the pipeline future can be dropped.

/// Wait for SIGINT or SIGTERM.
///
/// If a handler cannot be installed the corresponding branch never resolves.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let terminate = async {
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!("failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            () = terminate => {
                tracing::warn!("SIGTERM received, aborting");
            }
            () = ctrl_c() => {
                tracing::warn!("SIGINT received, aborting");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
        tracing::warn!("Ctrl+C received, aborting");
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
