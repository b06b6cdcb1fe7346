//! HTTP surface: axum router, session extractors, protected-page guard, and proxy handlers.

pub mod envelope;
pub mod guard;
pub mod handlers;
pub mod routes;
pub mod session;
pub mod state;

pub use envelope::*;
pub use routes::router;
pub use session::{OptionalSession, RequiredSession};
pub use state::AppState;

// crates.io
use tokio::{net::TcpListener, signal};
// self
use crate::{_prelude::*, config::GatewayConfig, error::TransportError};

/// Builds the gateway from `config` and serves it until Ctrl+C or SIGTERM.
pub async fn serve(config: GatewayConfig) -> Result<()> {
	let bind_addr = config.bind_addr;
	let state = AppState::from_config(config)?;
	let listener = TcpListener::bind(bind_addr).await.map_err(TransportError::from)?;

	tracing::info!(%bind_addr, "gateway listening");

	axum::serve(listener, router(state))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(TransportError::from)?;

	tracing::info!("gateway stopped");

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		match signal::ctrl_c().await {
			Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
			Err(e) => {
				tracing::warn!(error = %e, "failed to install Ctrl+C handler");

				std::future::pending::<()>().await;
			},
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;

				tracing::info!("received terminate signal, shutting down");
			},
			Err(e) => {
				tracing::warn!(error = %e, "failed to install terminate handler");

				std::future::pending::<()>().await;
			},
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
