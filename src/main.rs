//! `agro-gateway` binary: loads configuration from the environment and serves the gateway.

// std
use std::process::ExitCode;
// crates.io
use agro_gateway::{config::GatewayConfig, gateway, obs};

#[tokio::main]
async fn main() -> ExitCode {
	obs::init_tracing();

	let config = match GatewayConfig::from_env() {
		Ok(config) => config,
		Err(e) => {
			tracing::error!(error = %e, "invalid configuration");

			return ExitCode::FAILURE;
		},
	};

	match gateway::serve(config).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			tracing::error!(error = %e, "gateway terminated");

			ExitCode::FAILURE
		},
	}
}
