// crates.io
use tracing::{Instrument, Span, instrument::Instrumented};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::{_prelude::*, obs::FlowKind};

const DEFAULT_FILTER: &str = "agro_gateway=info,tower_http=info";

/// Span wrapper used by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan(Span);
impl FlowSpan {
	/// Creates a span tagged with the flow kind and call-site stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self(tracing::info_span!("agro_gateway.flow", flow = kind.as_str(), stage))
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.0.clone())
	}
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the default `agro_gateway=info,tower_http=info` filter. Calling this
/// twice is harmless; the second install is ignored.
pub fn init_tracing() {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
	let installed = tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer())
		.try_init();

	if installed.is_err() {
		tracing::debug!("tracing subscriber already installed");
	}
}
