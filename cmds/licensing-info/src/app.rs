//! The licensing-info pipeline: config, scheme, client, reporter, output.
//!
//! Every step returns a typed error; nothing here terminates the process.

use std::io::Write;

use tracing::instrument;

use crate::{
	error::Error,
	k8s::{
		client::LicensingClient,
		config::{self, ConnectionOptions},
		scheme,
	},
	license::{LicensingInfo, ResourceReporter, DEFAULT_OPERATOR_NAMESPACE},
	output,
};

/// Resolved command-line and environment settings.
#[derive(Debug, Clone)]
pub struct Settings {
	pub connection: ConnectionOptions,
	/// Namespace the operator publishes its licensing ConfigMap in.
	pub operator_namespace: String,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			connection: ConnectionOptions::default(),
			operator_namespace: DEFAULT_OPERATOR_NAMESPACE.to_string(),
		}
	}
}

/// Connect to the cluster and ask the reporter built by `make_reporter` for
/// the current licensing snapshot.
#[instrument(skip_all)]
pub async fn fetch<F, R>(settings: &Settings, make_reporter: F) -> Result<LicensingInfo, Error>
where
	F: FnOnce(LicensingClient, &Settings) -> R,
	R: ResourceReporter,
{
	let config = config::load(&settings.connection).await?;
	let scheme = scheme::setup_eck_scheme()?;
	let client = LicensingClient::new(config, scheme).await?;

	let reporter = make_reporter(client, settings);
	Ok(reporter.get().await?)
}

/// Run the whole pipeline and print the snapshot to `writer`.
///
/// The document is rendered before the first byte is written, so a failure
/// anywhere leaves `writer` untouched.
pub async fn run<F, R, W>(settings: &Settings, make_reporter: F, writer: W) -> Result<(), Error>
where
	F: FnOnce(LicensingClient, &Settings) -> R,
	R: ResourceReporter,
	W: Write,
{
	let info = fetch(settings, make_reporter).await?;
	let rendered = output::render(&info)?;
	output::emit(&rendered, writer)?;
	Ok(())
}
