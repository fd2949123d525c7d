//! Print the licensing information of the Elastic stack managed by the ECK
//! operator: the license level, the total memory of all managed components
//! and its equivalent in enterprise resource units.
//!
//! ```text
//! $ licensing-info
//! {"timestamp":"2019-12-17T11:56:02+01:00","license_level":"basic","memory":"5.37GB","enterprise_resource_units":"1"}
//! ```

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use licensing_info::{
	app::{self, Settings},
	k8s::config::ConnectionOptions,
	license::{ConfigMapReporter, DEFAULT_OPERATOR_NAMESPACE},
	output::BrokenPipeGuard,
	telemetry,
};
use tokio::runtime::Runtime;
use tracing::{error, Level};

#[cfg(all(
	target_os = "linux",
	feature = "mimalloc",
	not(feature = "system-alloc")
))]
#[global_allocator]
static GLOBAL: mimallocator::Mimalloc = mimallocator::Mimalloc;

#[derive(Parser)]
#[command(name = "licensing-info")]
#[command(about = "Print the licensing information of the Elastic stack managed by ECK", long_about = None)]
#[command(version = env!("LICENSING_INFO_VERSION"))]
struct Cli {
	/// Kubeconfig file to use instead of $KUBECONFIG, ~/.kube/config or the in-cluster config
	#[arg(long)]
	kubeconfig: Option<PathBuf>,

	/// Kubeconfig context to use instead of the current context
	#[arg(long, env = "LICENSING_INFO_CONTEXT")]
	context: Option<String>,

	/// Namespace the operator runs in
	#[arg(long, env = "OPERATOR_NAMESPACE", default_value = DEFAULT_OPERATOR_NAMESPACE)]
	operator_namespace: String,

	/// Log level (possible values: trace, debug, info, warn, error). Defaults to RUST_LOG, then info
	#[arg(long)]
	log_level: Option<Level>,
}

impl Cli {
	fn settings(&self) -> Settings {
		Settings {
			connection: ConnectionOptions {
				kubeconfig: self.kubeconfig.clone(),
				context: self.context.clone(),
			},
			operator_namespace: self.operator_namespace.clone(),
		}
	}
}

fn runtime() -> Result<Runtime> {
	tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.context("failed to build tokio runtime")
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	let runtime = match runtime() {
		Ok(runtime) => runtime,
		Err(err) => {
			eprintln!("{err:#}");
			return ExitCode::FAILURE;
		}
	};
	let _runtime_context = runtime.enter();

	let _telemetry = match telemetry::init(cli.log_level).context("failed to initialize logging") {
		Ok(guard) => guard,
		Err(err) => {
			eprintln!("{err:#}");
			return ExitCode::FAILURE;
		}
	};

	let settings = cli.settings();
	let stdout = BrokenPipeGuard::new(std::io::stdout().lock());

	let result = runtime.block_on(app::run(
		&settings,
		|client, settings| ConfigMapReporter::new(client, settings.operator_namespace.clone()),
		stdout,
	));

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("{:#}", anyhow::Error::from(err));
			ExitCode::FAILURE
		}
	}
}
