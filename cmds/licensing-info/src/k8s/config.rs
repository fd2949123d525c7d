//! Resolution of ambient cluster credentials into a kube [`Config`].

use std::path::PathBuf;

use kube::{
	config::{InferConfigError, KubeConfigOptions, Kubeconfig, KubeconfigError},
	Config,
};
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur while resolving the connection configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
	#[error("failed to read kubeconfig `{}`", path.display())]
	ReadKubeconfig {
		path: PathBuf,
		#[source]
		source: KubeconfigError,
	},

	#[error(transparent)]
	Kubeconfig(#[from] KubeconfigError),

	#[error(transparent)]
	Infer(#[from] InferConfigError),
}

/// Where to take cluster credentials from.
///
/// With both fields unset, kube's inference is used: `$KUBECONFIG` or
/// `~/.kube/config`, then the in-cluster service account.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
	/// Explicit kubeconfig file, bypassing `$KUBECONFIG`.
	pub kubeconfig: Option<PathBuf>,
	/// Context to select instead of the kubeconfig's current context.
	pub context: Option<String>,
}

/// Load the connection configuration described by `options`.
#[instrument(skip_all, fields(kubeconfig = ?options.kubeconfig, context = ?options.context))]
pub async fn load(options: &ConnectionOptions) -> Result<Config, ConfigurationError> {
	if let Some(path) = &options.kubeconfig {
		let kubeconfig =
			Kubeconfig::read_from(path).map_err(|source| ConfigurationError::ReadKubeconfig {
				path: path.clone(),
				source,
			})?;
		return from_kubeconfig(kubeconfig, options.context.clone()).await;
	}

	if let Some(context) = &options.context {
		tracing::debug!(context = %context, "using context from the default kubeconfig");
		let config = Config::from_kubeconfig(&KubeConfigOptions {
			context: Some(context.clone()),
			..Default::default()
		})
		.await?;
		return Ok(config);
	}

	Ok(Config::infer().await?)
}

/// Build a configuration from an already parsed kubeconfig.
pub async fn from_kubeconfig(
	kubeconfig: Kubeconfig,
	context: Option<String>,
) -> Result<Config, ConfigurationError> {
	let config = Config::from_custom_kubeconfig(
		kubeconfig,
		&KubeConfigOptions {
			context,
			..Default::default()
		},
	)
	.await?;

	tracing::debug!(cluster_url = %config.cluster_url, "resolved cluster configuration");
	Ok(config)
}
