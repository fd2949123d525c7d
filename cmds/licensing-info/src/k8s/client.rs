//! Typed cluster client bound to a configuration and a [`Scheme`].

use std::fmt::Debug;

use k8s_openapi::apimachinery::pkg::version::Info;
use kube::{
	api::DynamicObject,
	core::{GroupVersionKind, NamespaceResourceScope},
	Api, Client, Config, Resource,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use super::scheme::{Scheme, SchemeError};
use crate::error::Error;

/// Errors that can occur while building the client itself.
#[derive(Debug, Error)]
pub enum ClientConstructionError {
	#[error("failed to build the HTTP client")]
	Build(#[source] kube::Error),

	#[error("API server {server} did not answer the version probe")]
	Unreachable {
		server: String,
		#[source]
		source: kube::Error,
	},
}

/// A connection to the cluster that only addresses kinds known to its scheme.
#[derive(Clone)]
pub struct LicensingClient {
	client: Client,
	scheme: Scheme,
	server_version: Info,
	cluster_url: String,
}

impl Debug for LicensingClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LicensingClient")
			.field("cluster_url", &self.cluster_url)
			.field("server_version", &self.server_version.git_version)
			.field("kinds", &self.scheme.len())
			.finish_non_exhaustive()
	}
}

impl LicensingClient {
	/// Build a client from `config` and `scheme`.
	///
	/// The API server is probed once through `/version`, so an unreachable
	/// cluster fails here rather than in the first real request.
	#[instrument(skip_all, fields(cluster_url = %config.cluster_url))]
	pub async fn new(config: Config, scheme: Scheme) -> Result<Self, Error> {
		if scheme.is_empty() {
			return Err(SchemeError::Empty.into());
		}

		let cluster_url = config.cluster_url.to_string();
		let client = Client::try_from(config).map_err(ClientConstructionError::Build)?;

		let server_version = client.apiserver_version().await.map_err(|source| {
			ClientConstructionError::Unreachable {
				server: cluster_url.clone(),
				source,
			}
		})?;

		tracing::debug!(
			git_version = %server_version.git_version,
			platform = %server_version.platform,
			"connected to API server"
		);

		Ok(Self {
			client,
			scheme,
			server_version,
			cluster_url,
		})
	}

	/// Typed handle on a namespaced kind.
	pub fn api<K>(&self, namespace: &str) -> Result<Api<K>, SchemeError>
	where
		K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
			+ Clone
			+ DeserializeOwned
			+ Debug,
	{
		self.scheme.resolve_type::<K>()?;
		Ok(Api::namespaced(self.client.clone(), namespace))
	}

	/// Untyped handle on a registered kind, scoped to `namespace` if given.
	pub fn dynamic_api(
		&self,
		gvk: &GroupVersionKind,
		namespace: Option<&str>,
	) -> Result<Api<DynamicObject>, SchemeError> {
		let resource = self.scheme.resolve(gvk)?;
		Ok(match namespace {
			Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
			None => Api::all_with(self.client.clone(), resource),
		})
	}

	pub fn server_version(&self) -> &Info {
		&self.server_version
	}

	/// Namespace of the selected kubeconfig context (or the service account).
	pub fn default_namespace(&self) -> &str {
		self.client.default_namespace()
	}

	pub fn cluster_url(&self) -> &str {
		&self.cluster_url
	}
}
