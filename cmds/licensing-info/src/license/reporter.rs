//! Sources of [`LicensingInfo`].
//!
//! The ECK operator computes license usage itself and publishes the result in
//! the `elastic-licensing` ConfigMap of its namespace. [`ConfigMapReporter`]
//! reads that snapshot back; it never recomputes anything.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use thiserror::Error;
use tracing::instrument;

use super::{InvalidField, LicenseLevel, LicensingInfo};
use crate::k8s::{client::LicensingClient, scheme::SchemeError};

/// Name of the ConfigMap the operator publishes license usage in.
pub const LICENSING_CONFIGMAP_NAME: &str = "elastic-licensing";

/// Namespace the operator is installed in by default.
pub const DEFAULT_OPERATOR_NAMESPACE: &str = "elastic-system";

/// Errors that can occur while obtaining a licensing snapshot.
#[derive(Debug, Error)]
pub enum ReportingError {
	#[error("ConfigMap {namespace}/{name} not found, is the operator running in `{namespace}`?")]
	NotPublished { namespace: String, name: String },

	#[error("ConfigMap {namespace}/{name} has no `{key}` entry")]
	MissingKey {
		namespace: String,
		name: String,
		key: &'static str,
	},

	#[error("ConfigMap {namespace}/{name} holds an invalid snapshot")]
	Invalid {
		namespace: String,
		name: String,
		#[source]
		source: InvalidField,
	},

	#[error("failed to read ConfigMap {namespace}/{name}")]
	Api {
		namespace: String,
		name: String,
		#[source]
		source: kube::Error,
	},

	#[error(transparent)]
	Scheme(#[from] SchemeError),
}

/// Something that can produce the current license usage.
#[async_trait(?Send)]
pub trait ResourceReporter {
	async fn get(&self) -> Result<LicensingInfo, ReportingError>;
}

/// Reads the snapshot the operator keeps in its licensing ConfigMap.
#[derive(Debug)]
pub struct ConfigMapReporter {
	client: LicensingClient,
	namespace: String,
}

impl ConfigMapReporter {
	pub fn new(client: LicensingClient, namespace: impl Into<String>) -> Self {
		Self {
			client,
			namespace: namespace.into(),
		}
	}

	fn parse(&self, data: &BTreeMap<String, String>) -> Result<LicensingInfo, ReportingError> {
		let field = |key: &'static str| {
			data.get(key).ok_or_else(|| ReportingError::MissingKey {
				namespace: self.namespace.clone(),
				name: LICENSING_CONFIGMAP_NAME.to_string(),
				key,
			})
		};
		let invalid = |source| ReportingError::Invalid {
			namespace: self.namespace.clone(),
			name: LICENSING_CONFIGMAP_NAME.to_string(),
			source,
		};

		let timestamp = field("timestamp")?;
		let license_level = field("license_level")?
			.parse::<LicenseLevel>()
			.map_err(invalid)?;
		let memory = field("memory")?;
		let units = field("enterprise_resource_units")?;

		LicensingInfo::new(timestamp.as_str(), license_level, memory.as_str(), units.as_str())
			.map_err(invalid)
	}
}

#[async_trait(?Send)]
impl ResourceReporter for ConfigMapReporter {
	#[instrument(skip_all, fields(namespace = %self.namespace, name = LICENSING_CONFIGMAP_NAME))]
	async fn get(&self) -> Result<LicensingInfo, ReportingError> {
		let api = self.client.api::<ConfigMap>(&self.namespace)?;

		let configmap = api
			.get_opt(LICENSING_CONFIGMAP_NAME)
			.await
			.map_err(|source| ReportingError::Api {
				namespace: self.namespace.clone(),
				name: LICENSING_CONFIGMAP_NAME.to_string(),
				source,
			})?
			.ok_or_else(|| ReportingError::NotPublished {
				namespace: self.namespace.clone(),
				name: LICENSING_CONFIGMAP_NAME.to_string(),
			})?;

		let info = self.parse(&configmap.data.unwrap_or_default())?;
		tracing::debug!(
			license_level = %info.license_level(),
			memory = %info.memory(),
			"read licensing snapshot"
		);
		Ok(info)
	}
}
