//! Registry of the resource kinds the client is allowed to address.
//!
//! The registry is a plain value built once at startup and handed to
//! [`LicensingClient`](super::client::LicensingClient); there is no global
//! state.

use std::collections::HashMap;

use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use kube::{core::GroupVersionKind, discovery::ApiResource, Resource};
use thiserror::Error;

use super::describe_gvk;

/// Custom resource kinds managed by the ECK operator: (group, version, kind, plural).
const ECK_KINDS: &[(&str, &str, &str, &str)] = &[
	("elasticsearch.k8s.elastic.co", "v1", "Elasticsearch", "elasticsearches"),
	("kibana.k8s.elastic.co", "v1", "Kibana", "kibanas"),
	("apm.k8s.elastic.co", "v1", "ApmServer", "apmservers"),
	("enterprisesearch.k8s.elastic.co", "v1", "EnterpriseSearch", "enterprisesearches"),
	("beat.k8s.elastic.co", "v1beta1", "Beat", "beats"),
	("agent.k8s.elastic.co", "v1alpha1", "Agent", "agents"),
	("maps.k8s.elastic.co", "v1alpha1", "ElasticMapsServer", "elasticmapsservers"),
	("logstash.k8s.elastic.co", "v1alpha1", "Logstash", "logstashes"),
];

/// Errors raised while building or querying a [`Scheme`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemeError {
	#[error("invalid registration for {gvk}: {reason}")]
	Invalid { gvk: String, reason: &'static str },

	#[error("{gvk} is already registered as `{existing}`, refusing `{requested}`")]
	Conflict {
		gvk: String,
		existing: String,
		requested: String,
	},

	#[error("no kind is registered for {0}")]
	NotRegistered(String),

	#[error("the scheme has no registered kinds")]
	Empty,
}

/// Mapping from GroupVersionKind to the API resource used to reach it.
#[derive(Debug, Clone, Default)]
pub struct Scheme {
	kinds: HashMap<GroupVersionKind, ApiResource>,
}

impl Scheme {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a statically typed resource.
	pub fn register<K>(&mut self) -> Result<(), SchemeError>
	where
		K: Resource<DynamicType = ()>,
	{
		self.register_resource(ApiResource::erase::<K>(&()))
	}

	/// Register a resource known only by its coordinates.
	///
	/// Registering an identical entry twice is a no-op; registering a
	/// different plural for an existing kind is a conflict.
	pub fn register_resource(&mut self, resource: ApiResource) -> Result<(), SchemeError> {
		let gvk = GroupVersionKind::gvk(&resource.group, &resource.version, &resource.kind);
		validate(&gvk, &resource)?;

		if let Some(existing) = self.kinds.get(&gvk) {
			if existing.plural != resource.plural {
				return Err(SchemeError::Conflict {
					gvk: describe_gvk(&gvk),
					existing: existing.plural.clone(),
					requested: resource.plural,
				});
			}
			return Ok(());
		}

		tracing::trace!(gvk = %describe_gvk(&gvk), plural = %resource.plural, "registered kind");
		self.kinds.insert(gvk, resource);
		Ok(())
	}

	/// Look up the API resource for a kind.
	pub fn resolve(&self, gvk: &GroupVersionKind) -> Result<&ApiResource, SchemeError> {
		self.kinds
			.get(gvk)
			.ok_or_else(|| SchemeError::NotRegistered(describe_gvk(gvk)))
	}

	/// Look up the API resource for a statically typed resource.
	pub fn resolve_type<K>(&self) -> Result<&ApiResource, SchemeError>
	where
		K: Resource<DynamicType = ()>,
	{
		self.resolve(&gvk_of::<K>())
	}

	pub fn contains(&self, gvk: &GroupVersionKind) -> bool {
		self.kinds.contains_key(gvk)
	}

	pub fn len(&self) -> usize {
		self.kinds.len()
	}

	pub fn is_empty(&self) -> bool {
		self.kinds.is_empty()
	}
}

/// GroupVersionKind of a statically typed resource.
pub fn gvk_of<K>() -> GroupVersionKind
where
	K: Resource<DynamicType = ()>,
{
	GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()))
}

fn validate(gvk: &GroupVersionKind, resource: &ApiResource) -> Result<(), SchemeError> {
	let invalid = |reason| SchemeError::Invalid {
		gvk: describe_gvk(gvk),
		reason,
	};

	if gvk.version.is_empty() {
		return Err(invalid("version must not be empty"));
	}
	if !gvk.kind.starts_with(|c: char| c.is_ascii_uppercase()) {
		return Err(invalid("kind must start with an uppercase letter"));
	}
	if resource.plural.is_empty() {
		return Err(invalid("plural must not be empty"));
	}
	Ok(())
}

/// Build the scheme used to talk to an ECK-managed cluster: the core kinds
/// the operator publishes its state in, plus every ECK custom resource.
pub fn setup_eck_scheme() -> Result<Scheme, SchemeError> {
	let mut scheme = Scheme::new();
	scheme.register::<ConfigMap>()?;
	scheme.register::<Secret>()?;
	scheme.register::<Namespace>()?;

	for (group, version, kind, plural) in ECK_KINDS {
		let gvk = GroupVersionKind::gvk(group, version, kind);
		scheme.register_resource(ApiResource::from_gvk_with_plural(&gvk, plural))?;
	}

	tracing::debug!(kinds = scheme.len(), "scheme ready");
	Ok(scheme)
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use k8s_openapi::api::apps::v1::Deployment;

	use super::*;

	fn resource(group: &str, version: &str, kind: &str, plural: &str) -> ApiResource {
		ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(group, version, kind), plural)
	}

	#[test]
	fn test_eck_scheme_contains_core_and_custom_kinds() {
		let scheme = setup_eck_scheme().unwrap();

		assert_eq!(scheme.len(), 3 + ECK_KINDS.len());
		assert!(scheme.contains(&gvk_of::<ConfigMap>()));
		assert!(scheme.contains(&GroupVersionKind::gvk(
			"elasticsearch.k8s.elastic.co",
			"v1",
			"Elasticsearch"
		)));

		let kibana = scheme
			.resolve(&GroupVersionKind::gvk("kibana.k8s.elastic.co", "v1", "Kibana"))
			.unwrap();
		assert_eq!(kibana.plural, "kibanas");
		assert_eq!(kibana.api_version, "kibana.k8s.elastic.co/v1");
	}

	#[test]
	fn test_register_static_type() {
		let mut scheme = Scheme::new();
		scheme.register::<ConfigMap>().unwrap();

		let resolved = scheme.resolve_type::<ConfigMap>().unwrap();
		assert_eq!(resolved.plural, "configmaps");
		assert_eq!(resolved.api_version, "v1");
	}

	#[test]
	fn test_register_is_idempotent() {
		let mut scheme = Scheme::new();
		scheme.register::<Secret>().unwrap();
		scheme.register::<Secret>().unwrap();
		assert_eq!(scheme.len(), 1);
	}

	#[test]
	fn test_conflicting_plural_is_rejected() {
		let mut scheme = Scheme::new();
		scheme
			.register_resource(resource("kibana.k8s.elastic.co", "v1", "Kibana", "kibanas"))
			.unwrap();

		let result =
			scheme.register_resource(resource("kibana.k8s.elastic.co", "v1", "Kibana", "kibana"));
		assert_eq!(
			result,
			Err(SchemeError::Conflict {
				gvk: "kibana.k8s.elastic.co/v1, Kind=Kibana".to_string(),
				existing: "kibanas".to_string(),
				requested: "kibana".to_string(),
			})
		);
	}

	#[test]
	fn test_malformed_registrations() {
		let mut scheme = Scheme::new();

		assert_matches!(
			scheme.register_resource(resource("example.com", "", "Widget", "widgets")),
			Err(SchemeError::Invalid { reason, .. }) if reason == "version must not be empty"
		);
		assert_matches!(
			scheme.register_resource(resource("example.com", "v1", "widget", "widgets")),
			Err(SchemeError::Invalid { reason, .. }) if reason == "kind must start with an uppercase letter"
		);
		assert_matches!(
			scheme.register_resource(resource("example.com", "v1", "Widget", "")),
			Err(SchemeError::Invalid { reason, .. }) if reason == "plural must not be empty"
		);
		assert!(scheme.is_empty());
	}

	#[test]
	fn test_unregistered_kind() {
		let scheme = setup_eck_scheme().unwrap();
		assert_eq!(
			scheme.resolve_type::<Deployment>().unwrap_err(),
			SchemeError::NotRegistered("apps/v1, Kind=Deployment".to_string())
		);
	}
}
