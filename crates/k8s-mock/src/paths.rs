//! Mapping from manifests to the REST paths the API server serves them on.

/// A kind the mock server knows how to route.
pub struct KnownKind {
	pub api_version: &'static str,
	pub kind: &'static str,
	pub plural: &'static str,
	pub namespaced: bool,
}

impl KnownKind {
	const fn namespaced(api_version: &'static str, kind: &'static str, plural: &'static str) -> Self {
		Self {
			api_version,
			kind,
			plural,
			namespaced: true,
		}
	}

	const fn cluster_scoped(
		api_version: &'static str,
		kind: &'static str,
		plural: &'static str,
	) -> Self {
		Self {
			api_version,
			kind,
			plural,
			namespaced: false,
		}
	}
}

/// Core kinds plus the ECK custom resources.
pub const KNOWN_KINDS: &[KnownKind] = &[
	KnownKind::namespaced("v1", "ConfigMap", "configmaps"),
	KnownKind::namespaced("v1", "Secret", "secrets"),
	KnownKind::cluster_scoped("v1", "Namespace", "namespaces"),
	KnownKind::namespaced("elasticsearch.k8s.elastic.co/v1", "Elasticsearch", "elasticsearches"),
	KnownKind::namespaced("kibana.k8s.elastic.co/v1", "Kibana", "kibanas"),
	KnownKind::namespaced("apm.k8s.elastic.co/v1", "ApmServer", "apmservers"),
	KnownKind::namespaced("enterprisesearch.k8s.elastic.co/v1", "EnterpriseSearch", "enterprisesearches"),
	KnownKind::namespaced("beat.k8s.elastic.co/v1beta1", "Beat", "beats"),
	KnownKind::namespaced("agent.k8s.elastic.co/v1alpha1", "Agent", "agents"),
	KnownKind::namespaced("maps.k8s.elastic.co/v1alpha1", "ElasticMapsServer", "elasticmapsservers"),
	KnownKind::namespaced("logstash.k8s.elastic.co/v1alpha1", "Logstash", "logstashes"),
];

/// Collection path and name of a manifest, e.g.
/// (`/api/v1/namespaces/default/configmaps`, `my-config`).
///
/// Returns `None` for manifests without apiVersion, kind or name, or of a kind
/// the mock does not know.
pub fn collection_path(manifest: &serde_json::Value) -> Option<(String, String)> {
	let api_version = manifest.get("apiVersion")?.as_str()?;
	let kind = manifest.get("kind")?.as_str()?;
	let metadata = manifest.get("metadata")?;
	let name = metadata.get("name")?.as_str()?.to_string();
	let namespace = metadata
		.get("namespace")
		.and_then(|n| n.as_str())
		.unwrap_or("default");

	let known = KNOWN_KINDS
		.iter()
		.find(|k| k.api_version == api_version && k.kind == kind)?;

	let root = if api_version.contains('/') {
		format!("/apis/{}", api_version)
	} else {
		format!("/api/{}", api_version)
	};

	let path = if known.namespaced {
		format!("{}/namespaces/{}/{}", root, namespace, known.plural)
	} else {
		format!("{}/{}", root, known.plural)
	};

	Some((path, name))
}

/// Split a request path into (collection path, trailing segment).
pub fn split_last_segment(path: &str) -> (&str, &str) {
	let path = path.trim_end_matches('/');
	match path.rfind('/') {
		Some(idx) => (&path[..idx], &path[idx + 1..]),
		None => (path, ""),
	}
}
