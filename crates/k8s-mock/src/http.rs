//! HTTP mock of the Kubernetes API server, backed by wiremock.
//!
//! Serves `/version` and read-only GET/LIST access to a fixed set of
//! manifests. Clients connect through a generated kubeconfig, exactly as they
//! would to a real cluster.

use std::{collections::HashMap, io, path::Path, sync::Arc};

use bon::Builder;
use kube::config::{
	AuthInfo, Cluster, Context, Kubeconfig, NamedAuthInfo, NamedCluster, NamedContext,
};
use tracing::{debug, trace};
use wiremock::{
	matchers::{method, path, path_regex},
	Mock, MockServer, Request, ResponseTemplate,
};

use crate::paths::{collection_path, split_last_segment};

/// Manifests keyed by (collection path, name).
type Resources = HashMap<(String, String), serde_json::Value>;

/// A mock Kubernetes server exposed over HTTP.
#[derive(Builder)]
pub struct HttpMockK8sServer {
	/// Manifests to serve. Their REST path is derived from apiVersion/kind.
	#[builder(default)]
	resources: Vec<serde_json::Value>,
	/// Answer `/version` with 503, as an API server that is up but unhealthy.
	#[builder(default)]
	unavailable: bool,
}

/// A running HTTP mock server instance.
pub struct RunningHttpMockK8sServer {
	server: MockServer,
}

impl HttpMockK8sServer {
	/// Start the mock server with all configured resources.
	pub async fn start(self) -> RunningHttpMockK8sServer {
		let server = MockServer::start().await;
		debug!(uri = %server.uri(), "started mock API server");

		let mut resources = Resources::new();
		for manifest in self.resources {
			match collection_path(&manifest) {
				Some((collection, name)) => {
					trace!(collection = %collection, name = %name, "registered resource");
					resources.insert((collection, name), manifest);
				}
				None => debug!(manifest = %manifest, "skipping manifest of unknown kind"),
			}
		}

		mount_version(&server, self.unavailable).await;
		mount_resources(&server, Arc::new(resources)).await;

		RunningHttpMockK8sServer { server }
	}
}

impl RunningHttpMockK8sServer {
	/// The server's URI (e.g. "http://127.0.0.1:12345").
	pub fn uri(&self) -> String {
		self.server.uri()
	}

	/// A kubeconfig pointing to this server.
	pub fn kubeconfig(&self) -> Kubeconfig {
		kubeconfig_for(&self.uri(), "mock-context")
	}

	/// Write [`Self::kubeconfig`] as YAML to `path`.
	pub fn write_kubeconfig(&self, path: &Path) -> io::Result<()> {
		write_kubeconfig(&self.kubeconfig(), path)
	}
}

/// A kubeconfig with a single context pointing to `server`.
///
/// Also usable for addresses nothing listens on, to simulate an unreachable
/// cluster.
pub fn kubeconfig_for(server: &str, context_name: &str) -> Kubeconfig {
	let cluster_name = "mock-cluster";
	let user_name = "mock-user";

	Kubeconfig {
		clusters: vec![NamedCluster {
			name: cluster_name.to_string(),
			cluster: Some(Cluster {
				server: Some(server.to_string()),
				insecure_skip_tls_verify: Some(true),
				..Default::default()
			}),
		}],
		contexts: vec![NamedContext {
			name: context_name.to_string(),
			context: Some(Context {
				cluster: cluster_name.to_string(),
				user: Some(user_name.to_string()),
				namespace: Some("default".to_string()),
				..Default::default()
			}),
		}],
		auth_infos: vec![NamedAuthInfo {
			name: user_name.to_string(),
			auth_info: Some(AuthInfo::default()),
		}],
		current_context: Some(context_name.to_string()),
		..Default::default()
	}
}

/// Serialize `kubeconfig` as YAML into `path`.
pub fn write_kubeconfig(kubeconfig: &Kubeconfig, path: &Path) -> io::Result<()> {
	let yaml = serde_yaml::to_string(kubeconfig)
		.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
	std::fs::write(path, yaml)
}

fn status(code: u16, reason: &str, message: &str) -> ResponseTemplate {
	ResponseTemplate::new(code).set_body_json(serde_json::json!({
		"kind": "Status",
		"apiVersion": "v1",
		"metadata": {},
		"status": "Failure",
		"message": message,
		"reason": reason,
		"code": code
	}))
}

async fn mount_version(server: &MockServer, unavailable: bool) {
	let response = if unavailable {
		status(503, "ServiceUnavailable", "the server is currently unable to handle the request")
	} else {
		ResponseTemplate::new(200).set_body_json(serde_json::json!({
			"major": "1",
			"minor": "31",
			"gitVersion": "v1.31.0",
			"gitCommit": "fake",
			"gitTreeState": "clean",
			"buildDate": "2024-08-13T00:00:00Z",
			"goVersion": "go1.22.5",
			"compiler": "gc",
			"platform": "linux/amd64"
		}))
	};

	Mock::given(method("GET"))
		.and(path("/version"))
		.respond_with(response)
		.mount(server)
		.await;
}

async fn mount_resources(server: &MockServer, resources: Arc<Resources>) {
	// Single resource first, then LIST of a collection, then 404
	Mock::given(method("GET"))
		.and(path_regex(r"^/api(s)?/.*"))
		.respond_with(move |req: &Request| {
			let request_path = req.url.path().trim_end_matches('/');
			let (collection, name) = split_last_segment(request_path);

			if let Some(resource) = resources.get(&(collection.to_string(), name.to_string())) {
				return ResponseTemplate::new(200).set_body_json(resource.clone());
			}

			let items: Vec<_> = resources
				.iter()
				.filter(|((res_collection, _), _)| res_collection == request_path)
				.map(|(_, v)| v.clone())
				.collect();

			if !items.is_empty() || is_collection_path(request_path) {
				return ResponseTemplate::new(200).set_body_json(serde_json::json!({
					"kind": "List",
					"apiVersion": "v1",
					"metadata": {"resourceVersion": "1"},
					"items": items
				}));
			}

			status(404, "NotFound", &format!("{} \"{}\" not found", collection, name))
		})
		.mount(server)
		.await;
}

/// Whether `path` names a collection of a known kind rather than an object.
fn is_collection_path(path: &str) -> bool {
	let (_, last) = split_last_segment(path);
	crate::paths::KNOWN_KINDS.iter().any(|k| k.plural == last)
}
