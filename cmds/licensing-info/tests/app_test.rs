//! Integration tests for the whole pipeline, driven through `app::run`.

use std::path::PathBuf;

use assert_matches::assert_matches;
use async_trait::async_trait;
use k8s_mock::{kubeconfig_for, write_kubeconfig, HttpMockK8sServer};
use licensing_info::{
	app::{self, Settings},
	k8s::config::ConnectionOptions,
	license::{
		ConfigMapReporter, LicenseLevel, LicensingInfo, ReportingError, ResourceReporter,
		LICENSING_CONFIGMAP_NAME,
	},
	Error,
};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

/// Reporter returning a fixed snapshot.
struct FixedReporter(LicensingInfo);

#[async_trait(?Send)]
impl ResourceReporter for FixedReporter {
	async fn get(&self) -> Result<LicensingInfo, ReportingError> {
		Ok(self.0.clone())
	}
}

/// Reporter that always fails.
struct FailingReporter;

#[async_trait(?Send)]
impl ResourceReporter for FailingReporter {
	async fn get(&self) -> Result<LicensingInfo, ReportingError> {
		Err(ReportingError::NotPublished {
			namespace: "elastic-system".to_string(),
			name: LICENSING_CONFIGMAP_NAME.to_string(),
		})
	}
}

fn basic_snapshot() -> LicensingInfo {
	LicensingInfo::new(
		"2019-12-17T11:56:02+01:00",
		LicenseLevel::Basic,
		"5.37GB",
		"1",
	)
	.unwrap()
}

fn settings_for(kubeconfig: PathBuf) -> Settings {
	Settings {
		connection: ConnectionOptions {
			kubeconfig: Some(kubeconfig),
			context: None,
		},
		..Settings::default()
	}
}

/// Start a mock server and write a kubeconfig for it into a temp dir.
async fn cluster(resources: Vec<Value>) -> (k8s_mock::RunningHttpMockK8sServer, TempDir, Settings) {
	let server = HttpMockK8sServer::builder().resources(resources).build().start().await;
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("kubeconfig.yaml");
	server.write_kubeconfig(&path).unwrap();
	(server, dir, settings_for(path))
}

#[tokio::test]
async fn test_prints_reporter_snapshot() {
	let (_server, _dir, settings) = cluster(vec![]).await;
	let mut out = Vec::new();

	app::run(&settings, |_, _| FixedReporter(basic_snapshot()), &mut out)
		.await
		.expect("pipeline should succeed");

	let printed: Map<String, Value> = serde_json::from_slice(&out).unwrap();
	let expected = json!({
		"timestamp": "2019-12-17T11:56:02+01:00",
		"license_level": "basic",
		"memory": "5.37GB",
		"enterprise_resource_units": "1"
	});
	assert_eq!(Value::Object(printed), expected);
	assert!(!out.ends_with(b"\n"));
}

#[tokio::test]
async fn test_prints_published_configmap() {
	let (_server, _dir, settings) = cluster(vec![json!({
		"apiVersion": "v1",
		"kind": "ConfigMap",
		"metadata": {"name": LICENSING_CONFIGMAP_NAME, "namespace": "elastic-system"},
		"data": {
			"timestamp": "2024-03-01T08:00:00Z",
			"license_level": "enterprise_trial",
			"memory": "12.00GB",
			"enterprise_resource_units": "1"
		}
	})])
	.await;
	let mut out = Vec::new();

	app::run(
		&settings,
		|client, settings| ConfigMapReporter::new(client, settings.operator_namespace.clone()),
		&mut out,
	)
	.await
	.unwrap();

	assert_eq!(
		String::from_utf8(out).unwrap(),
		r#"{"timestamp":"2024-03-01T08:00:00Z","license_level":"enterprise_trial","memory":"12.00GB","enterprise_resource_units":"1"}"#
	);
}

#[tokio::test]
async fn test_reporting_failure_prints_nothing() {
	let (_server, _dir, settings) = cluster(vec![]).await;
	let mut out = Vec::new();

	let result = app::run(&settings, |_, _| FailingReporter, &mut out).await;

	assert_matches!(result, Err(Error::Reporting(ReportingError::NotPublished { .. })));
	assert!(out.is_empty());
}

#[tokio::test]
async fn test_configuration_failure_prints_nothing() {
	let dir = tempfile::tempdir().unwrap();
	let settings = settings_for(dir.path().join("missing.yaml"));
	let mut out = Vec::new();

	let result = app::run(
		&settings,
		|_, _| -> FixedReporter { unreachable!("no client without a config") },
		&mut out,
	)
	.await;

	assert_matches!(result, Err(Error::Configuration(_)));
	assert!(out.is_empty());
}

#[tokio::test]
async fn test_unreachable_cluster_prints_nothing() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let uri = format!("http://{}", listener.local_addr().unwrap());
	drop(listener);

	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("kubeconfig.yaml");
	write_kubeconfig(&kubeconfig_for(&uri, "offline"), &path).unwrap();
	let mut out = Vec::new();

	let result = app::run(
		&settings_for(path),
		|_, _| -> FixedReporter { unreachable!("no reporter without a client") },
		&mut out,
	)
	.await;

	assert_matches!(result, Err(Error::ClientConstruction(_)));
	assert!(out.is_empty());
}

#[tokio::test]
async fn test_fetch_returns_snapshot_without_printing() {
	let (_server, _dir, settings) = cluster(vec![]).await;

	let info = app::fetch(&settings, |_, _| FixedReporter(basic_snapshot()))
		.await
		.unwrap();

	assert_eq!(info, basic_snapshot());
}
