//! Kubernetes plumbing: configuration loading, the type registry and the
//! API client built on top of both.
//!
//! Everything here talks to the cluster through kube-rs; nothing shells out
//! to kubectl.

pub mod client;
pub mod config;
pub mod scheme;

/// Render a GroupVersionKind the way the API server does in its messages
/// (`apps/v1, Kind=Deployment`, or `v1, Kind=ConfigMap` for the core group).
pub fn describe_gvk(gvk: &kube::core::GroupVersionKind) -> String {
	if gvk.group.is_empty() {
		format!("{}, Kind={}", gvk.version, gvk.kind)
	} else {
		format!("{}/{}, Kind={}", gvk.group, gvk.version, gvk.kind)
	}
}
