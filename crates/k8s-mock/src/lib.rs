//! Mock Kubernetes API server for testing.
//!
//! Provides an HTTP server that can be used with kubeconfig-based connections.

pub mod http;
pub mod paths;

pub use http::{kubeconfig_for, write_kubeconfig, HttpMockK8sServer, RunningHttpMockK8sServer};
