//! Top-level error of the licensing-info pipeline.

use thiserror::Error;

use crate::{
	k8s::{client::ClientConstructionError, config::ConfigurationError, scheme::SchemeError},
	license::ReportingError,
	output::{OutputError, SerializationError},
};

/// A failed step of the pipeline. Every variant is fatal.
#[derive(Debug, Error)]
pub enum Error {
	#[error("failed to get a Kubernetes config")]
	Configuration(#[from] ConfigurationError),

	#[error("failed to set up the ECK scheme")]
	Scheme(#[from] SchemeError),

	#[error("failed to create a new Kubernetes client")]
	ClientConstruction(#[from] ClientConstructionError),

	#[error("failed to get licensing info")]
	Reporting(#[from] ReportingError),

	#[error("failed to marshal licensing info")]
	Serialization(#[from] SerializationError),

	#[error("failed to print licensing info")]
	Output(#[from] OutputError),
}
