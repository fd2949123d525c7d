//! License usage snapshot and the reporters that produce it.

use std::{fmt, str::FromStr};

use chrono::DateTime;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub mod reporter;

pub use reporter::{
	ConfigMapReporter, ReportingError, ResourceReporter, DEFAULT_OPERATOR_NAMESPACE,
	LICENSING_CONFIGMAP_NAME,
};

/// License tier the operator runs under.
///
/// Tiers this crate does not know yet are kept as [`LicenseLevel::Other`] and
/// printed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseLevel {
	Basic,
	Enterprise,
	EnterpriseTrial,
	Other(String),
}

impl LicenseLevel {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Basic => "basic",
			Self::Enterprise => "enterprise",
			Self::EnterpriseTrial => "enterprise_trial",
			Self::Other(level) => level,
		}
	}
}

impl fmt::Display for LicenseLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Serialize for LicenseLevel {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl FromStr for LicenseLevel {
	type Err = InvalidField;

	/// Known tiers map to their variant. Anything else must still look like a
	/// tier name: lowercase ASCII letters, digits and `_`, starting with a
	/// letter.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"basic" => Ok(Self::Basic),
			"enterprise" => Ok(Self::Enterprise),
			"enterprise_trial" => Ok(Self::EnterpriseTrial),
			other if is_tier_name(other) => Ok(Self::Other(other.to_string())),
			other => Err(InvalidField::LicenseLevel(other.to_string())),
		}
	}
}

fn is_tier_name(s: &str) -> bool {
	s.starts_with(|c: char| c.is_ascii_lowercase())
		&& s.chars()
			.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// A field of a licensing snapshot that failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidField {
	#[error("timestamp `{0}` is not an RFC 3339 date-time")]
	Timestamp(String),

	#[error("license level `{0}` is not a tier name")]
	LicenseLevel(String),

	#[error("memory must not be empty")]
	Memory,

	#[error("enterprise resource units `{0}` is not a non-negative integer")]
	EnterpriseResourceUnits(String),
}

/// License usage at a point in time.
///
/// The operator owns the formatting of every field; values are carried
/// verbatim. Field order is the
/// order of the serialized keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicensingInfo {
	timestamp: String,
	license_level: LicenseLevel,
	memory: String,
	enterprise_resource_units: String,
}

impl LicensingInfo {
	pub fn new(
		timestamp: impl Into<String>,
		license_level: LicenseLevel,
		memory: impl Into<String>,
		enterprise_resource_units: impl Into<String>,
	) -> Result<Self, InvalidField> {
		let timestamp = timestamp.into();
		let memory = memory.into();
		let enterprise_resource_units = enterprise_resource_units.into();

		if DateTime::parse_from_rfc3339(&timestamp).is_err() {
			return Err(InvalidField::Timestamp(timestamp));
		}
		if memory.trim().is_empty() {
			return Err(InvalidField::Memory);
		}
		if enterprise_resource_units.is_empty()
			|| !enterprise_resource_units.bytes().all(|b| b.is_ascii_digit())
		{
			return Err(InvalidField::EnterpriseResourceUnits(
				enterprise_resource_units,
			));
		}

		Ok(Self {
			timestamp,
			license_level,
			memory,
			enterprise_resource_units,
		})
	}

	pub fn timestamp(&self) -> &str {
		&self.timestamp
	}

	pub fn license_level(&self) -> &LicenseLevel {
		&self.license_level
	}

	pub fn memory(&self) -> &str {
		&self.memory
	}

	pub fn enterprise_resource_units(&self) -> &str {
		&self.enterprise_resource_units
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("basic", LicenseLevel::Basic)]
	#[case("enterprise", LicenseLevel::Enterprise)]
	#[case("enterprise_trial", LicenseLevel::EnterpriseTrial)]
	fn test_license_level_round_trips_through_str(#[case] raw: &str, #[case] level: LicenseLevel) {
		assert_eq!(raw.parse::<LicenseLevel>().unwrap(), level);
		assert_eq!(level.to_string(), raw);
	}

	#[test]
	fn test_unknown_tier_passes_through() {
		let level = "platinum".parse::<LicenseLevel>().unwrap();
		assert_eq!(level, LicenseLevel::Other("platinum".to_string()));
		assert_eq!(level.to_string(), "platinum");
	}

	#[rstest]
	#[case("")]
	#[case("Gold")]
	#[case("enterprise trial")]
	#[case("_basic")]
	fn test_malformed_license_level(#[case] raw: &str) {
		assert_eq!(
			raw.parse::<LicenseLevel>(),
			Err(InvalidField::LicenseLevel(raw.to_string()))
		);
	}

	#[test]
	fn test_unit_count_beyond_u64_is_kept() {
		let units = "184467440737095516160";
		let info = LicensingInfo::new("2019-12-17T11:56:02Z", LicenseLevel::Enterprise, "1.00GB", units)
			.unwrap();
		assert_eq!(info.enterprise_resource_units(), units);
	}

	#[test]
	fn test_valid_snapshot_keeps_values_verbatim() {
		let info = LicensingInfo::new(
			"2019-12-17T11:56:02+01:00",
			LicenseLevel::Basic,
			"5.37GB",
			"1",
		)
		.unwrap();

		assert_eq!(info.timestamp(), "2019-12-17T11:56:02+01:00");
		assert_eq!(info.license_level(), &LicenseLevel::Basic);
		assert_eq!(info.memory(), "5.37GB");
		assert_eq!(info.enterprise_resource_units(), "1");
	}

	#[rstest]
	#[case("yesterday", "1.00GB", "1", InvalidField::Timestamp("yesterday".to_string()))]
	#[case("2019-12-17T11:56:02Z", " ", "1", InvalidField::Memory)]
	#[case(
		"2019-12-17T11:56:02Z",
		"1.00GB",
		"-1",
		InvalidField::EnterpriseResourceUnits("-1".to_string())
	)]
	#[case(
		"2019-12-17T11:56:02Z",
		"1.00GB",
		"1.5",
		InvalidField::EnterpriseResourceUnits("1.5".to_string())
	)]
	fn test_invalid_snapshot(
		#[case] timestamp: &str,
		#[case] memory: &str,
		#[case] units: &str,
		#[case] expected: InvalidField,
	) {
		assert_eq!(
			LicensingInfo::new(timestamp, LicenseLevel::Enterprise, memory, units),
			Err(expected)
		);
	}
}
