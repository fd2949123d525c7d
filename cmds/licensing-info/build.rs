use std::process::Command;

/// Placeholder version used until a release pins `Cargo.toml`.
const PLACEHOLDER_VERSION: &str = "0.1.0";

fn main() {
	println!("cargo:rerun-if-changed=.git/HEAD");
	println!("cargo:rerun-if-changed=.git/refs/");

	println!("cargo:rustc-env=LICENSING_INFO_VERSION={}", version());
}

fn version() -> String {
	let cargo_version = env!("CARGO_PKG_VERSION");
	if cargo_version != PLACEHOLDER_VERSION {
		return cargo_version.to_string();
	}

	// Exact tag first (v1.2.3 -> 1.2.3), then the short commit of a dev build
	git(&["describe", "--tags", "--exact-match", "HEAD"])
		.map(|tag| tag.trim_start_matches('v').to_string())
		.or_else(|| git(&["rev-parse", "--short", "HEAD"]))
		.unwrap_or_else(|| cargo_version.to_string())
}

fn git(args: &[&str]) -> Option<String> {
	let output = Command::new("git").args(args).output().ok()?;
	if !output.status.success() {
		return None;
	}
	let stdout = String::from_utf8(output.stdout).ok()?;
	Some(stdout.trim().to_string())
}
