use assert_cmd::Command;
use confix_core::AnyResult;

/// The `confix` binary with color disabled and a clean log filter.
pub fn confix_cmd() -> AnyResult<Command> {
	let mut cmd = Command::cargo_bin("confix")?;
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	Ok(cmd)
}
