use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn vcstamp_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("vcstamp"));
	cmd.env("NO_COLOR", "1").env_remove("VCSTAMP_LOG");
	cmd
}

/// Write a config that selects Git but points it at an executable that does
/// not exist.
#[allow(dead_code)]
pub fn write_missing_git_config(root: &Path) -> std::io::Result<()> {
	std::fs::write(
		root.join("vcstamp.toml"),
		"vcs = \"git\"\n\n[tools]\ngit = \"vcstamp-missing-git\"\n",
	)
}
