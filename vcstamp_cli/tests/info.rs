mod common;

use predicates::prelude::*;
use vcstamp_core::AnyEmptyResult;

#[test]
fn info_without_vcs() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::vcstamp_cmd()
		.args(["info", "--vcs", "none", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Version control      none"))
		.stdout(predicate::str::contains("Facts").not());

	Ok(())
}

#[test]
fn info_without_vcs_as_json() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::vcstamp_cmd()
		.args(["info", "--format", "json", "--vcs", "none", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("\"facts\":[]"))
		.stdout(predicate::str::contains("\"vcs\":null"));

	Ok(())
}

#[test]
fn info_detects_nothing_in_a_plain_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let plain = tmp.path().join("plain");
	std::fs::create_dir(&plain)?;

	// Only the directory itself and its ancestors are searched, so this
	// is only meaningful when the temp dir is outside any working copy.
	if vcstamp_core::detect_vcs(&plain).is_some() {
		return Ok(());
	}

	common::vcstamp_cmd()
		.arg("info")
		.arg("--path")
		.arg(&plain)
		.assert()
		.success()
		.stdout(predicate::str::contains("Version control      none"))
		.stderr(predicate::str::contains("no version control system detected"));

	Ok(())
}

#[test]
fn info_fails_when_tool_is_missing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_missing_git_config(tmp.path())?;

	common::vcstamp_cmd()
		.arg("info")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicate::str::starts_with(
			"error: Git command `vcstamp-missing-git` could not be found",
		));

	Ok(())
}

#[cfg(unix)]
#[test]
fn info_lists_git_facts() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("vcstamp.toml"),
		"vcs = \"git\"\n\n[tools]\ngit = \"true\"\n",
	)?;

	common::vcstamp_cmd()
		.arg("info")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("Version control      Git"))
		.stdout(predicate::str::contains("revision             0"))
		.stdout(predicate::str::contains("dirty                0"));

	Ok(())
}

#[cfg(unix)]
#[test]
fn info_reports_failing_facts_inline() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("vcstamp.toml"),
		"vcs = \"git\"\n\n[tools]\ngit = \"false\"\n",
	)?;

	common::vcstamp_cmd()
		.args(["info", "--format", "json", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains(
			"\"error\":\"Git command `false rev-list HEAD` exited with code 1: \"",
		))
		.stdout(predicate::str::contains("{\"name\":\"dirty\",\"value\":\"1\"}"));

	common::vcstamp_cmd()
		.arg("info")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains(
			"error: Git command `false describe --all` exited with code 1",
		));

	Ok(())
}
