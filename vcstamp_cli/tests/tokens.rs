mod common;

use predicates::prelude::*;
use rstest::rstest;
use vcstamp_core::AnyEmptyResult;

#[test]
fn generic_tokens_are_listed() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::vcstamp_cmd()
		.args(["tokens", "--vcs", "none", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::starts_with("Tokens (generic)"))
		.stdout(predicate::str::contains("  $DATETIME$"))
		.stdout(predicate::str::contains("  $ENVIRONMENT(\"text\",\"text\")$"))
		.stdout(predicate::str::contains("  $FILE(\"text\")$"))
		.stdout(predicate::str::contains("$REVNUM$").not());

	Ok(())
}

#[rstest]
#[case::git("git", "Tokens (Git)", "  $REVNUM_MOD(n)$")]
#[case::hg("hg", "Tokens (Mercurial)", "  $REVIDLONG$")]
#[case::mercurial("mercurial", "Tokens (Mercurial)", "  $CHANGESETDATE$")]
#[case::svn("svn", "Tokens (Subversion)", "  $SUBDIR(\"text\")$")]
#[case::subversion("subversion", "Tokens (Subversion)", "  $REPOPATH$")]
fn vcs_tokens_are_listed(
	#[case] vcs: &str,
	#[case] heading: &str,
	#[case] token: &str,
) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::vcstamp_cmd()
		.args(["tokens", "--vcs", vcs, "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::starts_with(heading))
		.stdout(predicate::str::contains(token));

	Ok(())
}

#[test]
fn tokens_as_json() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::vcstamp_cmd()
		.args(["tokens", "--format", "json", "--vcs", "git", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("\"vcs\":\"git\""))
		.stdout(predicate::str::contains(
			"{\"arity\":\"intArg\",\"name\":\"REVNUM_DIV\",\"usage\":\"$REVNUM_DIV(n)$\"}",
		));

	Ok(())
}

#[test]
fn template_tokens_are_classified() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("template.in"), "a $REVNUM$\n$REVNUM(2)$ $NOPE$")?;

	let output = common::vcstamp_cmd()
		.args(["tokens", "template.in", "--vcs", "git", "--path"])
		.arg(tmp.path())
		.output()?;

	assert!(output.status.success());
	let stdout = String::from_utf8(output.stdout)?;
	insta::assert_snapshot!(stdout, @r"
	template.in:1:3  $REVNUM$  known
	template.in:2:1  $REVNUM(2)$  mismatched
	template.in:2:13  $NOPE$  unknown
	");

	Ok(())
}

#[test]
fn template_tokens_as_json() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("template.in"), "$SUBDIR(\"src\")$ $BRANCH(1)$")?;

	common::vcstamp_cmd()
		.args(["tokens", "template.in", "--format", "json", "--vcs", "svn", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("\"template\":\"template.in\""))
		.stdout(predicate::str::contains("\"arguments\":[\"src\"]"))
		.stdout(predicate::str::contains("\"status\":\"known\""))
		.stdout(predicate::str::contains("\"status\":\"mismatched\""));

	Ok(())
}

#[test]
fn template_without_tokens() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("plain.txt"), "costs $5 or $6")?;

	common::vcstamp_cmd()
		.args(["tokens", "plain.txt", "--vcs", "none", "--path"])
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicate::str::contains("No tokens found in plain.txt."));

	Ok(())
}
