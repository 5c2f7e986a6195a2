use crate::BranchFacts;
use crate::CommandExecutor;
use crate::DirtyFacts;
use crate::Fact;
use crate::FactReport;
use crate::ProcessRunner;
use crate::RevisionFacts;
use crate::RevisionIdFacts;
use crate::RunOutcome;
use crate::SystemExecutor;
use crate::VcsKind;
use crate::VcstampResult;
use crate::facts::collect_facts;
use crate::facts::format_flag;

/// Provides Git information for a working copy by running and scraping the
/// `git` command line program.
#[derive(Debug)]
pub struct GitProvider<E = SystemExecutor> {
	runner: ProcessRunner<E>,
	revision_number: Option<i64>,
	revision_id: Option<String>,
	dirty: Option<bool>,
	branch: Option<String>,
	tags: Option<String>,
}

impl<E: CommandExecutor> GitProvider<E> {
	pub fn new(runner: ProcessRunner<E>) -> Self {
		Self {
			runner,
			revision_number: None,
			revision_id: None,
			dirty: None,
			branch: None,
			tags: None,
		}
	}

	pub fn runner(&self) -> &ProcessRunner<E> {
		&self.runner
	}

	/// The output of `git describe`: the nearest tag, suffixed with the
	/// distance and abbreviated hash when `HEAD` is not tagged itself.
	pub fn tags(&mut self) -> VcstampResult<String> {
		if let Some(tags) = &self.tags {
			return Ok(tags.clone());
		}

		let tags = self.runner.first_line(&["describe"])?;
		self.tags = Some(tags.clone());
		Ok(tags)
	}

	/// `git rev-list HEAD` prints one commit per line, newest first. The line
	/// count numbers the revision and the first line identifies it.
	fn load_revision(&mut self) -> VcstampResult<(i64, String)> {
		let mut count: i64 = 0;
		let mut newest: Option<String> = None;
		self.runner.run(
			&["rev-list", "HEAD"],
			&mut |line: &str| {
				if newest.is_none() {
					newest = Some(line.to_string());
				}
				count += 1;
			},
			None,
		)?;

		let id = newest.unwrap_or_default();
		tracing::debug!(revision_number = count, revision_id = %id, "computed git revision");
		self.revision_number = Some(count);
		self.revision_id = Some(id.clone());
		Ok((count, id))
	}
}

impl<E: CommandExecutor> RevisionFacts for GitProvider<E> {
	fn revision_number(&mut self) -> VcstampResult<i64> {
		match self.revision_number {
			Some(number) => Ok(number),
			None => Ok(self.load_revision()?.0),
		}
	}
}

impl<E: CommandExecutor> RevisionIdFacts for GitProvider<E> {
	fn revision_id(&mut self) -> VcstampResult<String> {
		match &self.revision_id {
			Some(id) => Ok(id.clone()),
			None => Ok(self.load_revision()?.1),
		}
	}
}

impl<E: CommandExecutor> DirtyFacts for GitProvider<E> {
	/// `git diff-index --quiet HEAD` exits with 0 for a clean working copy and
	/// 1 for a dirty one. Any other exit code is a real failure.
	fn is_working_copy_dirty(&mut self) -> VcstampResult<bool> {
		if let Some(dirty) = self.dirty {
			return Ok(dirty);
		}

		let mut dirty = None;
		let outcome = self.runner.run(
			&["diff-index", "--quiet", "HEAD"],
			&mut |_: &str| {},
			Some(&mut |exit_code: i32, _: &str| {
				match exit_code {
					0 => {
						dirty = Some(false);
						false
					}
					1 => {
						dirty = Some(true);
						false
					}
					_ => true,
				}
			}),
		)?;

		// Without git the state is unknown, so err on the side of dirty.
		let dirty = match outcome {
			RunOutcome::ToolMissing => true,
			RunOutcome::Completed(_) => dirty.unwrap_or(true),
		};
		self.dirty = Some(dirty);
		Ok(dirty)
	}
}

impl<E: CommandExecutor> BranchFacts for GitProvider<E> {
	/// The first line of `git describe --all`, e.g. `heads/main`.
	fn branch(&mut self) -> VcstampResult<String> {
		if let Some(branch) = &self.branch {
			return Ok(branch.clone());
		}

		let branch = self.runner.first_line(&["describe", "--all"])?;
		self.branch = Some(branch.clone());
		Ok(branch)
	}
}

impl<E: CommandExecutor> FactReport for GitProvider<E> {
	fn vcs(&self) -> Option<VcsKind> {
		Some(VcsKind::Git)
	}

	fn report(&mut self) -> VcstampResult<Vec<Fact>> {
		collect_facts(vec![
			(
				"revision",
				self.revision_number().map(|number| number.to_string()),
			),
			("revision_id", self.revision_id()),
			("dirty", self.is_working_copy_dirty().map(format_flag)),
			("branch", self.branch()),
			("tags", self.tags()),
		])
	}
}
