use crate::BranchFacts;
use crate::CommandExecutor;
use crate::DirtyFacts;
use crate::Fact;
use crate::FactReport;
use crate::ProcessRunner;
use crate::RevisionFacts;
use crate::RevisionIdFacts;
use crate::SystemExecutor;
use crate::VcsKind;
use crate::VcstampError;
use crate::VcstampResult;
use crate::facts::collect_facts;
use crate::facts::format_flag;

/// Provides Mercurial information for a working copy by running and
/// scraping the `hg` command line program.
#[derive(Debug)]
pub struct HgProvider<E = SystemExecutor> {
	runner: ProcessRunner<E>,
	revision_number: Option<i64>,
	revision_id: Option<String>,
	long_revision_id: Option<String>,
	dirty: Option<bool>,
	branch: Option<String>,
	tags: Option<String>,
	changeset_date: Option<String>,
}

/// Split the first line of `hg identify` style output into the revision and
/// the dirty flag. Mercurial appends `+` to a revision with local changes.
///
/// No output at all usually means hg is unavailable or the repository has no
/// commits yet. That is reported as revision `"0"` with a dirty working copy
/// rather than as an error.
pub fn parse_identify_output(lines: &[String]) -> (String, bool) {
	let Some(first) = lines.first() else {
		return ("0".to_string(), true);
	};

	match first.find('+') {
		Some(index) => (first[..index].to_string(), true),
		None => (first.clone(), false),
	}
}

impl<E: CommandExecutor> HgProvider<E> {
	pub fn new(runner: ProcessRunner<E>) -> Self {
		Self {
			runner,
			revision_number: None,
			revision_id: None,
			long_revision_id: None,
			dirty: None,
			branch: None,
			tags: None,
			changeset_date: None,
		}
	}

	pub fn runner(&self) -> &ProcessRunner<E> {
		&self.runner
	}

	/// The full 40 character changeset hash from `hg identify -i --debug`.
	pub fn long_revision_id(&mut self) -> VcstampResult<String> {
		if let Some(id) = &self.long_revision_id {
			return Ok(id.clone());
		}

		let id = self.identify(&["identify", "-i", "--debug"])?;
		self.long_revision_id = Some(id.clone());
		Ok(id)
	}

	/// Tags on the working copy parent from `hg identify -t`.
	pub fn tags(&mut self) -> VcstampResult<String> {
		if let Some(tags) = &self.tags {
			return Ok(tags.clone());
		}

		let tags = self.runner.first_line(&["identify", "-t"])?;
		self.tags = Some(tags.clone());
		Ok(tags)
	}

	/// The ISO date of the checked out changeset.
	///
	/// The value is read from the second output line of the templated
	/// `hg log` query, not the first.
	pub fn changeset_date(&mut self) -> VcstampResult<String> {
		if let Some(date) = &self.changeset_date {
			return Ok(date.clone());
		}

		let revision = format!("-r{}", self.revision_number()?);
		let args = ["log", "--template", "{date|isodate}", revision.as_str()];
		let lines = self.runner.run_lines(&args)?;
		let Some(date) = lines.into_iter().nth(1) else {
			return Err(VcstampError::Parse {
				vcs: VcsKind::Mercurial.to_string(),
				command: format!("{} {}", self.runner.program(), args.join(" ")),
				value: String::new(),
				reason: "expected the date on the second output line".to_string(),
			});
		};

		self.changeset_date = Some(date.clone());
		Ok(date)
	}

	/// Run an identify-style command and record the dirty flag it implies,
	/// unless an earlier command already did.
	fn identify(&mut self, args: &[&str]) -> VcstampResult<String> {
		let lines = self.runner.run_lines(args)?;
		let (revision, dirty) = parse_identify_output(&lines);
		if self.dirty.is_none() {
			tracing::debug!(dirty, "computed mercurial dirty flag");
			self.dirty = Some(dirty);
		}
		Ok(revision)
	}
}

impl<E: CommandExecutor> RevisionFacts for HgProvider<E> {
	fn revision_number(&mut self) -> VcstampResult<i64> {
		if let Some(number) = self.revision_number {
			return Ok(number);
		}

		let value = self.identify(&["identify", "-n"])?;
		let number = value
			.parse::<i64>()
			.map_err(|error| {
				VcstampError::Parse {
					vcs: VcsKind::Mercurial.to_string(),
					command: format!("{} identify -n", self.runner.program()),
					value: value.clone(),
					reason: error.to_string(),
				}
			})?;

		tracing::debug!(revision_number = number, "computed mercurial revision");
		self.revision_number = Some(number);
		Ok(number)
	}
}

impl<E: CommandExecutor> RevisionIdFacts for HgProvider<E> {
	fn revision_id(&mut self) -> VcstampResult<String> {
		if let Some(id) = &self.revision_id {
			return Ok(id.clone());
		}

		let id = self.identify(&["identify", "-i"])?;
		self.revision_id = Some(id.clone());
		Ok(id)
	}
}

impl<E: CommandExecutor> DirtyFacts for HgProvider<E> {
	fn is_working_copy_dirty(&mut self) -> VcstampResult<bool> {
		if let Some(dirty) = self.dirty {
			return Ok(dirty);
		}

		self.revision_number()?;
		// `identify` always records the flag, this is only reachable if the
		// revision number was memoized without it.
		Ok(self.dirty.unwrap_or(true))
	}
}

impl<E: CommandExecutor> BranchFacts for HgProvider<E> {
	fn branch(&mut self) -> VcstampResult<String> {
		if let Some(branch) = &self.branch {
			return Ok(branch.clone());
		}

		let branch = self.runner.first_line(&["identify", "-b"])?;
		self.branch = Some(branch.clone());
		Ok(branch)
	}
}

impl<E: CommandExecutor> FactReport for HgProvider<E> {
	fn vcs(&self) -> Option<VcsKind> {
		Some(VcsKind::Mercurial)
	}

	fn report(&mut self) -> VcstampResult<Vec<Fact>> {
		collect_facts(vec![
			(
				"revision",
				self.revision_number().map(|number| number.to_string()),
			),
			("revision_id", self.revision_id()),
			("long_revision_id", self.long_revision_id()),
			("dirty", self.is_working_copy_dirty().map(format_flag)),
			("branch", self.branch()),
			("tags", self.tags()),
			("changeset_date", self.changeset_date()),
		])
	}
}
