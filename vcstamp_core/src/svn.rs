use std::num::ParseIntError;

use crate::BranchFacts;
use crate::CommandExecutor;
use crate::DirtyFacts;
use crate::Fact;
use crate::FactReport;
use crate::ProcessRunner;
use crate::RevisionFacts;
use crate::SystemExecutor;
use crate::VcsKind;
use crate::VcstampError;
use crate::VcstampResult;
use crate::facts::collect_facts;
use crate::facts::format_flag;

const REVISION_PREFIX: &str = "Revision: ";
const URL_PREFIX: &str = "URL: ";
const ROOT_PREFIX: &str = "Repository Root: ";

/// Provides Subversion information for a working copy by running and
/// scraping the `svn` command line program.
#[derive(Debug)]
pub struct SvnProvider<E = SystemExecutor> {
	runner: ProcessRunner<E>,
	revision_number: Option<i64>,
	mixed_revisions: Option<bool>,
	dirty: Option<bool>,
	/// Repository URL and repository root, parsed from one `svn info` call.
	location: Option<(String, String)>,
}

/// Tracks the revisions seen across the output of `svn info -R`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RevisionScan {
	pub max_revision: Option<i64>,
	pub mixed: bool,
}

impl RevisionScan {
	pub(crate) fn read_line(&mut self, line: &str) -> Result<(), ParseIntError> {
		let Some(value) = line.strip_prefix(REVISION_PREFIX) else {
			return Ok(());
		};

		let revision = value.trim().parse::<i64>()?;
		if let Some(max) = self.max_revision {
			if max != revision {
				self.mixed = true;
			}
			self.max_revision = Some(max.max(revision));
		} else {
			self.max_revision = Some(revision);
		}

		Ok(())
	}
}

impl<E: CommandExecutor> SvnProvider<E> {
	pub fn new(runner: ProcessRunner<E>) -> Self {
		Self {
			runner,
			revision_number: None,
			mixed_revisions: None,
			dirty: None,
			location: None,
		}
	}

	pub fn runner(&self) -> &ProcessRunner<E> {
		&self.runner
	}

	/// Whether files in the working copy are checked out at different
	/// revisions.
	pub fn mixed_revisions(&mut self) -> VcstampResult<bool> {
		match self.mixed_revisions {
			Some(mixed) => Ok(mixed),
			None => Ok(self.load_revisions()?.1),
		}
	}

	pub fn repository_url(&mut self) -> VcstampResult<String> {
		Ok(self.location()?.0)
	}

	pub fn repository_root(&mut self) -> VcstampResult<String> {
		Ok(self.location()?.1)
	}

	/// The repository URL relative to the repository root, e.g.
	/// `/branches/release-1.2/src`. An empty remainder is reported as `/`.
	pub fn repository_path(&mut self) -> VcstampResult<String> {
		let (url, root) = self.location()?;
		let path = url.get(root.len()..).unwrap_or_default();
		if path.is_empty() {
			Ok("/".to_string())
		} else {
			Ok(path.to_string())
		}
	}

	/// The path segment that follows the `directory` segment of the
	/// repository path, or an empty string when there is none. With
	/// `directory = "branches"` the path `/branches/release-1.2/src` yields
	/// `release-1.2`.
	pub fn sub_directory(&mut self, directory: &str) -> VcstampResult<String> {
		let path = self.repository_path()?;
		let segments: Vec<&str> = path.split('/').collect();
		Ok(segments
			.windows(2)
			.find(|pair| pair[0] == directory)
			.map(|pair| pair[1].to_string())
			.unwrap_or_default())
	}

	/// The tag name when the working copy is a checkout of `tags/<name>`.
	pub fn tag(&mut self) -> VcstampResult<String> {
		self.sub_directory("tags")
	}

	/// Scan every `Revision:` line of `svn info -R`. The highest revision is
	/// the revision number, and any disagreement marks the working copy as
	/// mixed.
	fn load_revisions(&mut self) -> VcstampResult<(i64, bool)> {
		let mut scan = RevisionScan::default();
		let mut failure: Option<(String, ParseIntError)> = None;
		self.runner.run(
			&["info", "-R"],
			&mut |line: &str| {
				if failure.is_some() {
					return;
				}
				if let Err(error) = scan.read_line(line) {
					failure = Some((line.to_string(), error));
				}
			},
			None,
		)?;

		if let Some((value, error)) = failure {
			return Err(VcstampError::Parse {
				vcs: VcsKind::Subversion.to_string(),
				command: format!("{} info -R", self.runner.program()),
				value,
				reason: error.to_string(),
			});
		}

		let number = scan.max_revision.unwrap_or_default();
		tracing::debug!(
			revision_number = number,
			mixed = scan.mixed,
			"computed subversion revision"
		);
		self.revision_number = Some(number);
		self.mixed_revisions = Some(scan.mixed);
		Ok((number, scan.mixed))
	}

	fn location(&mut self) -> VcstampResult<(String, String)> {
		if let Some(location) = &self.location {
			return Ok(location.clone());
		}

		let mut url = String::new();
		let mut root = String::new();
		for line in self.runner.run_lines(&["info"])? {
			if let Some(value) = line.strip_prefix(URL_PREFIX) {
				url = value.to_string();
			} else if let Some(value) = line.strip_prefix(ROOT_PREFIX) {
				root = value.to_string();
			}
		}

		tracing::debug!(%url, %root, "computed subversion location");
		self.location = Some((url.clone(), root.clone()));
		Ok((url, root))
	}
}

impl<E: CommandExecutor> RevisionFacts for SvnProvider<E> {
	fn revision_number(&mut self) -> VcstampResult<i64> {
		match self.revision_number {
			Some(number) => Ok(number),
			None => Ok(self.load_revisions()?.0),
		}
	}
}

impl<E: CommandExecutor> DirtyFacts for SvnProvider<E> {
	/// `svn status` lists modified entries one per line, so any output at all
	/// means the working copy has local changes.
	fn is_working_copy_dirty(&mut self) -> VcstampResult<bool> {
		if let Some(dirty) = self.dirty {
			return Ok(dirty);
		}

		let mut dirty = false;
		self.runner.run(&["status"], &mut |_: &str| dirty = true, None)?;
		self.dirty = Some(dirty);
		Ok(dirty)
	}
}

impl<E: CommandExecutor> BranchFacts for SvnProvider<E> {
	/// The branch name when the working copy is a checkout of
	/// `branches/<name>`.
	fn branch(&mut self) -> VcstampResult<String> {
		self.sub_directory("branches")
	}
}

impl<E: CommandExecutor> FactReport for SvnProvider<E> {
	fn vcs(&self) -> Option<VcsKind> {
		Some(VcsKind::Subversion)
	}

	fn report(&mut self) -> VcstampResult<Vec<Fact>> {
		collect_facts(vec![
			(
				"revision",
				self.revision_number().map(|number| number.to_string()),
			),
			("mixed", self.mixed_revisions().map(format_flag)),
			("dirty", self.is_working_copy_dirty().map(format_flag)),
			("repository_url", self.repository_url()),
			("repository_root", self.repository_root()),
			("repository_path", self.repository_path()),
			("branch", self.branch()),
			("tag", self.tag()),
		])
	}
}
