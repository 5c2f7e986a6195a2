use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use crate::CommandExecutor;
use crate::Environment;
use crate::Fact;
use crate::FactReport;
use crate::GitProvider;
use crate::HgProvider;
use crate::NoVcs;
use crate::ProcessRunner;
use crate::StampJob;
use crate::StampSource;
use crate::SvnProvider;
use crate::SystemEnvironment;
use crate::SystemExecutor;
use crate::TokenReference;
use crate::TokenRegistry;
use crate::TokenSignature;
use crate::TokenStatus;
use crate::ToolsConfig;
use crate::VcsKind;
use crate::VcsSelection;
use crate::VcstampConfig;
use crate::VcstampError;
use crate::VcstampResult;
use crate::base_registry;
use crate::detect_vcs;
use crate::git_registry;
use crate::hg_registry;
use crate::scan_tokens;
use crate::svn_registry;

/// A fully wired token registry with its version control system erased.
///
/// One stamper is built per invocation and shared by every stamp job, so
/// each fact is computed at most once.
pub trait Stamper {
	/// The version control system supplying facts, if any.
	fn vcs(&self) -> Option<VcsKind>;
	/// Replace every token in `content`.
	fn replace(&mut self, content: &str) -> VcstampResult<String>;
	/// Every registered token, in registration order.
	fn signatures(&self) -> Vec<TokenSignature>;
	/// Every fact the provider can compute.
	fn facts(&mut self) -> VcstampResult<Vec<Fact>>;
}

impl<P: FactReport + 'static> Stamper for TokenRegistry<StampSource<P>> {
	fn vcs(&self) -> Option<VcsKind> {
		self.source().facts.vcs()
	}

	fn replace(&mut self, content: &str) -> VcstampResult<String> {
		TokenRegistry::replace(self, content)
	}

	fn signatures(&self) -> Vec<TokenSignature> {
		TokenRegistry::signatures(self)
	}

	fn facts(&mut self) -> VcstampResult<Vec<Fact>> {
		self.source_mut().facts.report()
	}
}

/// Settings for building a [`Stamper`], merged from the config file and
/// command line overrides.
#[derive(Debug, Clone)]
pub struct StampOptions {
	/// The project root. Stamp job paths and `FILE` tokens resolve against it.
	pub root: PathBuf,
	pub vcs: VcsSelection,
	/// The working copy to query.
	pub working_dir: PathBuf,
	pub ignore_tool_not_found: bool,
	pub tools: ToolsConfig,
	pub jobs: Vec<StampJob>,
}

impl StampOptions {
	/// Construct [`StampOptions`] for `root` from an optional
	/// [`VcstampConfig`].
	pub fn from_config(root: &Path, config: Option<&VcstampConfig>) -> Self {
		let working_dir = config
			.and_then(|c| c.working_dir.as_deref())
			.map_or_else(|| root.to_path_buf(), |dir| root.join(dir));

		Self {
			root: root.to_path_buf(),
			vcs: config.map(|c| c.vcs).unwrap_or_default(),
			working_dir,
			ignore_tool_not_found: config.is_some_and(|c| c.ignore_tool_not_found),
			tools: config.map(|c| c.tools.clone()).unwrap_or_default(),
			jobs: config.map(|c| c.stamps.clone()).unwrap_or_default(),
		}
	}

	/// The configured jobs, or [`VcstampError::NoStampJobs`] when there are
	/// none.
	pub fn stamp_jobs(&self) -> VcstampResult<&[StampJob]> {
		if self.jobs.is_empty() {
			return Err(VcstampError::NoStampJobs);
		}

		Ok(&self.jobs)
	}

	/// The version control system to use, detecting it from the working copy
	/// when set to `auto`.
	pub fn resolve_vcs(&self) -> Option<VcsKind> {
		match self.vcs {
			VcsSelection::Auto => {
				let detected = detect_vcs(&self.working_dir);
				match detected {
					Some(kind) => tracing::debug!(vcs = %kind, "detected version control system"),
					None => {
						tracing::warn!(
							dir = %self.working_dir.display(),
							"no version control system detected, only generic tokens are available"
						);
					}
				}
				detected
			}
			selection => selection.kind(),
		}
	}
}

/// Build the stamper described by `options`, launching the real version
/// control executables.
pub fn build_stamper(options: &StampOptions) -> Box<dyn Stamper> {
	let environment = SystemEnvironment::new(&options.root);
	let runner = options.resolve_vcs().map(|kind| {
		ProcessRunner::new(kind, &options.working_dir)
			.with_program(options.tools.program(kind))
			.ignore_tool_not_found(options.ignore_tool_not_found)
	});

	stamper_for::<SystemExecutor>(runner, environment)
}

/// Wire the registry matching the runner's version control system, or the
/// generic tokens only when there is no runner.
pub fn stamper_for<E: CommandExecutor + 'static>(
	runner: Option<ProcessRunner<E>>,
	environment: impl Environment + 'static,
) -> Box<dyn Stamper> {
	let Some(runner) = runner else {
		return Box::new(base_registry(StampSource::new(NoVcs, environment)));
	};

	match runner.vcs() {
		VcsKind::Git => {
			Box::new(git_registry(StampSource::new(
				GitProvider::new(runner),
				environment,
			)))
		}
		VcsKind::Mercurial => {
			Box::new(hg_registry(StampSource::new(
				HgProvider::new(runner),
				environment,
			)))
		}
		VcsKind::Subversion => {
			Box::new(svn_registry(StampSource::new(
				SvnProvider::new(runner),
				environment,
			)))
		}
	}
}

/// The result of stamping one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampOutcome {
	pub template: PathBuf,
	pub destination: PathBuf,
	/// The template content with every token replaced.
	pub content: String,
	/// The current destination content, `None` when the file does not exist.
	pub existing: Option<String>,
	/// Registered tokens written with the wrong arguments. These were left
	/// untouched.
	pub mismatched: Vec<TokenReference>,
}

impl StampOutcome {
	/// Whether the destination needs to be (re)written.
	pub fn is_stale(&self) -> bool {
		self.existing.as_deref() != Some(self.content.as_str())
	}
}

/// Stamp one template without writing anything.
pub fn render_stamp(
	stamper: &mut dyn Stamper,
	root: &Path,
	job: &StampJob,
) -> VcstampResult<StampOutcome> {
	let template = root.join(&job.template);
	let destination = root.join(&job.destination);

	let source = std::fs::read_to_string(&template).map_err(|e| {
		VcstampError::TemplateRead {
			path: job.template.display().to_string(),
			reason: e.to_string(),
		}
	})?;

	let signatures = stamper.signatures();
	let mismatched: Vec<TokenReference> = scan_tokens(&source)
		.into_iter()
		.filter(|reference| reference.status(&signatures) == TokenStatus::Mismatched)
		.collect();
	for reference in &mismatched {
		tracing::debug!(
			template = %job.template.display(),
			line = reference.line,
			column = reference.column,
			token = %reference.text,
			"token has the wrong arguments and was left unchanged"
		);
	}

	let content = stamper.replace(&source)?;
	let existing = match std::fs::read_to_string(&destination) {
		Ok(existing) => Some(existing),
		Err(error) if error.kind() == ErrorKind::NotFound => None,
		Err(error) => return Err(error.into()),
	};

	Ok(StampOutcome {
		template,
		destination,
		content,
		existing,
		mismatched,
	})
}

/// Write the stamped content when it differs from the destination. Returns
/// whether the file was written.
pub fn write_stamp(outcome: &StampOutcome) -> VcstampResult<bool> {
	if !outcome.is_stale() {
		tracing::debug!(destination = %outcome.destination.display(), "destination is up to date");
		return Ok(false);
	}

	if let Some(parent) = outcome.destination.parent() {
		if !parent.as_os_str().is_empty() {
			std::fs::create_dir_all(parent)?;
		}
	}

	std::fs::write(&outcome.destination, &outcome.content)?;
	tracing::debug!(destination = %outcome.destination.display(), "wrote destination");
	Ok(true)
}
