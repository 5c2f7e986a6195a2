//! Binds token names to environment and fact provider getters.
//!
//! Every registry starts from [`base_registry`] and the version control
//! specific registries append their own tokens after the generic ones.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::BranchFacts;
use crate::CommandExecutor;
use crate::DirtyFacts;
use crate::Environment;
use crate::GitProvider;
use crate::HgProvider;
use crate::RevisionFacts;
use crate::RevisionIdFacts;
use crate::SvnProvider;
use crate::TokenRegistry;
use crate::VcstampError;
use crate::facts::format_flag;

/// Names and `chrono` formats of the date tokens. The UTC variants use the
/// same formats with a `UTC` prefix.
const DATE_TOKENS: [(&str, &str); 5] = [
	("YEAR", "%Y"),
	("MONTH", "%m"),
	("DAY", "%d"),
	("DATE", "%Y-%m-%d"),
	("DATETIME", "%Y-%m-%dT%H:%M:%S"),
];

/// Everything a token handler can read: the version control facts and the
/// operating system environment.
pub struct StampSource<P> {
	pub facts: P,
	pub environment: Box<dyn Environment>,
}

impl<P> StampSource<P> {
	pub fn new(facts: P, environment: impl Environment + 'static) -> Self {
		Self {
			facts,
			environment: Box::new(environment),
		}
	}
}

/// Tokens that do not depend on any version control system.
pub fn base_registry<P: 'static>(source: StampSource<P>) -> TokenRegistry<StampSource<P>> {
	let mut registry = TokenRegistry::new(source);

	for (name, format) in DATE_TOKENS {
		registry.add_no_args(name, move |source: &mut StampSource<P>| {
			Ok(format_time(source.environment.local_now(), format))
		});
	}
	for (name, format) in DATE_TOKENS {
		registry.add_no_args(format!("UTC{name}"), move |source: &mut StampSource<P>| {
			Ok(format_time(source.environment.utc_now(), format))
		});
	}

	registry
		.add_no_args("USER", |source| Ok(source.environment.user_name()))
		.add_no_args("MACHINE", |source| Ok(source.environment.machine_name()))
		.add_two_string_args("ENVIRONMENT", |source, name, default| {
			Ok(source
				.environment
				.var(name)
				.unwrap_or_else(|| default.to_string()))
		})
		.add_string_arg("FILE", |source, path| {
			source.environment.first_line(Path::new(path))
		});

	registry
}

/// The generic tokens followed by the Git tokens.
pub fn git_registry<E: CommandExecutor + 'static>(
	source: StampSource<GitProvider<E>>,
) -> TokenRegistry<StampSource<GitProvider<E>>> {
	let mut registry = base_registry(source);
	add_revision_tokens(&mut registry);
	add_revision_id_token(&mut registry);
	add_dirty_token(&mut registry);
	add_branch_token(&mut registry);
	registry.add_no_args("TAGS", |source| source.facts.tags());
	registry
}

/// The generic tokens followed by the Mercurial tokens.
pub fn hg_registry<E: CommandExecutor + 'static>(
	source: StampSource<HgProvider<E>>,
) -> TokenRegistry<StampSource<HgProvider<E>>> {
	let mut registry = base_registry(source);
	add_revision_tokens(&mut registry);
	add_revision_id_token(&mut registry);
	registry.add_no_args("REVIDLONG", |source| source.facts.long_revision_id());
	add_dirty_token(&mut registry);
	add_branch_token(&mut registry);
	registry
		.add_no_args("TAGS", |source| source.facts.tags())
		.add_no_args("CHANGESETDATE", |source| source.facts.changeset_date());
	registry
}

/// The generic tokens followed by the Subversion tokens.
pub fn svn_registry<E: CommandExecutor + 'static>(
	source: StampSource<SvnProvider<E>>,
) -> TokenRegistry<StampSource<SvnProvider<E>>> {
	let mut registry = base_registry(source);
	add_revision_tokens(&mut registry);
	registry.add_no_args("MIXED", |source| {
		source.facts.mixed_revisions().map(format_flag)
	});
	add_dirty_token(&mut registry);
	registry.add_string_arg("SUBDIR", |source, directory| {
		source.facts.sub_directory(directory)
	});
	add_branch_token(&mut registry);
	registry
		.add_no_args("TAG", |source| source.facts.tag())
		.add_no_args("REPOURL", |source| source.facts.repository_url())
		.add_no_args("REPOROOT", |source| source.facts.repository_root())
		.add_no_args("REPOPATH", |source| source.facts.repository_path());
	registry
}

fn format_time(time: NaiveDateTime, format: &str) -> String {
	time.format(format).to_string()
}

/// `REVNUM`, `REVNUM_MOD(n)` and `REVNUM_DIV(n)`.
fn add_revision_tokens<P: RevisionFacts + 'static>(registry: &mut TokenRegistry<StampSource<P>>) {
	registry
		.add_no_args("REVNUM", |source| {
			Ok(source.facts.revision_number()?.to_string())
		})
		.add_int_arg("REVNUM_MOD", |source, divisor| {
			let revision = source.facts.revision_number()?;
			revision
				.checked_rem(divisor)
				.map(|value| value.to_string())
				.ok_or_else(|| invalid_divisor("REVNUM_MOD", divisor))
		})
		.add_int_arg("REVNUM_DIV", |source, divisor| {
			let revision = source.facts.revision_number()?;
			revision
				.checked_div(divisor)
				.map(|value| value.to_string())
				.ok_or_else(|| invalid_divisor("REVNUM_DIV", divisor))
		});
}

fn add_revision_id_token<P: RevisionIdFacts + 'static>(
	registry: &mut TokenRegistry<StampSource<P>>,
) {
	registry.add_no_args("REVID", |source| source.facts.revision_id());
}

fn add_dirty_token<P: DirtyFacts + 'static>(registry: &mut TokenRegistry<StampSource<P>>) {
	registry.add_no_args("DIRTY", |source| {
		source.facts.is_working_copy_dirty().map(format_flag)
	});
}

fn add_branch_token<P: BranchFacts + 'static>(registry: &mut TokenRegistry<StampSource<P>>) {
	registry.add_no_args("BRANCH", |source| source.facts.branch());
}

fn invalid_divisor(token: &str, divisor: i64) -> VcstampError {
	VcstampError::TokenArgument {
		token: token.to_string(),
		argument: divisor.to_string(),
		reason: "the divisor must not be zero".to_string(),
	}
}
