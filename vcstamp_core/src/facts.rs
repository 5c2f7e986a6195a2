//! Capability traits shared by the fact providers.
//!
//! Each version control system answers an overlapping but different set of
//! questions, so capabilities are split per fact family instead of forcing
//! one large interface onto every provider. Token wiring is written against
//! these traits, which lets `REVNUM`, `DIRTY` and friends be registered once
//! for every provider that supports them.
//!
//! Getters take `&mut self` because the first call computes and memoizes the
//! value. Later calls return the memoized value without launching anything.

use serde::Serialize;

use crate::VcsKind;
use crate::VcstampError;
use crate::VcstampResult;

/// Providers that can number the checked out revision.
pub trait RevisionFacts {
	fn revision_number(&mut self) -> VcstampResult<i64>;
}

/// Providers that can identify the checked out revision by hash.
pub trait RevisionIdFacts {
	fn revision_id(&mut self) -> VcstampResult<String>;
}

/// Providers that know whether the working copy has local changes.
pub trait DirtyFacts {
	fn is_working_copy_dirty(&mut self) -> VcstampResult<bool>;
}

/// Providers that know which branch is checked out.
pub trait BranchFacts {
	fn branch(&mut self) -> VcstampResult<String>;
}

/// A single named fact reported by `vcstamp info`.
#[derive(Debug, Clone, Serialize)]
pub struct Fact {
	pub name: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl Fact {
	pub fn new(name: &'static str, value: VcstampResult<String>) -> Self {
		match value {
			Ok(value) => Self {
				name,
				value: Some(value),
				error: None,
			},
			Err(error) => Self {
				name,
				value: None,
				error: Some(error.to_string()),
			},
		}
	}
}

/// Reports every fact a provider can compute.
pub trait FactReport {
	/// The version control system behind this provider, if any.
	fn vcs(&self) -> Option<VcsKind>;

	/// Compute every fact. A failing fact does not stop the others from being
	/// reported, but a tool that cannot be launched at all aborts the report.
	fn report(&mut self) -> VcstampResult<Vec<Fact>>;
}

/// The provider used when no version control system is selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVcs;

impl FactReport for NoVcs {
	fn vcs(&self) -> Option<VcsKind> {
		None
	}

	fn report(&mut self) -> VcstampResult<Vec<Fact>> {
		Ok(Vec::new())
	}
}

pub(crate) fn format_flag(flag: bool) -> String {
	if flag { "1" } else { "0" }.to_string()
}

/// Turn a list of fact results into a report, aborting on launch failures.
pub(crate) fn collect_facts(
	facts: Vec<(&'static str, VcstampResult<String>)>,
) -> VcstampResult<Vec<Fact>> {
	let mut report = Vec::with_capacity(facts.len());
	for (name, value) in facts {
		match value {
			Err(
				error @ (VcstampError::ToolNotFound { .. } | VcstampError::ToolNotStarted { .. }),
			) => return Err(error),
			value => report.push(Fact::new(name, value)),
		}
	}
	Ok(report)
}
