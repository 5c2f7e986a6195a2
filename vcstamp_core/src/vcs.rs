use std::fmt::Display;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// The version control systems vcstamp can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
	Git,
	#[serde(rename = "hg", alias = "mercurial")]
	Mercurial,
	#[serde(rename = "svn", alias = "subversion")]
	Subversion,
}

impl VcsKind {
	/// Every supported kind, in working copy detection order.
	pub const ALL: [VcsKind; 3] = [Self::Git, Self::Mercurial, Self::Subversion];

	/// Human readable name used in messages.
	pub fn display_name(self) -> &'static str {
		match self {
			Self::Git => "Git",
			Self::Mercurial => "Mercurial",
			Self::Subversion => "Subversion",
		}
	}

	/// The executable launched when no override is configured.
	pub fn default_program(self) -> &'static str {
		match self {
			Self::Git => "git",
			Self::Mercurial => "hg",
			Self::Subversion => "svn",
		}
	}

	/// The metadata entry that marks the root of a working copy.
	pub fn marker(self) -> &'static str {
		match self {
			Self::Git => ".git",
			Self::Mercurial => ".hg",
			Self::Subversion => ".svn",
		}
	}

	/// Short identifier used on the command line and in config files.
	pub fn id(self) -> &'static str {
		match self {
			Self::Git => "git",
			Self::Mercurial => "hg",
			Self::Subversion => "svn",
		}
	}
}

impl Display for VcsKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.display_name())
	}
}

/// Find the version control system managing `dir` by walking up through its
/// ancestors and looking for a working copy marker. The nearest marker wins.
pub fn detect_vcs(dir: &Path) -> Option<VcsKind> {
	for ancestor in dir.ancestors() {
		for kind in VcsKind::ALL {
			if ancestor.join(kind.marker()).exists() {
				return Some(kind);
			}
		}
	}

	None
}
