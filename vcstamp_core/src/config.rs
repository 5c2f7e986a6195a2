use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::VcsKind;
use crate::VcstampError;
use crate::VcstampResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"vcstamp.toml",
	".vcstamp.toml",
	".config/vcstamp.toml",
];

/// Which version control system supplies the revision tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsSelection {
	/// Detect the system from the working copy markers.
	#[default]
	Auto,
	/// Only the generic tokens are available.
	None,
	Git,
	#[serde(rename = "hg", alias = "mercurial")]
	Mercurial,
	#[serde(rename = "svn", alias = "subversion")]
	Subversion,
}

impl VcsSelection {
	/// The explicitly selected kind. `None` for `auto` and `none`.
	pub fn kind(self) -> Option<VcsKind> {
		match self {
			Self::Auto | Self::None => None,
			Self::Git => Some(VcsKind::Git),
			Self::Mercurial => Some(VcsKind::Mercurial),
			Self::Subversion => Some(VcsKind::Subversion),
		}
	}
}

/// Executable overrides for each version control system.
///
/// ```toml
/// [tools]
/// git = "/opt/git/bin/git"
/// hg = "hg.exe"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ToolsConfig {
	#[serde(default)]
	pub git: Option<String>,
	#[serde(default)]
	pub hg: Option<String>,
	#[serde(default)]
	pub svn: Option<String>,
}

impl ToolsConfig {
	/// The executable to launch for `kind`, falling back to the default
	/// program name.
	pub fn program(&self, kind: VcsKind) -> String {
		let configured = match kind {
			VcsKind::Git => self.git.as_deref(),
			VcsKind::Mercurial => self.hg.as_deref(),
			VcsKind::Subversion => self.svn.as_deref(),
		};

		configured.unwrap_or(kind.default_program()).to_string()
	}
}

/// One template to stamp and the file to write the result to. Both paths
/// are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StampJob {
	pub template: PathBuf,
	pub destination: PathBuf,
}

/// Configuration loaded from a `vcstamp.toml` file.
///
/// ```toml
/// vcs = "git"
/// ignore_tool_not_found = true
///
/// [[stamp]]
/// template = "src/version.rs.in"
/// destination = "src/version.rs"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VcstampConfig {
	#[serde(default)]
	pub vcs: VcsSelection,
	/// Continue with fallback values when the version control executable
	/// cannot be found.
	#[serde(default)]
	pub ignore_tool_not_found: bool,
	/// The working copy to query, relative to the project root.
	#[serde(default)]
	pub working_dir: Option<PathBuf>,
	#[serde(default)]
	pub tools: ToolsConfig,
	#[serde(default, rename = "stamp")]
	pub stamps: Vec<StampJob>,
}

impl VcstampConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is no config file.
	pub fn load(root: &Path) -> VcstampResult<Option<VcstampConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		tracing::debug!(path = %config_path.display(), "loading config");
		let content = std::fs::read_to_string(&config_path)?;
		let config: VcstampConfig =
			toml::from_str(&content).map_err(|e| VcstampError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}
}
