use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use vcstamp_core::VcsSelection;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Stamp version control information into generated files during a build.",
	long_about = "vcstamp reads a template, replaces tokens such as $REVNUM$, $REVID$, $DIRTY$ \
	              or $DATE$ with facts from Git, Mercurial or Subversion and the build \
	              environment, and writes the destination only when its content \
	              changed.\n\nQuick start:\n  vcstamp stamp version.rs.in version.rs  Stamp one \
	              file\n  vcstamp stamp                           Run every [[stamp]] job in \
	              vcstamp.toml\n  vcstamp info                            Show the version \
	              control facts\n  vcstamp tokens                          List the available \
	              tokens"
)]
pub struct VcstampCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Version control system to query. Overrides `vcs` in vcstamp.toml.
	#[arg(long, value_enum, global = true)]
	pub vcs: Option<VcsArg>,

	/// Working copy to query, relative to the project root. Overrides
	/// `working_dir` in vcstamp.toml.
	#[arg(long, global = true)]
	pub working_dir: Option<PathBuf>,

	/// Continue with fallback values when the version control executable
	/// cannot be found.
	#[arg(long, global = true, default_value_t = false)]
	pub ignore_tool_not_found: bool,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Replace the tokens in a template and write the destination file.
	///
	/// Without arguments every `[[stamp]]` job from vcstamp.toml runs. The
	/// destination is only written when its content would change, so build
	/// systems do not see a spurious modification.
	Stamp {
		/// Template file containing tokens.
		#[arg(requires = "destination")]
		template: Option<PathBuf>,

		/// File to write the stamped content to.
		destination: Option<PathBuf>,

		/// Do not write anything. Exits with a non-zero status code when any
		/// destination is out of date.
		#[arg(long, default_value_t = false)]
		check: bool,

		/// Preview which files would be written without writing them.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Show a unified diff for each destination that would change.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Print every fact the selected version control system provides.
	///
	/// Facts that fail are reported next to their name instead of aborting
	/// the report. A version control executable that cannot be launched is
	/// still an error.
	Info {
		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// List the available tokens, or the tokens used by a template.
	///
	/// With a template, every token-shaped fragment is listed with its
	/// position and whether it is known, unknown, or written with the wrong
	/// arguments.
	Tokens {
		/// Template file to inspect.
		template: Option<PathBuf>,

		/// Output format. Use `text` for human-readable output or `json` for
		/// programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
	#[default]
	Text,
	Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VcsArg {
	Auto,
	None,
	Git,
	#[value(alias = "mercurial")]
	Hg,
	#[value(alias = "subversion")]
	Svn,
}

impl From<VcsArg> for VcsSelection {
	fn from(value: VcsArg) -> Self {
		match value {
			VcsArg::Auto => Self::Auto,
			VcsArg::None => Self::None,
			VcsArg::Git => Self::Git,
			VcsArg::Hg => Self::Mercurial,
			VcsArg::Svn => Self::Subversion,
		}
	}
}
