use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum VcstampError {
	#[error(transparent)]
	#[diagnostic(code(vcstamp::io_error))]
	Io(#[from] std::io::Error),

	#[error(
		"{vcs} command `{program}` could not be found in `{path}` (os error {code}). Please \
		 ensure that {vcs} is installed."
	)]
	#[diagnostic(
		code(vcstamp::tool_not_found),
		help("install {vcs}, point `[tools]` in vcstamp.toml at it, or pass --ignore-tool-not-found")
	)]
	ToolNotFound {
		vcs: String,
		program: String,
		path: String,
		code: i32,
	},

	#[error(
		"{vcs} command `{program}` with path `{path}` could not be started (os error {code}). \
		 Please ensure that {vcs} is installed."
	)]
	#[diagnostic(code(vcstamp::tool_not_started))]
	ToolNotStarted {
		vcs: String,
		program: String,
		path: String,
		code: i32,
	},

	#[error("{vcs} command `{program} {arguments}` exited with code {exit_code}: {stderr}")]
	#[diagnostic(code(vcstamp::command_failed))]
	CommandFailed {
		vcs: String,
		program: String,
		arguments: String,
		exit_code: i32,
		stderr: String,
	},

	#[error("unexpected output from {vcs} command `{command}`: `{value}` ({reason})")]
	#[diagnostic(
		code(vcstamp::parse),
		help("the installed {vcs} version may print a format vcstamp does not understand")
	)]
	Parse {
		vcs: String,
		command: String,
		value: String,
		reason: String,
	},

	#[error("invalid argument `{argument}` for token `{token}`: {reason}")]
	#[diagnostic(code(vcstamp::token_argument))]
	TokenArgument {
		token: String,
		argument: String,
		reason: String,
	},

	#[error("failed to read template `{path}`: {reason}")]
	#[diagnostic(code(vcstamp::template_read))]
	TemplateRead { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(vcstamp::config_parse),
		help("check that vcstamp.toml is valid TOML with an optional [tools] table and [[stamp]] entries")
	)]
	ConfigParse(String),

	#[error("no stamp jobs configured")]
	#[diagnostic(
		code(vcstamp::no_stamp_jobs),
		help(
			"pass TEMPLATE and DESTINATION to `vcstamp stamp`, or add `[[stamp]]` entries with \
			 `template` and `destination` to vcstamp.toml"
		)
	)]
	NoStampJobs,
}

impl VcstampError {
	/// Errors caused by the version control tool itself (missing, failed to
	/// start, or reported a failure). These are expected, actionable
	/// conditions that are shown to the user as a single line without any
	/// diagnostic detail.
	pub fn is_build_error(&self) -> bool {
		matches!(
			self,
			Self::ToolNotFound { .. } | Self::ToolNotStarted { .. } | Self::CommandFailed { .. }
		)
	}
}

pub type VcstampResult<T> = Result<T, VcstampError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
