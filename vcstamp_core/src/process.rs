use std::io::BufRead;
use std::io::BufReader;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::sync::mpsc;
use std::thread;

use crate::VcsKind;
use crate::VcstampError;
use crate::VcstampResult;

/// Windows reports an invalid working directory with this code instead of a
/// `NotFound` error kind.
const ERROR_DIRECTORY: i32 = 267;

/// Exit code and captured standard error of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitReport {
	pub exit_code: i32,
	pub stderr: String,
}

/// What happened to a single command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
	/// The command ran to completion.
	Completed(ExitReport),
	/// The executable (or the working directory) could not be found and the
	/// runner was told to ignore that. Nothing was delivered to the caller.
	ToolMissing,
}

/// Launches an external program and blocks until it exits.
///
/// Implementations deliver every stdout line, stripped of its line
/// terminator, to `on_line` in order, and return only after the program has
/// exited and all of its output has been delivered. Launch failures are
/// returned as the underlying `std::io::Error` so that the caller can
/// classify them.
pub trait CommandExecutor {
	fn execute(
		&self,
		program: &str,
		args: &[&str],
		working_dir: &Path,
		on_line: &mut dyn FnMut(&str),
	) -> std::io::Result<ExitReport>;
}

/// Runs commands with [`std::process::Command`], without a shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
	fn execute(
		&self,
		program: &str,
		args: &[&str],
		working_dir: &Path,
		on_line: &mut dyn FnMut(&str),
	) -> std::io::Result<ExitReport> {
		let mut command = Command::new(program);
		command
			.args(args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());

		if !working_dir.as_os_str().is_empty() {
			command.current_dir(working_dir);
		}

		let mut child = command.spawn()?;

		// Lines are read on a helper thread and handed back over a channel so
		// the callback always runs on the calling thread.
		let (tx, rx) = mpsc::channel::<String>();
		let stdout = child.stdout.take();
		let stdout_reader = thread::spawn(move || {
			let Some(stdout) = stdout else {
				return;
			};

			let mut reader = BufReader::new(stdout);
			let mut buffer = Vec::new();
			loop {
				buffer.clear();
				match reader.read_until(b'\n', &mut buffer) {
					Ok(0) | Err(_) => break,
					Ok(_) => {
						if tx.send(decode_line(&buffer)).is_err() {
							break;
						}
					}
				}
			}
		});

		let stderr = child.stderr.take();
		let stderr_reader = thread::spawn(move || {
			let mut bytes = Vec::new();
			if let Some(mut stderr) = stderr {
				let _ = stderr.read_to_end(&mut bytes);
			}
			String::from_utf8_lossy(&bytes).into_owned()
		});

		for line in rx {
			on_line(&line);
		}

		let _ = stdout_reader.join();
		let status = child.wait()?;
		let stderr = stderr_reader.join().unwrap_or_default();

		Ok(ExitReport {
			exit_code: status.code().unwrap_or(-1),
			stderr,
		})
	}
}

fn decode_line(bytes: &[u8]) -> String {
	let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
	let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
	String::from_utf8_lossy(bytes).into_owned()
}

/// Runs one version control executable in a fixed working directory and
/// maps launch and exit failures onto [`VcstampError`].
#[derive(Debug, Clone)]
pub struct ProcessRunner<E = SystemExecutor> {
	vcs: VcsKind,
	program: String,
	working_dir: PathBuf,
	ignore_tool_not_found: bool,
	executor: E,
}

impl ProcessRunner<SystemExecutor> {
	/// A runner for the default executable of `vcs`.
	pub fn new(vcs: VcsKind, working_dir: impl Into<PathBuf>) -> Self {
		Self {
			vcs,
			program: vcs.default_program().to_string(),
			working_dir: working_dir.into(),
			ignore_tool_not_found: false,
			executor: SystemExecutor,
		}
	}
}

impl<E: CommandExecutor> ProcessRunner<E> {
	/// Swap the executor, keeping every other setting.
	pub fn with_executor<F: CommandExecutor>(self, executor: F) -> ProcessRunner<F> {
		ProcessRunner {
			vcs: self.vcs,
			program: self.program,
			working_dir: self.working_dir,
			ignore_tool_not_found: self.ignore_tool_not_found,
			executor,
		}
	}

	/// Launch `program` instead of the default executable.
	#[must_use]
	pub fn with_program(mut self, program: impl Into<String>) -> Self {
		self.program = program.into();
		self
	}

	/// When `true`, a missing executable or working directory turns every
	/// call into a silent [`RunOutcome::ToolMissing`].
	#[must_use]
	pub fn ignore_tool_not_found(mut self, ignore: bool) -> Self {
		self.ignore_tool_not_found = ignore;
		self
	}

	pub fn vcs(&self) -> VcsKind {
		self.vcs
	}

	pub fn program(&self) -> &str {
		&self.program
	}

	pub fn working_dir(&self) -> &Path {
		&self.working_dir
	}

	/// Run the program with `args`, streaming stdout lines to `on_line`.
	///
	/// Once the program exits, `on_completion` receives the exit code and the
	/// captured stderr and decides whether a non-zero exit code or non-empty
	/// stderr should be reported. Without a completion callback both are
	/// always reported as [`VcstampError::CommandFailed`].
	#[tracing::instrument(
		level = "debug",
		skip_all,
		fields(vcs = %self.vcs, program = %self.program, args = %args.join(" "))
	)]
	pub fn run(
		&self,
		args: &[&str],
		on_line: &mut dyn FnMut(&str),
		on_completion: Option<&mut dyn FnMut(i32, &str) -> bool>,
	) -> VcstampResult<RunOutcome> {
		tracing::debug!(dir = %self.working_dir.display(), "launching command");

		let mut deliver = |line: &str| {
			tracing::trace!(line, "stdout");
			on_line(line);
		};
		let report = match self
			.executor
			.execute(&self.program, args, &self.working_dir, &mut deliver)
		{
			Ok(report) => report,
			Err(error) => return self.launch_failure(&error),
		};

		tracing::debug!(exit_code = report.exit_code, "command finished");

		let should_report = match on_completion {
			Some(on_completion) => on_completion(report.exit_code, &report.stderr),
			None => true,
		};

		if should_report && (report.exit_code != 0 || !report.stderr.is_empty()) {
			return Err(VcstampError::CommandFailed {
				vcs: self.vcs.to_string(),
				program: self.program.clone(),
				arguments: args.join(" "),
				exit_code: report.exit_code,
				stderr: report.stderr.trim().to_string(),
			});
		}

		Ok(RunOutcome::Completed(report))
	}

	/// Run the program and collect its stdout lines.
	pub fn run_lines(&self, args: &[&str]) -> VcstampResult<Vec<String>> {
		let mut lines = Vec::new();
		self.run(args, &mut |line: &str| lines.push(line.to_string()), None)?;
		Ok(lines)
	}

	/// Run the program and keep only the first stdout line, or an empty string
	/// when nothing was printed.
	pub fn first_line(&self, args: &[&str]) -> VcstampResult<String> {
		Ok(self.run_lines(args)?.into_iter().next().unwrap_or_default())
	}

	fn launch_failure(&self, error: &std::io::Error) -> VcstampResult<RunOutcome> {
		let code = error.raw_os_error().unwrap_or(0);
		let path = self.working_dir.display().to_string();

		if !is_not_found(error) {
			return Err(VcstampError::ToolNotStarted {
				vcs: self.vcs.to_string(),
				program: self.program.clone(),
				path,
				code,
			});
		}

		if self.ignore_tool_not_found {
			tracing::warn!(
				vcs = %self.vcs,
				program = %self.program,
				%path,
				"command not found, continuing without it"
			);
			return Ok(RunOutcome::ToolMissing);
		}

		Err(VcstampError::ToolNotFound {
			vcs: self.vcs.to_string(),
			program: self.program.clone(),
			path,
			code,
		})
	}
}

fn is_not_found(error: &std::io::Error) -> bool {
	matches!(error.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
		|| (cfg!(windows) && error.raw_os_error() == Some(ERROR_DIRECTORY))
}
