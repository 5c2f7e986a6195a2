use std::cell::RefCell;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::NaiveDate;
use chrono::NaiveDateTime;

use crate::CommandExecutor;
use crate::Environment;
use crate::ExitReport;
use crate::ProcessRunner;
use crate::VcsKind;
use crate::VcstampResult;

/// A canned reply for one command line.
#[derive(Debug, Clone)]
pub enum Scripted {
	Output {
		exit_code: i32,
		lines: Vec<String>,
		stderr: String,
	},
	LaunchError(ErrorKind),
}

/// Replays scripted command output and records every invocation as its
/// argument string. The `"*"` key answers any command without its own
/// script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
	responses: HashMap<String, Scripted>,
	calls: Rc<RefCell<Vec<String>>>,
}

impl ScriptedExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Succeed with `lines` on stdout.
	pub fn respond(self, args: &str, lines: &[&str]) -> Self {
		self.respond_with(args, 0, lines, "")
	}

	pub fn respond_with(mut self, args: &str, exit_code: i32, lines: &[&str], stderr: &str) -> Self {
		self.responses.insert(
			args.to_string(),
			Scripted::Output {
				exit_code,
				lines: lines.iter().map(ToString::to_string).collect(),
				stderr: stderr.to_string(),
			},
		);
		self
	}

	/// Fail to launch every command with `kind`.
	pub fn fail_launch(mut self, kind: ErrorKind) -> Self {
		self.responses
			.insert("*".to_string(), Scripted::LaunchError(kind));
		self
	}

	/// A handle on the recorded invocations that stays valid after the
	/// executor has been moved into a runner.
	pub fn calls(&self) -> Rc<RefCell<Vec<String>>> {
		Rc::clone(&self.calls)
	}
}

impl CommandExecutor for ScriptedExecutor {
	fn execute(
		&self,
		program: &str,
		args: &[&str],
		_working_dir: &Path,
		on_line: &mut dyn FnMut(&str),
	) -> std::io::Result<ExitReport> {
		let key = args.join(" ");
		self.calls.borrow_mut().push(key.clone());

		let response = self
			.responses
			.get(&key)
			.or_else(|| self.responses.get("*"))
			.unwrap_or_else(|| panic!("unscripted command: {program} {key}"));

		match response {
			Scripted::Output {
				exit_code,
				lines,
				stderr,
			} => {
				for line in lines {
					on_line(line);
				}
				Ok(ExitReport {
					exit_code: *exit_code,
					stderr: stderr.clone(),
				})
			}
			Scripted::LaunchError(kind) => Err(std::io::Error::from(*kind)),
		}
	}
}

pub fn runner(vcs: VcsKind, executor: ScriptedExecutor) -> ProcessRunner<ScriptedExecutor> {
	ProcessRunner::new(vcs, "/work/repo").with_executor(executor)
}

/// Count how often `args` was invoked.
pub fn call_count(calls: &Rc<RefCell<Vec<String>>>, args: &str) -> usize {
	calls.borrow().iter().filter(|call| *call == args).count()
}

pub fn date_time(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
	NaiveDate::from_ymd_opt(year, month, day)
		.and_then(|date| date.and_hms_opt(hour, minute, second))
		.unwrap_or_else(|| panic!("invalid fixture date"))
}

/// An environment with a frozen clock and in-memory files.
#[derive(Debug, Clone)]
pub struct FixedEnvironment {
	pub local: NaiveDateTime,
	pub utc: NaiveDateTime,
	pub user: String,
	pub machine: String,
	pub vars: HashMap<String, String>,
	pub files: HashMap<PathBuf, String>,
}

impl Default for FixedEnvironment {
	fn default() -> Self {
		Self {
			local: date_time(2024, 3, 5, 14, 7, 9),
			utc: date_time(2024, 3, 5, 13, 7, 9),
			user: "builder".to_string(),
			machine: "ci-01".to_string(),
			vars: HashMap::new(),
			files: HashMap::new(),
		}
	}
}

impl FixedEnvironment {
	pub fn with_var(mut self, name: &str, value: &str) -> Self {
		self.vars.insert(name.to_string(), value.to_string());
		self
	}

	pub fn with_file(mut self, path: &str, content: &str) -> Self {
		self.files.insert(PathBuf::from(path), content.to_string());
		self
	}
}

impl Environment for FixedEnvironment {
	fn local_now(&self) -> NaiveDateTime {
		self.local
	}

	fn utc_now(&self) -> NaiveDateTime {
		self.utc
	}

	fn user_name(&self) -> String {
		self.user.clone()
	}

	fn machine_name(&self) -> String {
		self.machine.clone()
	}

	fn var(&self, name: &str) -> Option<String> {
		self.vars.get(name).cloned()
	}

	fn first_line(&self, path: &Path) -> VcstampResult<String> {
		Ok(self
			.files
			.get(path)
			.and_then(|content| content.lines().next())
			.unwrap_or_default()
			.to_string())
	}
}

/// `n` fake commit hashes, newest first, as printed by `git rev-list HEAD`.
pub fn commit_lines(n: usize) -> Vec<String> {
	(0..n).rev().map(|index| format!("{index:040x}")).collect()
}
