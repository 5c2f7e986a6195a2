use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use chrono::Local;
use chrono::NaiveDateTime;
use chrono::Utc;

use crate::VcstampResult;

/// Operating system facts used by the generic tokens.
pub trait Environment {
	/// The current local wall clock time.
	fn local_now(&self) -> NaiveDateTime;
	/// The current UTC time.
	fn utc_now(&self) -> NaiveDateTime;
	/// Name of the user running the build.
	///
	/// [`SystemEnvironment`] reads it from the `USER`, `USERNAME` and
	/// `LOGNAME` variables, in that order. With none of them set (for example
	/// under `env -i` or some service accounts) it is an empty string.
	fn user_name(&self) -> String;
	/// Host name of the machine running the build.
	fn machine_name(&self) -> String;
	/// Value of an environment variable, `None` when unset.
	fn var(&self, name: &str) -> Option<String>;
	/// First line of a file, or an empty string when the file does not exist
	/// or is empty.
	fn first_line(&self, path: &Path) -> VcstampResult<String>;
}

/// Variables holding the user name, in lookup order.
const USER_NAME_VARIABLES: [&str; 3] = ["USER", "USERNAME", "LOGNAME"];

/// The first non-empty user name variable, or an empty string.
pub(crate) fn user_name_from(lookup: impl Fn(&str) -> Option<String>) -> String {
	USER_NAME_VARIABLES
		.into_iter()
		.filter_map(lookup)
		.find(|value| !value.is_empty())
		.unwrap_or_default()
}

/// The real environment. Relative `FILE` paths resolve against `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct SystemEnvironment {
	base_dir: PathBuf,
}

impl SystemEnvironment {
	pub fn new(base_dir: impl Into<PathBuf>) -> Self {
		Self {
			base_dir: base_dir.into(),
		}
	}
}

impl Environment for SystemEnvironment {
	fn local_now(&self) -> NaiveDateTime {
		Local::now().naive_local()
	}

	fn utc_now(&self) -> NaiveDateTime {
		Utc::now().naive_utc()
	}

	fn user_name(&self) -> String {
		user_name_from(|name| std::env::var(name).ok())
	}

	fn machine_name(&self) -> String {
		hostname::get()
			.map(|value| value.to_string_lossy().to_string())
			.unwrap_or_default()
	}

	fn var(&self, name: &str) -> Option<String> {
		std::env::var(name).ok()
	}

	fn first_line(&self, path: &Path) -> VcstampResult<String> {
		let path = self.base_dir.join(path);
		if !path.is_file() {
			return Ok(String::new());
		}

		let file = std::fs::File::open(&path)?;
		let mut line = String::new();
		BufReader::new(file).read_line(&mut line)?;
		let line = line.strip_suffix('\n').unwrap_or(&line);
		let line = line.strip_suffix('\r').unwrap_or(line);
		Ok(line.to_string())
	}
}
