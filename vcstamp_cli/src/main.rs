use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;
use vcstamp_cli::Commands;
use vcstamp_cli::OutputFormat;
use vcstamp_cli::VcstampCli;
use vcstamp_core::StampJob;
use vcstamp_core::StampOptions;
use vcstamp_core::TokenStatus;
use vcstamp_core::VcsKind;
use vcstamp_core::VcstampConfig;
use vcstamp_core::VcstampError;
use vcstamp_core::build_stamper;
use vcstamp_core::render_stamp;
use vcstamp_core::scan_tokens;
use vcstamp_core::write_stamp;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
	let args = VcstampCli::parse();

	// Respect NO_COLOR env var, --no-color flag, and terminals without color.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_logging(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Stamp {
			template,
			destination,
			check,
			dry_run,
			diff,
		}) => {
			let job = match (template, destination) {
				(Some(template), Some(destination)) => {
					Some(StampJob {
						template: template.clone(),
						destination: destination.clone(),
					})
				}
				_ => None,
			};
			run_stamp(&args, job, *check, *dry_run, *diff)
		}
		Some(Commands::Info { format }) => run_info(&args, *format),
		Some(Commands::Tokens { template, format }) => {
			run_tokens(&args, template.as_deref(), *format)
		}
		None => {
			eprintln!("No subcommand specified. Run `vcstamp --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<VcstampError>() {
			// Problems with the version control tool are expected and
			// actionable, so they are reported as a single line.
			Ok(error) if error.is_build_error() => {
				eprintln!("{} {error}", colored!("error:", red));
			}
			Ok(error) => {
				let report: miette::Report = (*error).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn init_logging(verbose: bool, use_color: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_env("VCSTAMP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.try_init();
}

fn resolve_root(args: &VcstampCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Merge vcstamp.toml with the command line overrides.
fn load_options(args: &VcstampCli) -> Result<StampOptions, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = VcstampConfig::load(&root)?;
	let mut options = StampOptions::from_config(&root, config.as_ref());

	if let Some(vcs) = args.vcs {
		options.vcs = vcs.into();
	}
	if let Some(working_dir) = &args.working_dir {
		options.working_dir = root.join(working_dir);
	}
	if args.ignore_tool_not_found {
		options.ignore_tool_not_found = true;
	}

	tracing::debug!(
		root = %options.root.display(),
		working_dir = %options.working_dir.display(),
		vcs = ?options.vcs,
		"resolved options"
	);
	Ok(options)
}

fn print_section(title: &str) {
	println!();
	println!("{}", colored!(title, bold));
}

fn print_field(label: &str, value: impl std::fmt::Display) {
	println!("{label:<20} {value}");
}

fn run_stamp(
	args: &VcstampCli,
	job: Option<StampJob>,
	check: bool,
	dry_run: bool,
	show_diff: bool,
) -> CliResult {
	let options = load_options(args)?;
	let jobs = match job {
		Some(job) => vec![job],
		None => options.stamp_jobs()?.to_vec(),
	};

	let root = &options.root;
	let mut stamper = build_stamper(&options);
	let mut stale = 0;

	for job in &jobs {
		let outcome = render_stamp(stamper.as_mut(), root, job)?;
		let template = relative_display(&outcome.template, root);
		let destination = relative_display(&outcome.destination, root);

		for reference in &outcome.mismatched {
			eprintln!(
				"{} {template}:{}:{} token `{}` has the wrong arguments and was left unchanged",
				colored!("warning:", yellow),
				reference.line,
				reference.column,
				reference.text,
			);
		}

		if !outcome.is_stale() {
			println!("{destination} is up to date.");
			continue;
		}

		stale += 1;
		if show_diff {
			print_diff(
				&destination,
				outcome.existing.as_deref().unwrap_or_default(),
				&outcome.content,
			);
		}

		if check {
			eprintln!("{} {destination}", colored!("stale:", red));
		} else if dry_run {
			println!("Would write {destination}");
		} else {
			write_stamp(&outcome)?;
			println!("{} {destination}", colored!("Wrote", green));
		}
	}

	if check {
		if stale > 0 {
			eprintln!("Check failed: {stale} destination(s) out of date.");
			process::exit(1);
		}
		println!("Check passed: all destinations are up to date.");
	}

	Ok(())
}

fn run_info(args: &VcstampCli, format: OutputFormat) -> CliResult {
	let options = load_options(args)?;
	let mut stamper = build_stamper(&options);
	let vcs = stamper.vcs();
	let facts = stamper.facts()?;

	match format {
		OutputFormat::Json => {
			let output = serde_json::json!({
				"vcs": vcs.map(VcsKind::id),
				"workingDir": options.working_dir.display().to_string(),
				"facts": facts,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			print_field("Version control", vcs.map_or("none", VcsKind::display_name));
			print_field("Working directory", options.working_dir.display());

			if facts.is_empty() {
				return Ok(());
			}

			print_section("Facts");
			for fact in &facts {
				match (&fact.value, &fact.error) {
					(Some(value), _) => print_field(fact.name, value),
					(None, Some(error)) => print_field(fact.name, colored!(format!("error: {error}"), red)),
					(None, None) => print_field(fact.name, ""),
				}
			}
		}
	}

	Ok(())
}

fn run_tokens(args: &VcstampCli, template: Option<&Path>, format: OutputFormat) -> CliResult {
	let options = load_options(args)?;
	let stamper = build_stamper(&options);
	let signatures = stamper.signatures();

	let Some(template) = template else {
		match format {
			OutputFormat::Json => {
				let tokens: Vec<serde_json::Value> = signatures
					.iter()
					.map(|signature| {
						serde_json::json!({
							"name": signature.name,
							"arity": signature.arity,
							"usage": signature.to_string(),
						})
					})
					.collect();
				let output = serde_json::json!({
					"vcs": stamper.vcs().map(VcsKind::id),
					"tokens": tokens,
				});
				println!("{output}");
			}
			OutputFormat::Text => {
				let vcs = stamper.vcs().map_or("generic", VcsKind::display_name);
				println!("{}", colored!(format!("Tokens ({vcs})"), bold));
				for signature in &signatures {
					println!("  {signature}");
				}
			}
		}
		return Ok(());
	};

	let path = options.root.join(template);
	let content = std::fs::read_to_string(&path).map_err(|e| {
		VcstampError::TemplateRead {
			path: template.display().to_string(),
			reason: e.to_string(),
		}
	})?;
	let references = scan_tokens(&content);
	let relative = relative_display(&path, &options.root);

	match format {
		OutputFormat::Json => {
			let entries: Vec<serde_json::Value> = references
				.iter()
				.map(|reference| {
					serde_json::json!({
						"name": reference.name,
						"text": reference.text,
						"arguments": reference.arguments,
						"line": reference.line,
						"column": reference.column,
						"status": reference.status(&signatures),
					})
				})
				.collect();
			let output = serde_json::json!({
				"template": relative,
				"tokens": entries,
			});
			println!("{output}");
		}
		OutputFormat::Text => {
			if references.is_empty() {
				println!("No tokens found in {relative}.");
				return Ok(());
			}

			for reference in &references {
				let status = match reference.status(&signatures) {
					TokenStatus::Known => colored!("known", green),
					TokenStatus::Unknown => colored!("unknown", yellow),
					TokenStatus::Mismatched => colored!("mismatched", red),
				};
				println!(
					"{relative}:{}:{}  {}  {status}",
					reference.line, reference.column, reference.text
				);
			}
		}
	}

	Ok(())
}

/// Print a unified diff of the destination against the stamped content.
fn print_diff(destination: &str, current: &str, stamped: &str) {
	let diff = TextDiff::from_lines(current, stamped);
	eprintln!("{}", colored!(format!("--- {destination}"), bold));
	eprintln!("{}", colored!(format!("+++ {destination} (stamped)"), bold));

	for hunk in diff.unified_diff().context_radius(2).iter_hunks() {
		eprintln!("{}", colored!(hunk.header().to_string(), yellow));
		for change in hunk.iter_changes() {
			let line = change.value().trim_end_matches(['\n', '\r']);
			match change.tag() {
				ChangeTag::Delete => eprintln!("{}", colored!(format!("-{line}"), red)),
				ChangeTag::Insert => eprintln!("{}", colored!(format!("+{line}"), green)),
				ChangeTag::Equal => eprintln!(" {line}"),
			}
		}
	}
}

fn relative_display(path: &Path, root: &Path) -> String {
	match path.strip_prefix(root) {
		Ok(relative) => relative.display().to_string(),
		Err(_) => path.display().to_string(),
	}
}
