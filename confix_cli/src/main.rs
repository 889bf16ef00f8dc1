use std::path::Path;
use std::process;

use clap::Parser;
use confix_cli::Commands;
use confix_cli::ConfixCli;
use confix_core::ConfixConfig;
use confix_core::FileProcessor;
use confix_core::FileType;
use confix_core::FilterRegistry;
use confix_core::OutputTarget;
use confix_core::TemplateEngine;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

const DEFAULT_LOG_LEVEL: &str = "warn";

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
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = ConfixCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	// The config may carry the log level, so logging starts after it loads.
	let config = load_config(&args);
	let config_level = config
		.as_ref()
		.ok()
		.and_then(|config| config.log_level.clone());
	init_logging(&args, config_level.as_deref(), use_color);

	let result = config.and_then(|config| {
		match &args.command {
			Some(Commands::Process {
				file,
				file_type,
				output,
				inline,
				overwrite,
				diff,
			}) => {
				run_process(
					&config,
					&ProcessOptions {
						file,
						file_type: *file_type,
						output,
						inline: *inline,
						overwrite: *overwrite,
						diff: *diff,
					},
				)
			}
			Some(Commands::Value { values }) => run_value(values),
			None => {
				eprintln!("No subcommand specified. Run `confix --help` for usage.");
				process::exit(1);
			}
		}
	});

	if let Err(e) = result {
		match e.downcast::<confix_core::ConfixError>() {
			Ok(confix_err) => {
				let report: miette::Report = (*confix_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// `--config` wins over discovery in the working directory. A missing
/// config file is not an error unless it was named explicitly.
fn load_config(args: &ConfixCli) -> CliResult<ConfixConfig> {
	if let Some(path) = &args.config {
		return Ok(ConfixConfig::load_file(path)?);
	}

	let root = std::env::current_dir()?;
	Ok(ConfixConfig::load(&root)?.unwrap_or_default())
}

fn init_logging(args: &ConfixCli, config_level: Option<&str>, use_color: bool) {
	let filter = match (args.log_level, config_level) {
		(Some(level), _) => EnvFilter::new(level.as_str()),
		(None, Some(level)) => {
			EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
		}
		(None, None) => {
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
		}
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.with_file(args.log_source)
		.with_line_number(args.log_source)
		.try_init()
		.ok();
}

fn engine() -> TemplateEngine {
	TemplateEngine::new(FilterRegistry::with_builtins())
}

struct ProcessOptions<'a> {
	file: &'a Path,
	file_type: Option<FileType>,
	output: &'a str,
	inline: bool,
	overwrite: bool,
	diff: bool,
}

fn run_process(config: &ConfixConfig, options: &ProcessOptions<'_>) -> CliResult<()> {
	let processor =
		FileProcessor::with_extensions(options.file, options.file_type, &config.extensions)?;
	tracing::debug!(
		path = %processor.path().display(),
		file_type = %processor.file_type(),
		diff = options.diff,
		"processing file"
	);

	// An inline run replaces the source, which the flag itself confirms.
	let target = if options.inline {
		OutputTarget::File {
			path: options.file.to_path_buf(),
			overwrite: true,
		}
	} else {
		OutputTarget::from_arg(options.output, options.overwrite)
	};

	if !options.diff {
		target.ensure_writable()?;
	}

	let rendered = processor.render(&engine())?;

	if options.diff {
		let current = std::fs::read_to_string(processor.path())?;
		let expected = String::from_utf8_lossy(&rendered);

		if current == expected {
			eprintln!("{} is unchanged by rendering.", processor.path().display());
		} else {
			eprintln!("{}", colored!(processor.path().display(), bold));
			print_diff(&current, &expected);
		}

		return Ok(());
	}

	target.write_output(&rendered)?;

	if let OutputTarget::File { path, .. } = &target {
		eprintln!(
			"{} {} ({})",
			colored!("Rendered", green),
			path.display(),
			processor.file_type()
		);
	}

	Ok(())
}

fn run_value(values: &[String]) -> CliResult<()> {
	let engine = engine();

	for value in values {
		let rendered = engine.render(value)?;
		println!("{rendered}");
	}

	Ok(())
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
