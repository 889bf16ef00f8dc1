use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use confix_core::FileType;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Render environment variable templates inside configuration files.",
	long_about = "confix resolves `${NAME|filter|filter(key=value)}` expressions found in the \
	              keys and values of JSON, YAML, XML and properties files.\n\nEach expression \
	              reads an environment variable and pipes it through a chain of filters. A value \
	              made of a single expression keeps the type the filters produce.\n\nQuick \
	              start:\n  confix process -f app.json            Print the rendered file\n  \
	              confix process -f app.yaml -i         Render the file in place\n  confix \
	              value '${HOME|upper}'          Render a single value"
)]
pub struct ConfixCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Minimum level of log records written to stderr. Falls back to
	/// `log_level` from the config file, then `RUST_LOG`, then `warn`.
	#[arg(long, value_enum, global = true)]
	pub log_level: Option<LogLevel>,

	/// Include the source file and line number in log records.
	#[arg(long, global = true, default_value_t = false)]
	pub log_source: bool,

	/// Path to a `confix.toml` file. When omitted the working directory is
	/// searched for `confix.toml`, `.confix.toml` and `.config/confix.toml`.
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Render every template expression in a configuration file.
	///
	/// The file type is inferred from the extension unless `--type` is
	/// given. Nothing is written unless the whole file renders successfully.
	Process {
		/// The file to render.
		#[arg(long, short)]
		file: PathBuf,

		/// Read the file as this type instead of inferring it from the
		/// extension. One of `json`, `yaml`, `xml` or `properties`.
		#[arg(long = "type", short = 't', value_parser = parse_file_type)]
		file_type: Option<FileType>,

		/// Where to write the rendered file. `-` is standard output.
		#[arg(long, short, default_value = "-")]
		output: String,

		/// Write the rendered file back over the source file.
		#[arg(long, short, default_value_t = false, conflicts_with = "output")]
		inline: bool,

		/// Allow replacing an existing output file.
		#[arg(long, short = 'w', default_value_t = false)]
		overwrite: bool,

		/// Print a diff between the source and the rendered file to stderr
		/// and write nothing.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Render each value and print the results, one per line.
	Value {
		/// Template strings such as `${HOME}` or `prefix-${USER|upper}`.
		#[arg(required = true)]
		values: Vec<String>,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
	Trace,
	Debug,
	Info,
	Warn,
	Error,
}

impl LogLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Trace => "trace",
			Self::Debug => "debug",
			Self::Info => "info",
			Self::Warn => "warn",
			Self::Error => "error",
		}
	}
}

fn parse_file_type(value: &str) -> Result<FileType, String> {
	value.parse().map_err(|_| {
		format!("`{value}` is not one of json, yaml, yml, xml, properties")
	})
}
