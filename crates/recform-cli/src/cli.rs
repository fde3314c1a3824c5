//! Command-line arguments for `recform`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "recform",
    version,
    about = "Normalize, merge and align nested record trees",
    long_about = "Normalize nested record trees against schema trees.\n\n\
                  Reads JSON, YAML and CSV documents. Derives schema templates from\n\
                  sample data, applies key renames and value rules, merges and diffs\n\
                  trees, and aligns records from differently shaped sources."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for humans, json for machines).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Derive a schema template with empty directives from sample data.
    Template(TemplateArgs),

    /// Rename keys and convert values of a data tree using a schema.
    Normalize(NormalizeArgs),

    /// Apply `key#converter` suffixes and strip them.
    Format(FormatArgs),

    /// Combine two trees (left + right).
    Merge(PairArgs),

    /// Remove the content of one tree from another (left - right).
    Diff(PairArgs),

    /// Project records of several sources onto their shared scalar fields.
    Align(AlignArgs),

    /// Rename keys to their concept aliases in a language.
    Translate(TranslateArgs),

    /// List the built-in value converters.
    Converters,
}

#[derive(Args)]
pub struct OutputArg {
    /// Write the result here (format by extension) instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct TemplateArgs {
    /// Sample data document.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArg,
}

#[derive(Args)]
pub struct NormalizeArgs {
    /// Data document to normalize.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Schema document. Without it the data's own `*` field names the schema.
    #[arg(long = "schema", short = 's', value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// Directory of schema documents looked up by name.
    #[arg(long = "schema-dir", value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Replace directive terms by their slugs.
    #[arg(long = "slugify")]
    pub slugify: bool,

    /// Shorten term URLs to namespaced names (e.g. `WD:Q5`).
    #[arg(long = "namespace")]
    pub namespace: bool,

    /// Ignore cached schemas.
    #[arg(long = "refresh")]
    pub refresh: bool,

    /// JSON file recording slug/term pairs.
    #[arg(long = "terms", value_name = "PATH")]
    pub terms: Option<PathBuf>,

    /// Print the registered terms after normalizing.
    #[arg(long = "show-terms")]
    pub show_terms: bool,

    #[command(flatten)]
    pub output: OutputArg,
}

#[derive(Args)]
pub struct FormatArgs {
    /// Normalized document with suffixed keys.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Keys (with or without suffix) to leave unconverted.
    #[arg(long = "ignore", value_name = "KEY", value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Converters not to run.
    #[arg(long = "skip", value_name = "CONVERTER", value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Do not log conversion failures.
    #[arg(long = "silent")]
    pub silent: bool,

    #[command(flatten)]
    pub output: OutputArg,
}

#[derive(Args)]
pub struct PairArgs {
    #[arg(value_name = "LEFT")]
    pub left: PathBuf,

    #[arg(value_name = "RIGHT")]
    pub right: PathBuf,

    #[command(flatten)]
    pub output: OutputArg,
}

#[derive(Args)]
pub struct AlignArgs {
    /// Source documents, each a record or a list of records.
    #[arg(value_name = "SOURCE", required = true, num_args = 1..)]
    pub sources: Vec<PathBuf>,

    /// Print the match matrix as a table instead of the records.
    #[arg(long = "table")]
    pub table: bool,

    #[command(flatten)]
    pub output: OutputArg,
}

#[derive(Args)]
pub struct TranslateArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Target language code.
    #[arg(long = "lang", short = 'l', default_value = "en")]
    pub lang: String,

    /// Concept table: `{key: {"aliases": {lang: [alias, ..]}}}`.
    #[arg(long = "concepts", value_name = "PATH")]
    pub concepts: PathBuf,

    /// Ignore cached concepts.
    #[arg(long = "refresh")]
    pub refresh: bool,

    #[command(flatten)]
    pub output: OutputArg,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
