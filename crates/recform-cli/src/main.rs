//! recform command-line tool.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use recform_cli::commands::{
    NormalizeRequest, converter_names, emit, run_align, run_diff, run_format, run_merge,
    run_normalize, run_template, run_translate,
};
use recform_cli::logging::{LogConfig, LogFormat, init_logging};
use recform_cli::summary::{converters_table, print_align_summary, terms_table};
use recform_model::{FormatOptions, Node, NormalizeOptions};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli.command) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Template(args) => emit(&run_template(&args.input)?, args.output.path.as_deref()),
        Command::Normalize(args) => {
            let options = NormalizeOptions::new()
                .with_slugify(args.slugify)
                .with_namespace(args.namespace)
                .with_refresh(args.refresh);
            let mut request = NormalizeRequest::new(&args.input).with_options(options);
            if let Some(schema) = &args.schema {
                request = request.with_schema(schema);
            }
            if let Some(dir) = &args.schema_dir {
                request = request.with_schema_dir(dir);
            }
            if let Some(terms) = &args.terms {
                request = request.with_terms(terms);
            }
            let outcome = run_normalize(&request)?;
            emit(&outcome.tree, args.output.path.as_deref())?;
            if args.show_terms {
                eprintln!("{}", terms_table(&outcome.terms));
            }
            Ok(())
        }
        Command::Format(args) => {
            let options = FormatOptions::new()
                .with_ignore(args.ignore)
                .with_skip(args.skip)
                .with_silent(args.silent);
            emit(&run_format(&args.input, &options)?, args.output.path.as_deref())
        }
        Command::Merge(args) => emit(
            &run_merge(&args.left, &args.right)?,
            args.output.path.as_deref(),
        ),
        Command::Diff(args) => emit(
            &run_diff(&args.left, &args.right)?,
            args.output.path.as_deref(),
        ),
        Command::Align(args) => {
            let outcome = run_align(&args.sources)?;
            let records = Node::Array(outcome.records.clone());
            if args.table {
                print_align_summary(&outcome);
                if let Some(path) = args.output.path.as_deref() {
                    emit(&records, Some(path))?;
                }
                Ok(())
            } else {
                emit(&records, args.output.path.as_deref())
            }
        }
        Command::Translate(args) => emit(
            &run_translate(&args.input, &args.lang, &args.concepts, args.refresh)?,
            args.output.path.as_deref(),
        ),
        Command::Converters => {
            println!("{}", converters_table(&converter_names()));
            Ok(())
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig::default()
        .with_level_filter(cli.verbosity.tracing_level_filter())
        .with_env_filter(!(cli.verbosity.is_present() || cli.log_level.is_some()))
        .with_log_file(cli.log_file.clone());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
