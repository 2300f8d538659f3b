use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};

use smt_cli::commands::model_ops::{ModelArgs, WeightArgs};
use smt_cli::commands::{config_ops, decode_ops, model_ops};
use smt_cli::trace_init::init_tracing;
use smt_core::decoder::DecoderConfig;

#[derive(Parser)]
#[command(name = "smtdecode", about = "Greedy statistical machine translation decoder")]
struct Cli {
    /// Tracing filter directive (overrides RUST_LOG), e.g. "smt_core=debug"
    #[arg(long, global = true)]
    log: Option<String>,

    /// Settings TOML replacing the built-in defaults
    #[arg(long, global = true)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate sentences, one per line, from a file or stdin
    Decode {
        #[command(flatten)]
        models: ModelArgs,
        #[command(flatten)]
        weights: WeightArgs,
        /// Input file (defaults to stdin)
        input: Option<String>,
        /// Emit one JSON object per sentence
        #[arg(long)]
        json: bool,
    },

    /// Show the search trace for one sentence
    Explain {
        #[command(flatten)]
        models: ModelArgs,
        #[command(flatten)]
        weights: WeightArgs,
        /// Source sentence (whitespace-tokenized)
        sentence: String,
        /// Output as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Compile a text translation table to the binary format
    CompileTable {
        /// Path to the TSV table
        input: String,
        /// Path to the output file
        output: String,
        /// Distortion model to store (model1 or model2)
        #[arg(long, default_value = "model2")]
        kind: String,
    },

    /// Print the default settings TOML
    SettingsExport,

    /// Validate a settings TOML file
    SettingsValidate {
        /// Path to the settings file
        file: String,
    },
}

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

fn config(weights: &WeightArgs) -> DecoderConfig {
    die!(weights.apply(DecoderConfig::default()), "Error: {}")
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());
    if let Some(file) = &cli.settings {
        config_ops::load_settings(file);
    }

    match cli.command {
        Command::Decode {
            models,
            weights,
            input,
            json,
        } => decode_ops::decode_cmd(&models, config(&weights), input.as_deref(), json),
        Command::Explain {
            models,
            weights,
            sentence,
            json,
        } => decode_ops::explain_cmd(&models, config(&weights), &sentence, json),
        Command::CompileTable {
            input,
            output,
            kind,
        } => {
            let count = die!(
                model_ops::compile_table(Path::new(&input), Path::new(&output), &kind),
                "Error: {}"
            );
            println!("OK: {count} entries written to {output}");
        }
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
