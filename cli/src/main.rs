use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tfschema_core::{convert_path, ConvertOptions, UnmatchedConditions};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "tfschema")]
#[command(about = "Compile Terraform variable declarations into JSON Schema")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the variables of a .tf file or module directory to a JSON Schema
    Convert {
        /// Input .tf file or directory of .tf files
        input: PathBuf,

        /// Output schema file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        /// JSON options file; flags given on the command line take precedence
        #[arg(long)]
        config: Option<PathBuf>,

        /// Value of the root `$schema` keyword
        #[arg(long)]
        schema_uri: Option<String>,

        /// Do not copy variable defaults into the schema
        #[arg(long)]
        no_defaults: bool,

        /// Do not refine schemas from default values
        #[arg(long)]
        no_infer: bool,

        /// What to do with validation conditions that match no known pattern
        #[arg(long, value_enum)]
        unmatched_conditions: Option<UnmatchedArg>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum UnmatchedArg {
    Ignore,
    Warn,
    Error,
}

impl From<UnmatchedArg> for UnmatchedConditions {
    fn from(val: UnmatchedArg) -> Self {
        match val {
            UnmatchedArg::Ignore => UnmatchedConditions::Ignore,
            UnmatchedArg::Warn => UnmatchedConditions::Warn,
            UnmatchedArg::Error => UnmatchedConditions::Error,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            format,
            config,
            schema_uri,
            no_defaults,
            no_infer,
            unmatched_conditions,
        } => {
            let mut options = match config {
                Some(path) => load_options(&path)?,
                None => ConvertOptions::default(),
            };
            if let Some(uri) = schema_uri {
                options.schema_uri = uri;
            }
            if no_defaults {
                options.embed_defaults = false;
            }
            if no_infer {
                options.infer_from_defaults = false;
            }
            if let Some(policy) = unmatched_conditions {
                options.unmatched_conditions = policy.into();
            }

            let schema = convert_path(&input, &options)
                .map_err(anyhow::Error::from)
                .with_context(|| format!("Conversion failed for {}", input.display()))?;

            write_json(&schema, output.as_ref(), format)?;
        }
    }

    Ok(())
}

fn load_options(path: &Path) -> Result<ConvertOptions> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open config file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse options from: {}", path.display()))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
