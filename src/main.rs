use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use mddoc::{Config, Error, Result, Template};
use rayon::prelude::*;

#[derive(Parser)]
#[command(name = "mddoc")]
#[command(about = "Convert Markdown files to styled Typst and PDF documents")]
struct Cli {
    /// Input Markdown files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output path without extension (single input only, defaults to the input name)
    #[arg(short, long, conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Directory to write converted files into
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// What to produce
    #[arg(short, long, value_enum, default_value_t = Format::Pdf)]
    format: Format,

    /// TOML style template
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Config file (defaults are used if it does not exist)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Typst,
    Pdf,
    Both,
}

impl Format {
    fn typst(self) -> bool {
        matches!(self, Format::Typst | Format::Both)
    }

    fn pdf(self) -> bool {
        matches!(self, Format::Pdf | Format::Both)
    }
}

enum Outcome {
    Converted(Vec<PathBuf>),
    Skipped,
    Failed(Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if cli.output.is_some() && cli.inputs.len() > 1 {
        eprintln!("Error: --output needs a single input, use --out-dir for several");
        return ExitCode::FAILURE;
    }

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Ok(Config::compiled_default()),
    };
    let template = cli.template.as_deref().map(Template::load).transpose();
    let (config, template) = match (config, template) {
        (Ok(config), Ok(template)) => (config, template),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = &cli.out_dir {
        if let Err(source) = fs::create_dir_all(dir) {
            eprintln!("Error: {}", Error::Io { path: dir.clone(), source });
            return ExitCode::FAILURE;
        }
    }

    let outcomes: Vec<(&PathBuf, Outcome)> = cli
        .inputs
        .par_iter()
        .map(|input| {
            let outcome = if !input.is_file() {
                Outcome::Skipped
            } else {
                let base = output_base(input, &cli);
                match convert(input, &base, cli.format, &config, template.as_ref()) {
                    Ok(written) => Outcome::Converted(written),
                    Err(e) => Outcome::Failed(e),
                }
            };
            (input, outcome)
        })
        .collect();

    let mut succeeded = 0;
    let mut failed = 0;
    for (input, outcome) in &outcomes {
        match outcome {
            Outcome::Converted(written) => {
                succeeded += 1;
                for path in written {
                    println!("Created {}", path.display());
                }
            }
            Outcome::Skipped => {
                failed += 1;
                println!("Skipped {} (not found)", input.display());
            }
            Outcome::Failed(e) => {
                failed += 1;
                eprintln!("Error converting {}: {}", input.display(), e);
            }
        }
    }

    if outcomes.len() > 1 {
        println!("Converted {} of {} files ({} failed)", succeeded, outcomes.len(), failed);
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Output path for `input` without its extension.
fn output_base(input: &Path, cli: &Cli) -> PathBuf {
    if let Some(output) = &cli.output {
        return output.clone();
    }
    let stem = input.file_stem().map(PathBuf::from).unwrap_or_else(|| "output".into());
    match &cli.out_dir {
        Some(dir) => dir.join(stem),
        None => input.with_file_name(stem),
    }
}

fn with_suffix(base: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

fn convert(
    input: &Path,
    base: &Path,
    format: Format,
    config: &Config,
    template: Option<&Template>,
) -> Result<Vec<PathBuf>> {
    let bytes = fs::read(input).map_err(|source| Error::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let markdown = std::str::from_utf8(&bytes)?;
    log::debug!("converting {} ({} bytes)", input.display(), bytes.len());

    let typst = mddoc::markdown_to_typst_with_config(markdown, config, template);
    let mut written = Vec::new();

    if format.typst() {
        let path = with_suffix(base, "typ");
        write(&path, typst.as_bytes())?;
        written.push(path);
    }

    if format.pdf() {
        let pdf = mddoc::typst_to_pdf(typst, config)?;
        let path = with_suffix(base, "pdf");
        write(&path, &pdf)?;
        written.push(path);
    }

    Ok(written)
}

fn write(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
