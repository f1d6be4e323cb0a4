use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use file_shredder::config::{self, parse_date, ShredConfig};
use file_shredder::core::{
    parse_pattern_list, BatchShredder, ContentPredicate, FileMatcher, MatchCriteria,
    MatchResult, OverwriteEngine, ShredMethod,
};
use file_shredder::utils::human_readable_size;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "file-shredder", version, about = "Securely overwrite and delete files")]
struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Describe the available shredding methods.
    Methods,
    /// List the files the filters select, without touching them.
    Find(FilterArgs),
    /// Overwrite and delete the files the filters select.
    Shred {
        #[command(flatten)]
        filters: FilterArgs,
        /// Use the fixed 7-pass DoD 5220.22-M sequence.
        #[arg(long)]
        dod: bool,
        /// Number of passes for the basic method.
        #[arg(long)]
        passes: Option<u32>,
        /// Skip reading each pass back.
        #[arg(long)]
        no_verify: bool,
        /// Actually shred. Without this flag the matches are only listed.
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Directory to search.
    directory: PathBuf,
    /// File name patterns, separated by commas or semicolons.
    #[arg(long, short = 'p', default_value = "*")]
    pattern: String,
    /// File name patterns to exclude.
    #[arg(long, short = 'x', default_value = "")]
    exclude: String,
    /// Search subdirectories.
    #[arg(long, short = 'r')]
    recursive: bool,
    /// Regex the owning user name must match.
    #[arg(long)]
    owner: Option<String>,
    /// Only files created on or after this date (YYYY-MM-DD).
    #[arg(long)]
    created_after: Option<String>,
    /// Only files created on or before this date (YYYY-MM-DD).
    #[arg(long)]
    created_before: Option<String>,
    /// Only files modified on or after this date (YYYY-MM-DD).
    #[arg(long)]
    modified_after: Option<String>,
    /// Only files modified on or before this date (YYYY-MM-DD).
    #[arg(long)]
    modified_before: Option<String>,
    /// Keep only files whose text contains this.
    #[arg(long)]
    content: Option<String>,
    #[arg(long, default_value_t = 1)]
    content_min: usize,
    /// Exclude files whose text contains this.
    #[arg(long)]
    exclude_content: Option<String>,
    #[arg(long, default_value_t = 1)]
    exclude_content_min: usize,
    /// Route images through OCR for content filters.
    #[arg(long)]
    ocr: bool,
}

impl FilterArgs {
    fn to_criteria(&self, config: &ShredConfig) -> Result<MatchCriteria> {
        let parse = |value: &Option<String>| value.as_deref().map(parse_date).transpose();
        Ok(MatchCriteria {
            include: parse_pattern_list(&self.pattern),
            exclude: parse_pattern_list(&self.exclude),
            recursive: self.recursive || config.recursive,
            owner_pattern: self.owner.clone(),
            created_after: parse(&self.created_after)?,
            created_before: parse(&self.created_before)?,
            modified_after: parse(&self.modified_after)?,
            modified_before: parse(&self.modified_before)?,
            content_include: self
                .content
                .as_deref()
                .and_then(|p| ContentPredicate::new(p, self.content_min)),
            content_exclude: self
                .exclude_content
                .as_deref()
                .and_then(|p| ContentPredicate::new(p, self.exclude_content_min)),
            ocr_enabled: self.ocr || config.ocr_enabled,
        })
    }
}

fn find(filters: &FilterArgs, config: &mut ShredConfig) -> Result<MatchResult> {
    let criteria = filters.to_criteria(config)?;
    let result = FileMatcher::new()
        .find_files(&filters.directory, &criteria)
        .with_context(|| format!("Error finding files in {}", filters.directory.display()))?;

    for path in &result.files {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        match result.content_occurrences.get(path) {
            Some(count) => println!(
                "{}  ({}, {} content matches)",
                path.display(),
                human_readable_size(size),
                count
            ),
            None => println!("{}  ({})", path.display(), human_readable_size(size)),
        }
    }
    println!(
        "{} files matched, {} excluded",
        result.len(),
        result.excluded_count
    );

    config.last_directory = Some(filters.directory.clone());
    Ok(result)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = config::settings::load_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Methods => {
            for method in ShredMethod::all() {
                println!("{}\n{}\n", method.name(), method.description());
            }
            return Ok(());
        }
        Command::Find(filters) => {
            find(filters, &mut config)?;
        }
        Command::Shred {
            filters,
            dod,
            passes,
            no_verify,
            yes,
        } => {
            let result = find(filters, &mut config)?;
            let method = if *dod {
                ShredMethod::Dod5220_22M
            } else {
                passes.map(ShredMethod::basic).unwrap_or(config.method)
            };
            let verify = config.verify && !*no_verify;

            if !*yes {
                println!("Dry run: re-run with --yes to shred with {}.", method);
            } else if !result.is_empty() {
                let engine = OverwriteEngine::new().with_chunk_size(config.effective_chunk_size());
                let batch = BatchShredder::new(engine, method, verify);
                let summary = batch.shred_files(
                    &result.files,
                    |progress, path| {
                        tracing::debug!("{:5.1}% {}", progress * 100.0, path.display())
                    },
                    |path, outcome| {
                        let status = if outcome.is_success() { "shredded" } else { "FAILED" };
                        println!("{:>8}  {}", status, path.display());
                    },
                );
                println!("Shredding complete. {}", summary);
                config.method = method;
            }
        }
    }

    config::settings::save_config(&config, cli.config.as_deref())?;
    Ok(())
}
