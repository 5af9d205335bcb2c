mod cli;

use fib::config::{self, Config};
use fib::integrity;
use fib::plan::RebasePlan;
use fib::rebase::{AssembleOptions, Assembler, FsOpener};
use fib_amf::ScriptTagBody;
use fib_flv::{read_body, scan, scan_limit, TagType, TagWriter};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tempfile::NamedTempFile;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config_or_default(cli.config.as_deref())?;

    // Respect RUST_LOG env var if set, otherwise use defaults based on flags
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.quiet || (config.quiet && !cli.verbose) {
            "off".to_string()
        } else if cli.verbose {
            "fib=trace,fib_flv=trace,fib_amf=trace".to_string()
        } else {
            "fib=info,fib_flv=info,fib_amf=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse {
            input,
            plan,
            force,
            skip_hash,
        } => parse_file(&input, &plan, force, skip_hash, &config),
        Commands::Build {
            plan,
            output,
            force,
        } => build_file(&plan, &output, force, &config),
        Commands::Extract {
            input,
            index,
            output,
            bytes,
            force,
        } => extract_tag(&input, index, output.as_deref(), bytes, force, &config),
        Commands::Version => {
            println!("fib {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn parse_file(
    input: &Path,
    plan_path: &Path,
    force: bool,
    skip_hash: bool,
    config: &Config,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }
    ensure_writable(plan_path, force || config.output.overwrite)?;

    let skip_hash = skip_hash || config.parse.skip_hash;
    let hash = if skip_hash {
        String::new()
    } else {
        tracing::info!("Hashing {:?}", input);
        integrity::file_digest(input)?
    };

    tracing::info!("Scanning {:?}", input);
    let file = File::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    let mut stream = BufReader::new(file);
    let tags = scan(&mut stream).with_context(|| format!("Failed to scan {:?}", input))?;
    tracing::info!("Found {} tags", tags.len());

    let source_path = input
        .canonicalize()
        .unwrap_or_else(|_| input.to_path_buf());
    let plan = RebasePlan::from_scan(source_path, hash, skip_hash, &tags, &mut stream)?;
    plan.save(plan_path)
        .with_context(|| format!("Failed to write plan {:?}", plan_path))?;

    tracing::info!("Plan written to {:?}", plan_path);
    Ok(())
}

fn build_file(plan_path: &Path, output: &Path, force: bool, config: &Config) -> Result<()> {
    ensure_writable(output, force || config.output.overwrite)?;

    let plan = RebasePlan::load(plan_path)
        .with_context(|| format!("Failed to read plan {:?}", plan_path))?;
    let commands = plan.to_commands()?;

    if plan.source.skip_hash {
        tracing::debug!("Hash check skipped");
    } else {
        integrity::verify(&plan.source.path, &plan.source.hash)?;
    }

    // Stage next to the target so a failed build leaves no file behind
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create a file in {:?}", dir))?;

    let options = AssembleOptions {
        header_flags: config.output.header_flags,
    };
    let writer = Assembler::new(FsOpener::new(&plan.source.path))
        .with_options(options)
        .assemble(&commands, BufWriter::new(staging))?;

    let staging = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush output")?;
    staging
        .persist(output)
        .with_context(|| format!("Failed to write {:?}", output))?;

    tracing::info!("Built {:?}", output);
    Ok(())
}

fn extract_tag(
    input: &Path,
    index: usize,
    output: Option<&Path>,
    bytes: bool,
    force: bool,
    config: &Config,
) -> Result<()> {
    let file = File::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    let mut stream = BufReader::new(file);
    let tags = scan_limit(&mut stream, Some(index.saturating_add(1)))?;
    let tag = tags.get(index).with_context(|| {
        format!(
            "File has only {} tags, but tag {} was requested",
            tags.len(),
            index
        )
    })?;

    match output {
        Some(path) => {
            ensure_writable(path, force || config.output.overwrite)?;
            let file =
                File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
            let mut writer = TagWriter::new(BufWriter::new(file));
            writer.write_tag(&mut stream, tag)?;
            writer.flush()?;
            tracing::info!("Tag {} written to {:?}", index, path);
        }
        None if tag.tag_type == TagType::Script && !bytes => {
            let payload = read_body(&mut stream, tag)?;
            let body = ScriptTagBody::decode(&payload)?;
            println!("{}", body.to_json()?);
        }
        None => {
            let mut framed = Vec::with_capacity(tag.framed_size() as usize + 4);
            TagWriter::new(&mut framed).write_tag(&mut stream, tag)?;
            println!("{}", format_hex(&framed, config.extract.hex_line_width));
        }
    }

    Ok(())
}

/// Uppercase hex, `width` characters per line.
fn format_hex(bytes: &[u8], width: usize) -> String {
    bytes
        .chunks((width / 2).max(1))
        .map(hex::encode_upper)
        .collect::<Vec<_>>()
        .join("\n")
}

fn ensure_writable(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        anyhow::bail!(
            "Output file already exists: {:?} (use --force to overwrite)",
            path
        );
    }
    Ok(())
}
