use clap::{Parser, Subcommand};
use dxcontainer::container::{self, parse};
use dxcontainer::hash::detect_hash_function;
use dxcontainer::{BuilderOptions, ContainerBuilder, FourCC, HashFunction, SerializedContainer, StandardHasher};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dxcontainer", about = "Inspect and edit DXBC shader containers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the parts of a container
    List {
        input: PathBuf,
        /// Print a JSON summary instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a part (ILDB, ILDN, RTS0, STAT or PRIV)
    Add {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        tag: FourCC,
        /// File whose bytes become the part content
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Remove a part (ILDB, ILDN, RTS0, STAT or PRIV)
    Remove {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        tag: FourCC,
    },
    /// Re-serialize without edits, re-stamping the digest
    Rehash {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Hash used when the input digest is unrecognised
        #[arg(long, value_enum, default_value_t = HashFunction::Primary)]
        hash: HashFunction,
    },
}

#[derive(Serialize)]
struct PartSummary {
    tag:    FourCC,
    role:   &'static str,
    offset: u64,
    size:   usize,
}

#[derive(Serialize)]
struct ContainerSummary {
    total_size: u32,
    digest:     String,
    hash:       Option<&'static str>,
    parts:      Vec<PartSummary>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, json } => {
            let bytes  = std::fs::read(&input)?;
            let parsed = parse(&bytes)?;
            let layout = container::layout(&parsed.parts);
            let summary = ContainerSummary {
                total_size: parsed.header.total_size,
                digest:     hex::encode(parsed.header.digest),
                hash:       detect_hash_function(&StandardHasher, &bytes).map(HashFunction::name),
                parts:      parsed.parts.iter().zip(&layout.offsets)
                    .map(|(p, &offset)| PartSummary {
                        tag:  p.tag,
                        role: p.tag.describe(),
                        offset,
                        size: p.content.len(),
                    })
                    .collect(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Container: {}", input.display());
                println!("  Total size  {} B", summary.total_size);
                println!("  Digest      {} ({})", summary.digest, summary.hash.unwrap_or("unrecognised"));
                println!("  {:<6} {:>10} {:>10}  Role", "Tag", "Offset", "Size");
                for p in &summary.parts {
                    println!("  {:<6} {:>10} {:>10}  {}", p.tag.to_string(), p.offset, p.size, p.role);
                }
            }
        }

        // ── Add ──────────────────────────────────────────────────────────────
        Commands::Add { input, output, tag, file } => {
            let mut b = open_builder(&input, BuilderOptions::default())?;
            b.add(tag, std::fs::read(&file)?)?;
            let out = b.serialize()?;
            write_output(&output, &out)?;
        }

        // ── Remove ───────────────────────────────────────────────────────────
        Commands::Remove { input, output, tag } => {
            let mut b = open_builder(&input, BuilderOptions::default())?;
            b.remove(tag)?;
            let out = b.serialize()?;
            write_output(&output, &out)?;
        }

        // ── Rehash ───────────────────────────────────────────────────────────
        Commands::Rehash { input, output, hash } => {
            let opts = BuilderOptions { default_hash: hash };
            let mut b = open_builder(&input, opts)?;
            let out = b.serialize()?;
            write_output(&output, &out)?;
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn open_builder(path: &Path, opts: BuilderOptions) -> Result<ContainerBuilder, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let mut b = ContainerBuilder::with_options(opts);
    b.load(&bytes)?;
    Ok(b)
}

fn write_output(path: &Path, out: &SerializedContainer) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, &out.bytes)?;
    match out.hash {
        Some(func) => println!("Wrote {} ({} B, {} hash)", path.display(), out.bytes.len(), func.name()),
        None => {
            eprintln!("Validation failed; wrote unhashed container to {}", path.display());
            eprintln!("{}", out.diagnostics.errors());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxcontainer::PART_DEBUG_NAME;

    fn rehash_args(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut args = vec!["dxcontainer", "rehash", "in.dxbc", "-o", "out.dxbc"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args)
    }

    #[test]
    fn rehash_hash_defaults_to_primary() {
        match rehash_args(&[]).unwrap().command {
            Commands::Rehash { hash, .. } => assert_eq!(hash, HashFunction::Primary),
            _ => panic!("expected rehash"),
        }
        match rehash_args(&["--hash", "alternate"]).unwrap().command {
            Commands::Rehash { hash, .. } => assert_eq!(hash, HashFunction::Alternate),
            _ => panic!("expected rehash"),
        }
    }

    #[test]
    fn unknown_hash_is_rejected() {
        let err = rehash_args(&["--hash", "sha1"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn tag_argument_parses_fourcc() {
        let cli = Cli::try_parse_from(["dxcontainer", "remove", "in.dxbc", "-o", "out.dxbc", "-t", "ILDN"]).unwrap();
        match cli.command {
            Commands::Remove { tag, .. } => assert_eq!(tag, PART_DEBUG_NAME),
            _ => panic!("expected remove"),
        }
        assert!(Cli::try_parse_from(["dxcontainer", "remove", "in.dxbc", "-o", "out.dxbc", "-t", "TOOLONG"]).is_err());
    }
}
