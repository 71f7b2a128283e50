use log::{debug, info};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bio::io::{fasta, fastq};
use clap::{Parser, ValueEnum};
use flate2::read::MultiGzDecoder;

use fragment_assembly::{Assembly, AssemblyConfig, AssemblyPath, SeqRecord, DEFAULT_LIMIT};

/// Assemble DNA fragments that share homologous ends
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// FASTA/FASTQ or one-sequence-per-line files (optionally gzipped); every record is a fragment
    #[arg(required = true)]
    fragments: Vec<PathBuf>,

    /// Shortest shared substring counted as an overlap (bp)
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,

    /// Allow linear assemblies to start and end with any fragment
    #[arg(long)]
    no_fragment_order: bool,

    /// Only report assemblies that use every fragment
    #[arg(long)]
    all_fragments: bool,

    /// Which assemblies to report
    #[arg(long, value_enum, default_value_t = Topology::Both)]
    topology: Topology,

    /// Output FASTA path for the assembled sequences (default: stdout)
    #[arg(long)]
    output_fasta: Option<PathBuf>,

    /// Wrap assembled FASTA lines to this width (0 = no-wrap)
    #[arg(long, default_value_t = 60)]
    fasta_line_width: usize,

    /// Enable threaded overlap graph construction (default: off)
    #[arg(long, default_value_t = false)]
    threads: bool,

    /// Number of worker threads for overlap graph construction (default: max available - 1)
    #[arg(long, default_value_t = num_cpus::get().saturating_sub(1).max(1))]
    max_workers: usize,

    /// Print the edge tuple of every assembly
    #[arg(long)]
    list: bool,

    /// Verbose/info output (default: quiet)
    #[arg(long, short = 'v', alias = "info")]
    verbose: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,

    /// Trace output
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Topology {
    Linear,
    Circular,
    Both,
}

impl Topology {
    fn linear(self) -> bool {
        matches!(self, Self::Linear | Self::Both)
    }

    fn circular(self) -> bool {
        matches!(self, Self::Circular | Self::Both)
    }
}

fn main() {
    let args = Args::parse();
    // RUST_LOG, when set, wins over the flags.
    let log_level = if args.trace {
        "trace"
    } else if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "error"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("fragment-assembly {}", env!("CARGO_PKG_VERSION"));
    for path in &args.fragments {
        info!("fragments: {}", path.display());
    }

    if let Err(error) = run_pipeline(&args) {
        eprintln!("Assembly failed: {error:?}");
        std::process::exit(1);
    }
}

/// How the records of a fragment file are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentFormat {
    Fastq,
    Fasta,
    Lines,
}

/// A fragment file as recognised from its name: `frags.fa.gz` is gzipped FASTA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FragmentSource {
    format: FragmentFormat,
    gzipped: bool,
}

impl FragmentSource {
    fn from_path(path: &Path) -> Self {
        let lowercase_ext =
            |p: &Path| p.extension().map(|e| e.to_string_lossy().to_ascii_lowercase());

        let mut ext = lowercase_ext(path);
        let gzipped = matches!(ext.as_deref(), Some("gz" | "bgz"));
        if gzipped {
            ext = path.file_stem().and_then(|stem| lowercase_ext(Path::new(stem)));
        }

        let format = match ext.as_deref() {
            Some("fastq" | "fq") => FragmentFormat::Fastq,
            Some("fasta" | "fa" | "fna" | "fas") => FragmentFormat::Fasta,
            _ => FragmentFormat::Lines,
        };
        Self { format, gzipped }
    }

    fn open(&self, path: &Path) -> Result<Box<dyn BufRead>> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let reader: Box<dyn BufRead> = if self.gzipped {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(reader)
    }
}

/// Name used for records that carry no identifier of their own.
fn fallback_name(path: &Path, index: usize) -> String {
    let stem = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fragment".to_string());
    let stem = stem
        .split('.')
        .find(|part| !part.is_empty())
        .unwrap_or("fragment")
        .to_string();
    format!("{stem}_{}", index + 1)
}

fn read_fragments(path: &Path) -> Result<Vec<SeqRecord>> {
    let source = FragmentSource::from_path(path);
    let reader = source.open(path)?;

    match source.format {
        FragmentFormat::Fastq => {
            let mut fragments = Vec::new();
            for record in fastq::Reader::new(reader).records() {
                let record = record.with_context(|| {
                    format!("Error reading FASTQ record from {}", path.display())
                })?;
                fragments.push(SeqRecord::new(record.id(), record.seq()));
            }
            Ok(fragments)
        }
        FragmentFormat::Fasta => {
            let mut fragments = Vec::new();
            for record in fasta::Reader::new(reader).records() {
                let record = record.with_context(|| {
                    format!("Error reading FASTA record from {}", path.display())
                })?;
                fragments.push(SeqRecord::new(record.id(), record.seq()));
            }
            Ok(fragments)
        }
        FragmentFormat::Lines => {
            let mut fragments = Vec::new();
            for line in reader.lines() {
                let line = line.with_context(|| format!("Error reading {}", path.display()))?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let name = fallback_name(path, fragments.len());
                fragments.push(SeqRecord::new(name, trimmed));
            }
            Ok(fragments)
        }
    }
}

fn write_fasta<W: Write>(
    out: &mut W,
    header: &str,
    seq: &[u8],
    line_width: usize,
) -> Result<()> {
    writeln!(out, ">{header}")?;
    if line_width == 0 {
        out.write_all(seq)?;
        writeln!(out)?;
    } else {
        for line in seq.chunks(line_width) {
            out.write_all(line)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn fasta_header(index: usize, record: &SeqRecord, assembly: &AssemblyPath) -> String {
    let topology = if record.is_circular() {
        "circular"
    } else {
        "linear"
    };
    format!(
        "assembly_{} {} {}bp {}",
        index,
        topology,
        record.len(),
        assembly
    )
}

fn run_pipeline(args: &Args) -> Result<Vec<SeqRecord>> {
    let mut fragments = Vec::new();
    for path in &args.fragments {
        let parsed = read_fragments(path)
            .with_context(|| format!("Failed to parse fragments from {}", path.display()))?;
        info!("Read {} fragments from {}", parsed.len(), path.display());
        fragments.extend(parsed);
    }
    if fragments.is_empty() {
        bail!("No fragments found in the input files");
    }

    let config = AssemblyConfig {
        limit: args.limit,
        use_fragment_order: !args.no_fragment_order,
        use_all_fragments: args.all_fragments,
        use_threads: args.threads,
        max_workers: args.max_workers,
    };
    info!("Creating overlap graph...");
    let assembly = Assembly::new(fragments, config);
    debug!("{assembly}");

    let mut candidates: Vec<AssemblyPath> = Vec::new();
    if args.topology.linear() {
        candidates.extend(assembly.get_linear_assemblies());
    }
    if args.topology.circular() {
        candidates.extend(assembly.get_circular_assemblies());
    }
    info!("{} assemblies found.", candidates.len());

    let mut records = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let record = assembly
            .assemble(candidate)
            .with_context(|| format!("Failed to assemble {candidate}"))?;
        records.push(record);
    }

    if args.list {
        for (idx, candidate) in candidates.iter().enumerate() {
            println!("assembly_{}\t{}", idx + 1, candidate);
        }
    }

    let mut out: Box<dyn Write> = match &args.output_fasta {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for (idx, (record, candidate)) in records.iter().zip(&candidates).enumerate() {
        let header = fasta_header(idx + 1, record, candidate);
        write_fasta(&mut out, &header, record.seq(), args.fasta_line_width)?;
    }
    out.flush()?;
    if let Some(path) = &args.output_fasta {
        info!("Assemblies written to {}", path.display());
    }

    Ok(records)
}
