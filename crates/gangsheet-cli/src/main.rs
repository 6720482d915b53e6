use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use gangsheet_core::config::{
    NestConfig, OversizePolicy, PackingMethod, RotationPolicy, SortStrategy,
};
use gangsheet_core::{
    ManagedImage, NestJob, NestingResult, QualityOptions, RunRecord, nest, save_preview, to_json,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "gangsheet",
    about = "Nest print designs onto a fixed-width gang sheet",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Nest a job file and export the layout
    Nest(NestArgs),
    /// Quality report for a saved layout JSON
    Check(CheckArgs),
    /// Synthetic production mix: timing + utilization per packing method
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct NestArgs {
    // Input/Output
    /// Job file (JSON or YAML): { sheetWidth, images: [{ id, url, width, height, copies }] }
    #[arg(help_heading = "Input/Output")]
    job: PathBuf,
    /// Layout JSON output (stdout when omitted)
    #[arg(short, long, help_heading = "Input/Output")]
    out: Option<PathBuf>,
    /// YAML config file path (present fields override flags)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Sheet
    /// Sheet width in inches (overrides the job file)
    #[arg(long, help_heading = "Sheet")]
    sheet_width: Option<f64>,
    /// Edge margin and spacing between designs (inches)
    #[arg(long, default_value_t = 0.125, help_heading = "Sheet")]
    padding: f64,
    /// Rotation: never | non_square | always | aspect | aspect:<tolerance>
    #[arg(long, default_value = "non_square", help_heading = "Sheet")]
    rotation: String,
    /// Oversized designs: reject | exclude
    #[arg(long, default_value = "reject", help_heading = "Sheet")]
    oversize: String,

    // Strategies
    /// Sort strategies to compete (comma separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "area_desc,height_desc,width_desc,perimeter_desc",
        help_heading = "Strategies"
    )]
    strategies: Vec<String>,
    /// Packing methods: skyline | column | maxrects[-bssf|-blsf|-baf|-bl|-cp]
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "skyline,column",
        help_heading = "Strategies"
    )]
    methods: Vec<String>,
    /// Time budget for the candidate search (ms)
    #[arg(long, help_heading = "Strategies")]
    time_budget: Option<u64>,
    /// Evaluate candidates in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Strategies")]
    parallel: bool,

    // Export
    /// Write a PNG preview of the layout
    #[arg(long, help_heading = "Export")]
    preview: Option<PathBuf>,
    /// Preview resolution (pixels per inch)
    #[arg(long, default_value_t = 20, help_heading = "Export")]
    dpi: u32,
    /// Append a run record (JSON line) to this file
    #[arg(long, help_heading = "Export")]
    record: Option<PathBuf>,
    /// Context tag stored in the run record
    #[arg(long, default_value = "cli", help_heading = "Export")]
    context: String,
    /// Print a quality report for the selected layout
    #[arg(long, default_value_t = false, help_heading = "Export")]
    quality: bool,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute the layout and print stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct CheckArgs {
    /// Layout JSON written by `gangsheet nest`
    layout: PathBuf,
    /// Required edge margin (inches)
    #[arg(long, default_value_t = 0.125)]
    margin: f64,
    /// Required spacing between designs (inches)
    #[arg(long, default_value_t = 0.10)]
    spacing: f64,
    /// Utilization warning threshold (0..1)
    #[arg(long, default_value_t = 0.80)]
    util_warn: f64,
    /// Exit with an error when the layout is flagged
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Sheet width in inches
    #[arg(long, default_value_t = 13.0)]
    sheet_width: f64,
    /// RNG seed for the synthetic batch
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Scale factor for the design counts (1 = 132 designs)
    #[arg(long, default_value_t = 1)]
    scale: usize,
    /// Time budget for the candidate search (ms)
    #[arg(long)]
    time_budget: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Nest(args) => run_nest(args),
        Commands::Check(args) => run_check(args),
        Commands::Bench(b) => run_bench(b),
    }
}

fn run_nest(cli: &NestArgs) -> anyhow::Result<()> {
    let job = load_job(&cli.job)?;
    let flags = NestConfig {
        sheet_width: cli.sheet_width.unwrap_or(job.sheet_width),
        padding: cli.padding,
        rotation: parse_tag(&cli.rotation, "rotation")?,
        strategies: parse_list(&cli.strategies, "sort strategy")?,
        methods: parse_list(&cli.methods, "packing method")?,
        oversize: parse_tag(&cli.oversize, "oversize policy")?,
        time_budget_ms: cli.time_budget,
        parallel: cli.parallel,
    };

    // Load config file if provided; present fields override flags
    let cfg = if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        y.into_nest_config(flags)?
    } else {
        flags
    };

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    info!(
        designs = job.images.len(),
        sheet_width = cfg.sheet_width,
        "loaded job"
    );
    let start = Instant::now();
    let out = nest(&job.images, &cfg)?;
    let dur = start.elapsed();
    info!(
        strategy = %out.strategy_label(),
        time = %fmt_dur(dur),
        "nesting done"
    );
    if let Some(w) = &out.warning {
        warn!("{}", w);
    }

    if cli.quality {
        let report = out.quality(&QualityOptions {
            margin: cfg.padding,
            ..Default::default()
        });
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }

    if cli.dry_run {
        println!(
            "{} | sheet {:.3}\" x {:.3}\" | {}",
            out.strategy_label(),
            out.sheet_width,
            out.sheet_length,
            out.stats().summary()
        );
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&to_json(&out))?;
    match &cli.out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
            info!(?path, placed = out.placed_items.len(), "layout written");
        }
        None => println!("{}", json),
    }

    if let Some(path) = &cli.preview {
        save_preview(&out, path, cli.dpi)
            .with_context(|| format!("write preview {}", path.display()))?;
        info!(?path, dpi = cli.dpi, "preview written");
    }

    if let Some(path) = &cli.record {
        append_record(path, &cli.context, &job.images, &out)?;
    }
    Ok(())
}

fn run_check(args: &CheckArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.layout)
        .with_context(|| format!("read layout {}", args.layout.display()))?;
    let layout: NestingResult = serde_json::from_str(&text)
        .with_context(|| format!("parse layout {}", args.layout.display()))?;
    let report = layout.quality(&QualityOptions {
        margin: args.margin,
        spacing: args.spacing,
        util_warn: args.util_warn,
        ..Default::default()
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    if args.strict && report.is_bad {
        anyhow::bail!("layout flagged: {:?}", report.issues);
    }
    Ok(())
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let images = production_mix(b.seed, b.scale.max(1));
    let copies: u32 = images.iter().map(|i| i.copies).sum();
    println!(
        "designs={} units={} sheet_width={}",
        images.len(),
        copies,
        b.sheet_width
    );

    let base = NestConfig {
        sheet_width: b.sheet_width,
        rotation: RotationPolicy::AspectOutside { tolerance: 0.05 },
        time_budget_ms: b.time_budget,
        ..Default::default()
    };
    let methods = [
        "skyline",
        "column",
        "maxrects-bssf",
        "maxrects-baf",
        "maxrects-cp",
    ];
    for tag in methods {
        let method: PackingMethod = parse_tag(tag, "packing method")?;
        let cfg = NestConfig {
            methods: vec![method],
            ..base.clone()
        };
        let start = Instant::now();
        match nest(&images, &cfg) {
            Ok(out) => println!(
                "{:<14} utilization={:.2}% length={:.2}in failed={} time={}",
                method.to_string(),
                out.area_utilization_pct * 100.0,
                out.sheet_length,
                out.failed_count,
                fmt_dur(start.elapsed())
            ),
            Err(e) => println!("{:<14} error: {}", method.to_string(), e),
        }
    }

    let start = Instant::now();
    let out = nest(&images, &base)?;
    println!(
        "{:<14} utilization={:.2}% length={:.2}in failed={} time={} ({})",
        "default",
        out.area_utilization_pct * 100.0,
        out.sheet_length,
        out.failed_count,
        fmt_dur(start.elapsed()),
        out.strategy_label()
    );
    Ok(())
}

/// 50 small (2-4"), 40 medium (3-6"), 30 large (4-8") and 12 extra large (6-9") designs.
fn production_mix(seed: u64, scale: usize) -> Vec<ManagedImage> {
    let mut rng = StdRng::seed_from_u64(seed);
    let tiers = [
        ("small", 50, 2.0, 4.0),
        ("medium", 40, 3.0, 6.0),
        ("large", 30, 4.0, 8.0),
        ("xlarge", 12, 6.0, 9.0),
    ];
    let mut images = Vec::new();
    for (prefix, count, lo, hi) in tiers {
        for i in 0..count * scale {
            let w: f64 = rng.gen_range(lo..hi);
            let h: f64 = rng.gen_range(lo..hi);
            images.push(ManagedImage::new(
                format!("{}-{}", prefix, i),
                (w * 4.0).round() / 4.0,
                (h * 4.0).round() / 4.0,
                1,
            ));
        }
    }
    images
}

fn load_job(path: &Path) -> anyhow::Result<NestJob> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read job {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let job: NestJob = if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("parse job {}", path.display()))?
    } else {
        NestJob::from_json_str(&text).with_context(|| format!("parse job {}", path.display()))?
    };
    Ok(job)
}

fn append_record(
    path: &Path,
    context: &str,
    images: &[ManagedImage],
    out: &NestingResult,
) -> anyhow::Result<()> {
    let ts = jiff::Timestamp::now().to_string();
    let line = RunRecord::new(ts, context, images, out).to_jsonl_line()?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open run log {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("append run log {}", path.display()))?;
    info!(?path, "run recorded");
    Ok(())
}

fn parse_tag<T: std::str::FromStr>(s: &str, what: &str) -> anyhow::Result<T> {
    s.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown {}: {}", what, s))
}

fn parse_list<T: std::str::FromStr>(items: &[String], what: &str) -> anyhow::Result<Vec<T>> {
    items.iter().map(|s| parse_tag(s, what)).collect()
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    sheet_width: Option<f64>,
    padding: Option<f64>,
    rotation: Option<String>,
    strategies: Option<Vec<String>>,
    methods: Option<Vec<String>>,
    oversize: Option<String>,
    time_budget_ms: Option<u64>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn into_nest_config(self, mut cfg: NestConfig) -> anyhow::Result<NestConfig> {
        if let Some(v) = self.sheet_width {
            cfg.sheet_width = v;
        }
        if let Some(v) = self.padding {
            cfg.padding = v;
        }
        if let Some(v) = self.rotation {
            cfg.rotation = parse_tag::<RotationPolicy>(&v, "rotation")?;
        }
        if let Some(v) = self.strategies {
            cfg.strategies = parse_list::<SortStrategy>(&v, "sort strategy")?;
        }
        if let Some(v) = self.methods {
            cfg.methods = parse_list::<PackingMethod>(&v, "packing method")?;
        }
        if let Some(v) = self.oversize {
            cfg.oversize = parse_tag::<OversizePolicy>(&v, "oversize policy")?;
        }
        if let Some(v) = self.time_budget_ms {
            cfg.time_budget_ms = Some(v);
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        Ok(cfg)
    }
}
