//! mask-reconcile CLI: find objects missing from a mask and match them to an object table.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mask_reconcile::core::{fill_missing, mask_difference};
use mask_reconcile::table::{find_missing_records, CoordinateRounding, ObjectTable, TableColumns};
use mask_reconcile::{read_mask, run_files, write_mask, Connectivity, ReconcileConfig};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "mask-reconcile")]
#[command(about = "Reconcile two segmentation masks against a table of detected objects")]
#[command(version)]
struct Cli {
    /// Log level for the stderr logger.
    #[arg(long, global = true, value_enum, default_value_t = LogLevelArg::Info)]
    log_level: LogLevelArg,

    /// Emit JSON-formatted tracing output instead of the plain logger.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    tracing_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find objects of mask A missing from mask B, match them to the table and merge them.
    Reconcile(CliReconcileArgs),

    /// Write the pixel difference A & !B, or B with those pixels filled in.
    Diff(CliDiffArgs),

    /// List records present in one table but not the other.
    CompareTables(CliCompareArgs),

    /// Write a default JSON config.
    InitConfig {
        /// Destination path.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliReconcileArgs {
    /// JSON config; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mask holding the objects to look for.
    #[arg(long)]
    mask_a: Option<String>,

    /// Baseline mask, also the merge target.
    #[arg(long)]
    mask_b: Option<String>,

    /// Object table (CSV) for mask A.
    #[arg(long)]
    table: Option<String>,

    /// Output directory (default: results).
    #[arg(long)]
    out_dir: Option<String>,

    /// Minimum component area in pixels.
    #[arg(long)]
    min_area: Option<usize>,

    /// Minimum completeness ratio in [0, 1].
    #[arg(long)]
    completeness: Option<f64>,

    /// Match distance cutoff.
    #[arg(long)]
    max_distance: Option<f64>,

    /// Pixel adjacency for component labeling.
    #[arg(long, value_enum)]
    connectivity: Option<ConnectivityArg>,

    /// Decimals kept when keying coordinates.
    #[arg(long)]
    decimals: Option<u32>,
}

#[derive(Debug, Clone, Args)]
struct CliDiffArgs {
    #[arg(long)]
    mask_a: PathBuf,

    #[arg(long)]
    mask_b: PathBuf,

    /// Output raster path.
    #[arg(long)]
    out: PathBuf,

    /// Write mask B with the missing pixels added instead of the bare difference.
    #[arg(long)]
    fill: bool,
}

#[derive(Debug, Clone, Args)]
struct CliCompareArgs {
    #[arg(long)]
    a: PathBuf,

    #[arg(long)]
    b: PathBuf,

    /// Decimals kept when comparing coordinates.
    #[arg(long, default_value = "2")]
    decimals: u32,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConnectivityArg {
    Four,
    Eight,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(value: ConnectivityArg) -> Self {
        match value {
            ConnectivityArg::Four => Connectivity::Four,
            ConnectivityArg::Eight => Connectivity::Eight,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for log::LevelFilter {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Commands::Reconcile(args) => run_reconcile(args),
        Commands::Diff(args) => run_diff(args),
        Commands::CompareTables(args) => run_compare(args),
        Commands::InitConfig { out } => {
            ReconcileConfig::new("2_mask.tif", "3_mask.tif", "2_tab.csv").write_json(&out)?;
            println!("wrote {}", out.display());
            Ok(())
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> CliResult<()> {
    if cli.tracing_json {
        mask_reconcile::core::init_tracing(true);
        return Ok(());
    }
    mask_reconcile::core::init_with_level(cli.log_level.into())?;
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> CliResult<()> {
    mask_reconcile::core::init_with_level(cli.log_level.into())?;
    Ok(())
}

fn build_config(args: CliReconcileArgs) -> CliResult<ReconcileConfig> {
    let mut cfg = match &args.config {
        Some(path) => ReconcileConfig::load_json(path)?,
        None => {
            let (Some(a), Some(b), Some(table)) = (&args.mask_a, &args.mask_b, &args.table) else {
                return Err("either --config or all of --mask-a, --mask-b, --table are required".into());
            };
            ReconcileConfig::new(a.as_str(), b.as_str(), table.as_str())
        }
    };

    if let Some(a) = args.mask_a {
        cfg.mask_a_path = a;
    }
    if let Some(b) = args.mask_b {
        cfg.mask_b_path = b;
    }
    if let Some(table) = args.table {
        cfg.table_path = table;
    }
    if let Some(out_dir) = args.out_dir {
        cfg.output_dir = Some(out_dir);
    }
    if let Some(min_area) = args.min_area {
        cfg.params.components.min_area = min_area;
    }
    if let Some(completeness) = args.completeness {
        cfg.params.components.completeness_threshold = completeness;
    }
    if let Some(max_distance) = args.max_distance {
        cfg.params.matching.max_distance = max_distance;
    }
    if let Some(connectivity) = args.connectivity {
        cfg.params.components.connectivity = connectivity.into();
    }
    if let Some(decimals) = args.decimals {
        cfg.params.rounding = CoordinateRounding::new(decimals)?;
    }
    cfg.params.validate()?;
    Ok(cfg)
}

fn run_reconcile(args: CliReconcileArgs) -> CliResult<()> {
    let cfg = build_config(args)?;
    let report = run_files(&cfg)?;
    let rounding = cfg.params.rounding;

    if report.assignments.is_empty() {
        println!("no objects to add");
    } else {
        println!("found {} objects to add", report.assignments.len());
        for a in &report.assignments {
            println!(
                "object {}: coordinates=({}, {}), intensity={:.2}, distance={:.1}",
                a.record.id,
                rounding.format(a.found.x),
                rounding.format(a.found.y),
                a.record.intensity,
                a.distance
            );
        }
    }
    if report.merge.collided > 0 {
        println!(
            "{} components vetoed by collisions ({} pixels)",
            report.merge.collided, report.merge.collision_pixels
        );
    }
    println!("results written to {}", cfg.output_dir().display());
    Ok(())
}

fn run_diff(args: CliDiffArgs) -> CliResult<()> {
    let a = read_mask(&args.mask_a)?;
    let b = read_mask(&args.mask_b)?;
    let out = if args.fill {
        fill_missing(&a, &b)?
    } else {
        mask_difference(&a, &b)?.to_mask()
    };
    write_mask(&args.out, &out)?;
    println!("wrote {}", args.out.display());
    Ok(())
}

fn run_compare(args: CliCompareArgs) -> CliResult<()> {
    let rounding = CoordinateRounding::new(args.decimals)?;
    let columns = TableColumns::default();
    let a = ObjectTable::from_path(&args.a, &columns, rounding)?;
    let b = ObjectTable::from_path(&args.b, &columns, rounding)?;

    for (left, right, left_path, right_path) in [
        (&a, &b, &args.a, &args.b),
        (&b, &a, &args.b, &args.a),
    ] {
        println!(
            "records in {} missing from {}:",
            left_path.display(),
            right_path.display()
        );
        let missing = find_missing_records(left, right, rounding);
        if missing.is_empty() {
            println!("  none");
        }
        for r in missing {
            println!(
                "  record {}: intensity={:.2}, coordinates=({:.2}, {:.2})",
                r.id, r.intensity, r.x, r.y
            );
        }
    }
    Ok(())
}
