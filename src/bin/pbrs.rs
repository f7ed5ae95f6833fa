use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use pose_bootstrap::bootstrap::{BootstrapPipeline, BootstrapReport};
use pose_bootstrap::config::BootstrapConfig;
use pose_bootstrap::corpus::ImageCorpus;
use pose_bootstrap::io::{load_pose, write_report};
use pose_bootstrap::landmark::JointAngle;
use pose_bootstrap::model::SidecarModel;
use pose_bootstrap::reconcile::ConsistencyReconciler;
use pose_bootstrap::store::{EmbeddingStore, ImageStore};

#[derive(Parser)]
#[command(version, about)]
struct PbrsCli {
    /// JSON config file, the folder flags override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// input folder with one subfolder of images per pose class
    #[arg(long, global = true)]
    images_in: Option<PathBuf>,

    /// output folder for annotated images
    #[arg(long, global = true)]
    images_out: Option<PathBuf>,

    /// output folder for per-class embedding CSVs
    #[arg(long, global = true)]
    csvs_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print per-class counts of input images, output images and embeddings
    Stats,
    /// Detect landmarks for every class and write images and CSVs
    Bootstrap(BootstrapArgs),
    /// Remove output images that have no embedding row
    Align(AlignArgs),
    /// stats, bootstrap, stats, align, stats
    Run {
        #[command(flatten)]
        bootstrap: BootstrapArgs,
        #[command(flatten)]
        align: AlignArgs,
    },
    /// Print the joint angles of one landmark file
    Angles {
        /// landmark JSON as read by the sidecar model
        pose: PathBuf,
    },
}

#[derive(Args, Clone)]
struct BootstrapArgs {
    /// process at most this many images per class
    #[arg(short, long)]
    limit: Option<usize>,

    /// root of the precomputed landmark files, defaults to the input folder
    #[arg(long)]
    landmarks: Option<PathBuf>,

    /// process classes in parallel
    #[arg(long)]
    parallel: bool,

    #[arg(long)]
    no_progress: bool,

    /// save a rerun recording of every processed image
    #[arg(long)]
    rerun: Option<PathBuf>,

    /// write the bootstrap report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct AlignArgs {
    /// print every removed image
    #[arg(short, long)]
    verbose: bool,

    /// only show what would be removed
    #[arg(long)]
    dry_run: bool,
}

fn load_config(cli: &PbrsCli) -> anyhow::Result<BootstrapConfig> {
    let mut config = match &cli.config {
        Some(path) => BootstrapConfig::from_json_file(path)?,
        None => BootstrapConfig::default(),
    };
    if let Some(p) = &cli.images_in {
        config.images_in = p.clone();
    }
    if let Some(p) = &cli.images_out {
        config.images_out = p.clone();
    }
    if let Some(p) = &cli.csvs_out {
        config.csvs_out = p.clone();
    }
    Ok(config)
}

fn print_in_statistics(config: &BootstrapConfig) -> anyhow::Result<()> {
    let corpus = ImageCorpus::discover(&config.images_in, config.classes.as_deref())?;
    println!("{}", corpus.statistics());
    for issue in corpus.issues() {
        println!("  ! {}", issue);
    }
    Ok(())
}

fn print_out_statistics(config: &BootstrapConfig) -> anyhow::Result<()> {
    let images = ImageStore::new(&config.images_out).statistics()?;
    let rows = EmbeddingStore::new(&config.csvs_out).statistics()?;
    println!("{}", images);
    println!("{}", rows);
    for (class, n_images, n_rows) in images.differences(&rows) {
        println!(
            "  ! {}: {} images but {} rows, run `align`",
            class, n_images, n_rows
        );
    }
    Ok(())
}

fn bootstrap(config: &BootstrapConfig, args: &BootstrapArgs) -> anyhow::Result<BootstrapReport> {
    let mut config = config.clone();
    if args.limit.is_some() {
        config.per_class_limit = args.limit;
    }
    config.parallel_classes |= args.parallel;
    config.show_progress &= !args.no_progress;

    let corpus = ImageCorpus::discover(&config.images_in, config.classes.as_deref())
        .with_context(|| format!("reading {}", config.images_in.display()))?;
    let model = SidecarModel::new(
        args.landmarks
            .clone()
            .unwrap_or_else(|| config.images_in.clone()),
    );
    let recording = args
        .rerun
        .as_ref()
        .map(|path| rerun::RecordingStreamBuilder::new("pose_bootstrap").save(path))
        .transpose()?;

    let mut pipeline = BootstrapPipeline::new(&model, config)?;
    if let Some(recording) = &recording {
        pipeline = pipeline.with_recording(recording);
    }
    let now = Instant::now();
    let report = pipeline.run(&corpus);
    println!(
        "bootstrapping took {:.3} sec, {} detected, {} missed",
        now.elapsed().as_secs_f64(),
        report.detected(),
        report.missed()
    );
    for issue in &report.class_errors {
        println!("  ! {}", issue);
    }
    if let Some(path) = &args.report {
        write_report(path, "bootstrap", &report)?;
    }
    Ok(report)
}

fn align(config: &BootstrapConfig, args: &AlignArgs) -> anyhow::Result<()> {
    let images = ImageStore::new(&config.images_out);
    let embeddings = EmbeddingStore::new(&config.csvs_out);
    let reconciler = ConsistencyReconciler::new(&images, &embeddings);
    if args.dry_run {
        let plan = reconciler
            .plan()
            .with_context(|| format!("aligning against {}", config.csvs_out.display()))?;
        for alignment in &plan.alignments {
            for id in &alignment.orphaned_images {
                println!("would remove {}/{}", alignment.class, id);
            }
        }
        for issue in &plan.class_errors {
            println!("  ! {}", issue);
        }
        return Ok(());
    }
    let report = reconciler
        .reconcile()
        .with_context(|| format!("aligning against {}", config.csvs_out.display()))?;
    if args.verbose {
        for path in report.removed.values().flatten() {
            println!("Removed image from folder: {}", path.display());
        }
    }
    for issue in &report.class_errors {
        println!("  ! {}", issue);
    }
    println!("removed {} images without embeddings", report.removed_count());
    Ok(())
}

fn angles(path: &Path) -> anyhow::Result<()> {
    let pose = load_pose(path)?.ok_or_else(|| anyhow!("no pose in {}", path.display()))?;
    for joint in JointAngle::ALL {
        match joint.measure(&pose) {
            Some(angle) => println!("{:>16}: {}", joint.name(), angle),
            None => println!("{:>16}: undefined", joint.name()),
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = PbrsCli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Stats => {
            print_in_statistics(&config)?;
            print_out_statistics(&config)?;
        }
        Commands::Bootstrap(args) => {
            bootstrap(&config, args)?;
        }
        Commands::Align(args) => align(&config, args)?,
        Commands::Run {
            bootstrap: bootstrap_args,
            align: align_args,
        } => {
            print_in_statistics(&config)?;
            bootstrap(&config, bootstrap_args)?;
            print_out_statistics(&config)?;
            align(&config, align_args)?;
            print_out_statistics(&config)?;
        }
        Commands::Angles { pose } => angles(pose)?,
    }
    Ok(())
}
