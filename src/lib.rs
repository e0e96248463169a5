//! Cocoslice: COCO detection samples for continual-learning loops.
//!
//! Cocoslice turns raw COCO-style annotations into aligned per-sample
//! targets, runs detection augmentations that move the image and every
//! target field together, and exposes dataset views restricted to a slice
//! of images and categories.
//!
//! # Modules
//!
//! - [`ir`]: ids, typed boxes, raw annotations and the [`ir::Target`] record
//! - [`geometry`]: coordinate transforms for boxes, masks and keypoints
//! - [`rasterize`]: segmentation to bitmap conversion
//! - [`normalize`]: raw annotations to targets
//! - [`augment`]: augmentation steps and per-split pipelines
//! - [`store`]: annotation stores views read from
//! - [`view`]: filtered dataset views and their factory
//! - [`error`]: error types for cocoslice operations

pub mod augment;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod normalize;
pub mod rasterize;
pub mod store;
pub mod view;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub use error::CocosliceError;

use augment::worker_rng;
use ir::{Category, CategoryId, ImageId, TargetSummary};
use store::CocoStore;
use view::{DatasetConfig, DatasetView, ViewFactory};

/// The cocoslice CLI application.
#[derive(Parser)]
#[command(name = "cocoslice")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the category catalog and size of a view.
    Catalog(CatalogArgs),
    /// Fetch samples from a view and print their targets.
    Inspect(InspectArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Options shared by every subcommand that builds a view.
#[derive(clap::Args)]
struct ViewArgs {
    /// Dataset config file (.yaml, .yml or .json).
    #[arg(long, env = "COCOSLICE_CONFIG", conflicts_with = "root")]
    config: Option<PathBuf>,

    /// Dataset root using the default layout, instead of a config file.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Split to open ('train', 'val' or 'extra').
    #[arg(long, default_value = "val")]
    split: String,

    /// Restrict the view to these image ids (comma separated).
    #[arg(long, value_delimiter = ',')]
    img_ids: Option<Vec<u64>>,

    /// Restrict the catalog to these category ids (comma separated).
    #[arg(long, value_delimiter = ',')]
    class_ids: Option<Vec<u64>>,

    /// Rasterize segmentation masks.
    #[arg(long)]
    masks: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(clap::Args)]
struct CatalogArgs {
    #[command(flatten)]
    view: ViewArgs,
}

#[derive(clap::Args)]
struct InspectArgs {
    #[command(flatten)]
    view: ViewArgs,

    /// Positions in the view to fetch.
    #[arg(long = "index", default_value = "0")]
    indices: Vec<usize>,

    /// Seed augmentation for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct CatalogReport<'a> {
    split: String,
    images: usize,
    categories: Vec<&'a Category>,
}

/// Run the cocoslice CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocosliceError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Catalog(args)) => run_catalog(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        None => {
            println!("cocoslice {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("COCO detection samples for continual-learning loops.");
            println!();
            println!("Run 'cocoslice --help' for usage information.");
            Ok(())
        }
    }
}

fn open_view(args: &ViewArgs) -> Result<DatasetView<CocoStore>, CocosliceError> {
    let mut config = match (&args.config, &args.root) {
        (Some(path), _) => DatasetConfig::load(path)?,
        (None, Some(root)) => DatasetConfig::new(root),
        (None, None) => {
            return Err(CocosliceError::invalid_params(
                "either --config or --root is required",
            ))
        }
    };
    config.masks |= args.masks;

    let img_ids: Option<Vec<ImageId>> = args
        .img_ids
        .as_ref()
        .map(|ids| ids.iter().copied().map(ImageId::from).collect());
    let class_ids: Option<Vec<CategoryId>> = args
        .class_ids
        .as_ref()
        .map(|ids| ids.iter().copied().map(CategoryId::from).collect());

    ViewFactory::new(config).build(&args.split, img_ids.as_deref(), class_ids.as_deref())
}

fn run_catalog(args: CatalogArgs) -> Result<(), CocosliceError> {
    let view = open_view(&args.view)?;

    match args.view.output {
        OutputFormat::Json => {
            let report = CatalogReport {
                split: view.split().to_string(),
                images: view.len(),
                categories: view.catalog().values().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!(
                "split {}: {} image(s), {} categor{}",
                view.split(),
                view.len(),
                view.catalog().len(),
                if view.catalog().len() == 1 { "y" } else { "ies" }
            );
            for category in view.catalog().values() {
                match &category.supercategory {
                    Some(sup) => println!("  {} {} ({})", category.id, category.name, sup),
                    None => println!("  {} {}", category.id, category.name),
                }
            }
        }
    }
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), CocosliceError> {
    let view = open_view(&args.view)?;

    let mut summaries: Vec<TargetSummary> = Vec::with_capacity(args.indices.len());
    match args.seed {
        Some(seed) => {
            let mut rng = worker_rng(seed, 0, 0);
            for &index in &args.indices {
                summaries.push(view.get_with_rng(index, &mut rng)?.target.summary());
            }
        }
        None => {
            for &index in &args.indices {
                summaries.push(view.get(index)?.target.summary());
            }
        }
    }

    match args.view.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Text => {
            for summary in &summaries {
                print!("{summary}");
            }
        }
    }
    Ok(())
}
