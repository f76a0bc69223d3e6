//! Spectra CLI - spectral GCN node classification from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show statistics about the bundled Karate Club graph
//! spectra stats
//!
//! # Train with identity + landmark-distance features
//! spectra train --features distances --epochs 250
//!
//! # Save the per-epoch embedding trajectory
//! spectra train --features identity --embeddings-out trajectory.json
//!
//! # Compare both feature sets side by side
//! spectra compare --seed 7
//!
//! # Use your own graph
//! spectra train --edges edges.txt --attributes attributes.csv
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use spectra_core::{formats, karate, seed_split, FeatureSet, Graph, Role};
use spectra_nn::experiment::{self, ExperimentConfig, ExperimentReport};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spectra")]
#[command(about = "Semi-supervised node classification with spectral graph convolutions", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show statistics about the graph
    Stats {
        #[command(flatten)]
        graph: GraphArgs,
    },

    /// Train one model and evaluate it on the held-out members
    Train {
        #[command(flatten)]
        graph: GraphArgs,

        #[command(flatten)]
        train: TrainArgs,

        /// Input features
        #[arg(short, long)]
        features: Option<FeatureArg>,

        /// Write the training history (losses, checkpoints, embeddings) as JSON
        #[arg(long)]
        embeddings_out: Option<PathBuf>,
    },

    /// Train identity and distance models in parallel and compare them
    Compare {
        #[command(flatten)]
        graph: GraphArgs,

        #[command(flatten)]
        train: TrainArgs,
    },
}

#[derive(Args)]
struct GraphArgs {
    /// Edge list (`u v` per line). Defaults to the bundled Karate Club.
    #[arg(long, requires = "attributes")]
    edges: Option<PathBuf>,

    /// Attribute table (`node,role,community` CSV)
    #[arg(long, requires = "edges")]
    attributes: Option<PathBuf>,
}

#[derive(Args)]
struct TrainArgs {
    /// Experiment config (JSON); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of epochs
    #[arg(long)]
    epochs: Option<usize>,

    /// Seed for parameter initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// SGD momentum
    #[arg(long)]
    momentum: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FeatureArg {
    /// One-hot node ids
    Identity,
    /// One-hot ids plus hop distance to each faction leader
    Distances,
}

impl From<FeatureArg> for FeatureSet {
    fn from(arg: FeatureArg) -> Self {
        match arg {
            FeatureArg::Identity => FeatureSet::Identity,
            FeatureArg::Distances => FeatureSet::LandmarkDistances,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Stats { graph } => cmd_stats(&graph),
        Commands::Train {
            graph,
            train,
            features,
            embeddings_out,
        } => cmd_train(&graph, &train, features, embeddings_out),
        Commands::Compare { graph, train } => cmd_compare(&graph, &train),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_graph(args: &GraphArgs) -> Result<Graph> {
    let graph = match (&args.edges, &args.attributes) {
        (Some(edges), Some(attributes)) => {
            info!(edges = %edges.display(), attributes = %attributes.display(), "loading graph");
            formats::load_graph(edges, attributes).with_context(|| {
                format!(
                    "Failed to load graph from {} and {}",
                    edges.display(),
                    attributes.display()
                )
            })?
        }
        _ => karate::karate_club().context("Failed to load bundled Karate Club graph")?,
    };
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}

fn load_config(args: &TrainArgs) -> Result<ExperimentConfig> {
    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    if let Some(epochs) = args.epochs {
        config.train.epochs = epochs;
    }
    if let Some(seed) = args.seed {
        config.model.seed = seed;
    }
    if let Some(lr) = args.lr {
        config.train.learning_rate = lr;
    }
    if let Some(momentum) = args.momentum {
        config.train.momentum = momentum;
    }
    Ok(config)
}

fn cmd_stats(args: &GraphArgs) -> Result<()> {
    let graph = load_graph(args)?;
    let n = graph.node_count();
    let degrees: Vec<usize> = (0..n).map(|i| graph.degree(i)).collect();
    let min = degrees.iter().min().copied().unwrap_or(0);
    let max = degrees.iter().max().copied().unwrap_or(0);
    let mean = if n > 0 {
        degrees.iter().sum::<usize>() as f64 / n as f64
    } else {
        0.0
    };

    println!("Nodes:          {}", n);
    println!("Edges:          {}", graph.edge_count());
    println!(
        "Administrators: {}",
        graph.nodes_with_role(Role::Administrator).len()
    );
    println!(
        "Instructors:    {}",
        graph.nodes_with_role(Role::Instructor).len()
    );
    println!("Members:        {}", graph.nodes_with_role(Role::Member).len());
    println!("Degree:         min {min}, max {max}, mean {mean:.2}");
    Ok(())
}

fn cmd_train(
    graph_args: &GraphArgs,
    train_args: &TrainArgs,
    features: Option<FeatureArg>,
    embeddings_out: Option<PathBuf>,
) -> Result<()> {
    let graph = load_graph(graph_args)?;
    let mut config = load_config(train_args)?;
    if let Some(features) = features {
        config.features = features.into();
    }

    let pb = ProgressBar::new(config.train.epochs as u64);
    pb.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} epochs  loss {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let start = Instant::now();
    let report = experiment::run_with(&graph, &config, |summary| {
        pb.set_position(summary.epoch as u64 + 1);
        pb.set_message(format!("{:.4}", summary.loss));
    })
    .context("Training failed")?;
    pb.finish_and_clear();
    info!(elapsed = ?start.elapsed(), "training finished");

    println!("Features:       {}", config.features);
    println!("Epochs:         {}", config.train.epochs);
    for r in &report.history.reports {
        let preds: Vec<String> = r.predictions.iter().map(|p| format!("{p:.4}")).collect();
        println!(
            "Epoch {:>6}  loss {:.4}  seed predictions [{}]",
            r.epoch,
            r.loss,
            preds.join(", ")
        );
    }
    print_predictions(&graph, &report)?;
    println!("Train accuracy: {:.3}", report.train_accuracy);
    println!("Test accuracy:  {:.3}", report.test_accuracy);
    println!("Time:           {:.2?}", start.elapsed());

    if let Some(path) = embeddings_out {
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report.history)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote training history to {}", path.display());
    }
    Ok(())
}

fn print_predictions(graph: &Graph, report: &ExperimentReport) -> Result<()> {
    let split = seed_split(graph)?;
    println!("Predictions:");
    for (pred, truth) in report.predictions.iter().zip(split.test.iter()) {
        let name = |admin: bool| if admin { "Administrator" } else { "Instructor" };
        let mark = if pred.label == truth.label { ' ' } else { '*' };
        println!(
            "  {mark} node {:>3}  {:<13}  (truth: {})",
            pred.node,
            name(pred.label),
            name(truth.label)
        );
    }
    Ok(())
}

fn cmd_compare(graph_args: &GraphArgs, train_args: &TrainArgs) -> Result<()> {
    let graph = load_graph(graph_args)?;
    let base = load_config(train_args)?;
    let configs: Vec<ExperimentConfig> = [FeatureSet::Identity, FeatureSet::LandmarkDistances]
        .into_iter()
        .map(|features| ExperimentConfig {
            features,
            ..base.clone()
        })
        .collect();

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!(
        "Training {} models for {} epochs...",
        configs.len(),
        base.train.epochs
    ));
    pb.enable_steady_tick(Duration::from_millis(100));
    let start = Instant::now();
    let results = experiment::run_many(&graph, &configs);
    pb.finish_and_clear();
    info!(runs = results.len(), elapsed = ?start.elapsed(), "comparison finished");

    println!("{:<12} {:>10} {:>10} {:>12}", "Features", "Train acc", "Test acc", "Final loss");
    for result in results {
        let report = result.context("Training failed")?;
        println!(
            "{:<12} {:>10.3} {:>10.3} {:>12.4}",
            report.features.to_string(),
            report.train_accuracy,
            report.test_accuracy,
            report.history.final_loss().unwrap_or(f32::NAN)
        );
    }
    println!("Time: {:.2?}", start.elapsed());
    Ok(())
}
