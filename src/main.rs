use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use spendcat::datasets::json::read_records;
use spendcat::io::write_model;
use spendcat::{CategoryPredictor, Config, Evaluation, NaiveBayes, Result};

#[derive(Parser)]
#[command(name = "spendcat", version, about = "Bank transaction categorizer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on a transaction export and report validation accuracy.
    Train(TrainArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// JSON array of transaction objects.
    #[arg(long)]
    data: PathBuf,

    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Highest rank of the true category still counted as correct.
    #[arg(long)]
    tolerance: Option<usize>,

    /// Column holding the booking date.
    #[arg(long, default_value = "date")]
    date_column: String,

    /// Use only rows booked after this date (YYYY-MM-DD, exclusive).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Use only rows booked before this date (YYYY-MM-DD, exclusive).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Write the trained model as JSON.
    #[arg(long)]
    model_out: Option<PathBuf>,
}

fn main() -> ExitCode {
    spendcat::logging::init("info");

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Train(args) => train(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let tolerance = args.tolerance.unwrap_or(config.evaluation.tolerance_rank);
    let date_column = args.date_column.as_str();

    let mut frame = read_records(BufReader::new(File::open(&args.data)?), date_column)?;

    if args.from.is_some() || args.to.is_some() {
        let total = frame.len();
        frame = frame.between(date_column, args.from, args.to)?;
        info!(kept = frame.len(), total, "applied date window");
    }

    if frame.columns().iter().any(|c| c == date_column) {
        frame.sort_by_date(date_column)?;
    } else {
        warn!(column = date_column, "no date column, keeping file order");
    }

    let (train, validation) = frame.split(config.evaluation.train_ratio)?;
    info!(
        train = train.len(),
        validation = validation.len(),
        path = %args.data.display(),
        "loaded transactions"
    );

    let mut predictor = CategoryPredictor::new(config.service.clone());
    predictor.train(&train, NaiveBayes::with_config(config.encoder))?;

    println!("Priors:");
    for (label, p) in predictor.priors().iter() {
        println!("  {:<24} {:.4}", label, p);
    }

    println!();
    println!("Top tokens:");
    for (label, tokens) in predictor.likelihoods(None) {
        let listed: Vec<String> = tokens
            .iter()
            .map(|(token, p)| format!("{} ({:.2})", token, p))
            .collect();
        println!("  {}: {}", label, listed.join(", "));
    }

    if validation.len() < config.evaluation.min_validation_rows {
        warn!(
            rows = validation.len(),
            needed = config.evaluation.min_validation_rows,
            "too few validation rows, skipping evaluation"
        );
    } else {
        let evaluation = predictor.validate(&validation, tolerance)?;
        print_evaluation(&evaluation, tolerance);
    }

    if let Some(path) = &args.model_out {
        if let Some(model) = predictor.model() {
            write_model(model, BufWriter::new(File::create(path)?))?;
            info!(path = %path.display(), "model written");
        }
    }

    Ok(())
}

fn print_evaluation(evaluation: &Evaluation, tolerance: usize) {
    println!();
    println!("Validation (tolerance {}):", tolerance);
    println!("  {:<24} {:>6} {:>8} {:>9}", "category", "rows", "median", "accuracy");
    for class in &evaluation.classes {
        println!(
            "  {:<24} {:>6} {:>8.1} {:>8.1}%",
            class.label,
            class.count,
            class.place_q50,
            class.accuracy * 100.0
        );
    }

    match evaluation.weighted_accuracy {
        Some(acc) => println!("  weighted accuracy: {:.1}%", acc * 100.0),
        None => println!("  weighted accuracy: n/a"),
    }
    if evaluation.dropped > 0 {
        println!("  {} rows with categories unseen in training were skipped", evaluation.dropped);
    }
}
