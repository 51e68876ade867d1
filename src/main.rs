/// Put the pipeline stages together: load, split, train, evaluate, summarize and predict
use std::error::Error;

use clap::Parser;
use log::{error, info};
use ndarray::Array2;

use housing_pipeline::config::Config;
use housing_pipeline::dataset::Dataset;
use housing_pipeline::model::{self, LinearRegressor, TrainingEvent};
use housing_pipeline::pipeline::{self, Evaluation};
use housing_pipeline::preprocess::FEATURE_NAMES;

/// Prints the labelled correlation matrix as a fixed-width table
/// input: correlation matrix over the features followed by the price
/// output: none (writes to stdout)
/// logic: header row of labels cut to 6 chars; one row per variable, 2 decimals per cell
fn print_correlations(corr: &Array2<f64>) {
    let labels: Vec<&str> = FEATURE_NAMES.iter().copied().chain(["price"]).collect();
    print!("{:<12}", "");
    for l in &labels {
        print!("{:>7}", &l[..l.len().min(6)]);
    }
    println!();
    for (i, row) in corr.rows().into_iter().enumerate() {
        print!("{:<12}", labels.get(i).copied().unwrap_or("?"));
        for v in row {
            print!("{:>7.2}", v);
        }
        println!();
    }
}

fn print_evaluation(eval: &Evaluation, show: usize) {
    let m = &eval.metrics;
    println!("\nTest Predictions:");
    for (i, s) in eval.samples.iter().take(show).enumerate() {
        println!(
            "Sample {}: Predicted: {:.2}, Actual: {:.2}, Error: {:.2}%",
            i, s.predicted, s.actual, s.error_pct
        );
    }
    println!("\n{:<30} {:>12.5}", "MSE (normalized)", m.mse);
    println!("{:<30} {:>12.5}", "RMSE (normalized)", m.rmse);
    println!("{:<30} {:>12.5}", "R2 score", m.r2);
    println!("{:<30} {:>11.2}%", "Mean percentage error", m.mape);
    if let Some(w) = eval.windowed_mape {
        println!("{:<30} {:>11.2}%", "Percentage error (window)", w);
    }
    for u in &m.undefined {
        println!("note: {:?}", u);
    }
}

/// load data, split, train, evaluate and optionally predict one house
/// input: command line (see `Config`)
/// output: none
/// logic: load the CSV into a `Dataset`; split with the configured ratio and seed;
/// train `LinearRegressor` on the training half; score the testing half;
/// print the correlation table; answer `--predict` without ever aborting on it
fn main() -> Result<(), Box<dyn Error>> {
    let cfg = Config::parse();
    let env = env_logger::Env::default().default_filter_or("info");
    let mut logger = env_logger::Builder::from_env(env);
    if let Some(level) = &cfg.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    // 1) Load
    info!("Loading data from {}...", cfg.path);
    let dataset = Dataset::load_csv(&cfg.path)?;
    println!("Processed {} records", dataset.len());

    // 2) Split
    let split = dataset.split(cfg.train_ratio, cfg.seed)?;
    let x_train = dataset.feature_matrix(&split.training);
    let y_train = dataset.target_matrix(&split.training);

    // 3) Train
    let mut regressor = LinearRegressor::new();
    model::train(
        &mut regressor,
        &x_train,
        &y_train,
        &cfg.training_options(),
        None,
        |event| match event {
            TrainingEvent::Started { samples, epochs } => {
                info!("Training on {} samples for {} epochs", samples, epochs)
            }
            TrainingEvent::Completed { score } => info!("Training finished, score {:?}", score),
            TrainingEvent::Failed { reason } => error!("Training failed: {}", reason),
            _ => {}
        },
    )?;

    if let Some((coefs, intercept)) = regressor.coefficients() {
        println!("\nCoefficients:");
        for (name, c) in FEATURE_NAMES.iter().zip(&coefs) {
            println!("{:<30} {:>8.4}", name, c);
        }
        println!("{:<30} {:>8.4}", "intercept", intercept);
    }

    // 4) Evaluate
    let eval = pipeline::evaluate_split(&dataset, &split.testing, &regressor, cfg.sample_window)?;
    print_evaluation(&eval, cfg.show_samples);

    // 5) Correlations over raw values
    println!("\nCorrelation matrix:");
    print_correlations(&dataset.correlation_matrix());

    // 6) Optional single prediction
    if let Some(raw) = &cfg.predict {
        match pipeline::predict_price(raw, dataset.bounds(), &regressor) {
            Ok(price) => {
                println!("\nPredicted price: {:.2}", price);
                for hint in pipeline::influential_factors(raw, &dataset) {
                    println!("- {}", hint);
                }
            }
            Err(e) => println!("\nError: {}", e),
        }
    }

    Ok(())
}

/// the test functions
#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::{fs::File, io::Write};

    use housing_pipeline::dataset::Dataset;
    use housing_pipeline::model::{self, LinearRegressor, Regressor, TrainingOptions};
    use housing_pipeline::pipeline;
    use housing_pipeline::preprocess::FEATURE_COUNT;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const HEADER: &str = "price,area,bedrooms,bathrooms,stories,mainroad,guestroom,basement,hotwaterheating,airconditioning,parking,prefarea,furnishingstatus";

    /// END TO END: csv on disk through training, evaluation and a single prediction
    #[test]
    fn test_full_pipeline() -> Result<(), Box<dyn Error>> {
        let path = std::env::temp_dir().join("housing_pipeline_e2e.csv");
        let mut f = File::create(&path)?;
        writeln!(&mut f, "{}", HEADER)?;
        // price follows area closely, the other columns are random
        let mut rng = StdRng::seed_from_u64(7);
        let yes = |rng: &mut StdRng| if rng.random_bool(0.5) { "yes" } else { "no" };
        for i in 0..40u32 {
            let area = 2000 + 150 * i + rng.random_range(0..90);
            let bedrooms = rng.random_range(1..=5);
            let price = 1000 * area + 20_000 * bedrooms + rng.random_range(0..50_000);
            writeln!(
                &mut f,
                "{},{},{},{},{},{},{},{},{},{},{},{},{}",
                price,
                area,
                bedrooms,
                rng.random_range(1..=3),
                rng.random_range(1..=4),
                yes(&mut rng),
                yes(&mut rng),
                yes(&mut rng),
                yes(&mut rng),
                yes(&mut rng),
                rng.random_range(0..=3),
                yes(&mut rng),
                ["furnished", "semi-furnished", "unfurnished"][rng.random_range(0..3)],
            )?;
        }
        drop(f);

        let ds = Dataset::load_csv(path.to_str().unwrap())?;
        assert_eq!(ds.len(), 40);
        assert_eq!(ds.input_dimension(), FEATURE_COUNT);

        let split = ds.split(0.8, 42)?;
        assert_eq!(split.training.len(), 32);
        assert_eq!(split.testing.len(), 8);

        let mut lr = LinearRegressor::new();
        let mut events = 0;
        model::train(
            &mut lr,
            &ds.feature_matrix(&split.training),
            &ds.target_matrix(&split.training),
            &TrainingOptions::default(),
            None,
            |_| events += 1,
        )?;
        assert_eq!(events, 3);
        assert!(lr.score().unwrap() < 0.05);

        let eval = pipeline::evaluate_split(&ds, &split.testing, &lr, Some(5))?;
        assert_eq!(eval.metrics.samples, 8);
        assert!(eval.metrics.r2 > 0.8, "r2 = {}", eval.metrics.r2);
        assert!(eval.metrics.mape < 20.0);

        let corr = ds.correlation_matrix();
        assert!(corr[(0, FEATURE_COUNT)] > 0.9);

        let raw = pipeline::raw_features(split.testing[0]);
        let price = pipeline::predict_price(&raw, ds.bounds(), &lr)?;
        assert!(price.is_finite());

        std::fs::remove_file(&path)?;
        Ok(())
    }
}
