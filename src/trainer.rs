//! Offline training pipeline: CSV in, model and encoder artifacts out, with
//! an evaluation report on the held-out split printed to stdout.

use tracing::info;

use crate::artifacts::{self, ENCODERS_FILE, MODEL_FILE};
use crate::config::TrainingConfig;
use crate::dataset;
use crate::error::{Result, TriageError};
use crate::forest::{train_forest, TrainDataset, TrainOptions};
use crate::metrics::{self, ConfusionMatrix};
use crate::schema;

pub fn run(config: &TrainingConfig) -> Result<()> {
    info!("Loading dataset from {}", config.dataset.display());
    let rows = dataset::load_csv(&config.dataset)?;
    info!("Loaded {} rows", rows.len());

    let encoders = dataset::fit_encoders(&rows);
    let (x, y) = dataset::encode(&rows, &encoders)?;
    let classes = encoders
        .encoder(schema::LABEL_COLUMN)
        .ok_or_else(|| TriageError::Validation("label encoder missing after fit".to_string()))?
        .classes()
        .to_vec();

    let (train_idx, test_idx) =
        dataset::train_test_split(rows.len(), config.test_fraction, config.seed);
    info!(
        "Split {} train / {} test rows (seed {})",
        train_idx.len(),
        test_idx.len(),
        config.seed
    );

    let train_set = TrainDataset {
        classes: classes.clone(),
        x: train_idx.iter().map(|&i| x[i].clone()).collect(),
        y: train_idx.iter().map(|&i| y[i]).collect(),
    };
    let fingerprint = artifacts::schema_fingerprint(&encoders);
    let options = TrainOptions {
        trees: config.trees,
        seed: config.seed,
        ..TrainOptions::default()
    };
    info!("Fitting {} trees", options.trees);
    let forest =
        train_forest(&train_set, &options, &fingerprint).map_err(TriageError::Validation)?;

    std::fs::create_dir_all(&config.out_dir)?;
    let model_path = config.out_dir.join(MODEL_FILE);
    let encoders_path = config.out_dir.join(ENCODERS_FILE);
    forest.save(&model_path)?;
    encoders.save(&encoders_path)?;
    info!("Saved model to {}", model_path.display());
    info!("Saved encoders to {}", encoders_path.display());

    let mut cm = ConfusionMatrix::new(classes.len());
    for &i in &test_idx {
        let predicted = forest.predict(&x[i])?;
        cm.add(y[i], predicted);
    }
    println!("Model Accuracy: {:.2}", metrics::accuracy(&cm));
    println!("Classification Report:");
    println!("{}", metrics::render_report(&cm, &classes));
    Ok(())
}
