use std::fs;
use std::path::{Path, PathBuf};

use triage::artifacts::{ModelBundle, ENCODERS_FILE, MODEL_FILE};
use triage::config::TrainingConfig;
use triage::encoding::LabelEncoder;
use triage::{dataset, schema, trainer};

const HEADER: &str = "patient_id,age,family_history,smoking,alcohol,diet_score,physical_activity,symptom_score,mri_abnormality,risk_level";

fn write_dataset(dir: &Path) -> PathBuf {
    let mut lines = vec![HEADER.to_string()];
    for i in 0..24u32 {
        let high = i >= 12;
        let line = format!(
            "P{:03},{},{},{},{},{},{},{},{},{}",
            i + 1,
            30 + i * 2,
            if i % 2 == 0 { "Yes" } else { "No" },
            if i % 3 == 0 { "Yes" } else { "No" },
            if i % 4 == 0 { "Yes" } else { "No" },
            3 + (i % 5),
            1 + (i % 4),
            if high { 7 + (i % 3) } else { 1 + (i % 3) },
            if high { "Yes" } else { "No" },
            if high { "High" } else { "Low" },
        );
        lines.push(line);
    }
    let path = dir.join("dataset.csv");
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn training_config(dataset: PathBuf, out_dir: PathBuf) -> TrainingConfig {
    TrainingConfig {
        dataset,
        out_dir,
        trees: 20,
        seed: 42,
        test_fraction: 0.2,
    }
}

#[test]
fn train_run_writes_a_loadable_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = write_dataset(dir.path());
    let out_dir = dir.path().join("model");
    trainer::run(&training_config(dataset_path, out_dir.clone())).unwrap();

    assert!(out_dir.join(MODEL_FILE).exists());
    assert!(out_dir.join(ENCODERS_FILE).exists());

    let bundle = ModelBundle::load(&out_dir).unwrap();
    assert_eq!(bundle.forest.trees.len(), 20);
    assert_eq!(bundle.forest.n_features, schema::FEATURE_COLUMNS.len());
    assert_eq!(
        bundle.forest.classes,
        vec!["High".to_string(), "Low".to_string()]
    );

    // Encode a plausible request by hand and check the prediction is a
    // valid class code.
    let yes = |column: &str| {
        bundle
            .encoders
            .encoder(column)
            .unwrap()
            .transform("Yes")
            .unwrap() as f64
    };
    let features = vec![
        55.0,
        yes("family_history"),
        0.0,
        0.0,
        5.0,
        3.0,
        8.0,
        yes("mri_abnormality"),
    ];
    let code = bundle.forest.predict(&features).unwrap();
    assert!(code < bundle.forest.classes.len());
}

#[test]
fn training_is_reproducible_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = write_dataset(dir.path());
    let out_a = dir.path().join("model-a");
    let out_b = dir.path().join("model-b");

    trainer::run(&training_config(dataset_path.clone(), out_a.clone())).unwrap();
    trainer::run(&training_config(dataset_path, out_b.clone())).unwrap();

    assert_eq!(
        fs::read(out_a.join(MODEL_FILE)).unwrap(),
        fs::read(out_b.join(MODEL_FILE)).unwrap()
    );
    assert_eq!(
        fs::read(out_a.join(ENCODERS_FILE)).unwrap(),
        fs::read(out_b.join(ENCODERS_FILE)).unwrap()
    );
}

#[test]
fn refitted_encoders_invalidate_the_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = write_dataset(dir.path());
    let out_dir = dir.path().join("model");
    trainer::run(&training_config(dataset_path.clone(), out_dir.clone())).unwrap();

    // Simulate a later training run that saw an extra smoking class and
    // rewrote only the encoder artifact.
    let rows = dataset::load_csv(&dataset_path).unwrap();
    let mut encoders = dataset::fit_encoders(&rows);
    encoders.insert("smoking", LabelEncoder::fit(["No", "Yes", "Occasionally"]));
    encoders.save(out_dir.join(ENCODERS_FILE)).unwrap();

    let err = ModelBundle::load(&out_dir).unwrap_err();
    assert!(err.to_string().contains("fingerprint"), "{err}");
}

#[test]
fn malformed_rows_abort_training() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataset.csv");
    let content = format!(
        "{HEADER}\nP001,45,Yes,No,No,6,3,2,No,Low\nP002,61,No,Yes,Yes,3,1,8,Yes,High\nP003,old,No,No,No,4,2,3,No,Low\n"
    );
    fs::write(&path, content).unwrap();

    let out_dir = dir.path().join("model");
    let err = trainer::run(&training_config(path, out_dir.clone())).unwrap_err();
    assert!(err.to_string().contains("line 4"), "{err}");
    assert!(!out_dir.join(MODEL_FILE).exists());
}

#[test]
fn missing_dataset_file_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = training_config(dir.path().join("nope.csv"), dir.path().join("model"));
    assert!(trainer::run(&config).is_err());
}
