use std::{fs, path::Path};

use forest::{persist, ForestErr, ForestParams, Regressor, FEATURE_NAMES};
use trainer::{TrainerConfig, TrainerErr};

const ROWS: usize = 120;

/// Writes a deterministic diabetes-shaped csv whose target mostly follows bmi and s5.
fn write_dataset(path: &Path) {
    let mut content = FEATURE_NAMES.join(",");
    content.push_str(",target\n");

    for i in 0..ROWS {
        let row: Vec<f64> = (0..FEATURE_NAMES.len())
            .map(|j| ((i * (j + 3) * 7 + j * 13) % 29) as f64 / 29.0 - 0.5)
            .collect();
        let target = 150.0 + 300.0 * row[2] + 120.0 * row[8] + (i % 5) as f64;

        let cells: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
        content.push_str(&format!("{},{target:.2}\n", cells.join(",")));
    }

    fs::write(path, content).unwrap();
}

fn config(dir: &Path) -> TrainerConfig {
    let dataset = dir.join("diabetes.csv");
    write_dataset(&dataset);

    TrainerConfig::new(dataset, dir.join("model.json")).with_params(ForestParams {
        n_estimators: 15,
        ..ForestParams::default()
    })
}

#[test]
fn training_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let first = trainer::fit(&config).unwrap();
    let second = trainer::fit(&config).unwrap();

    assert_eq!(first.evaluation, second.evaluation);
    assert_eq!(first.evaluation.n_test, 24);
    assert_eq!(first.evaluation.n_train, 96);
    assert_eq!(first.forest.trees().len(), 15);
}

#[test]
fn trained_model_beats_the_mean() {
    let dir = tempfile::tempdir().unwrap();
    let trained = trainer::fit(&config(dir.path())).unwrap();

    assert!(trained.evaluation.r2 > 0.5, "r2 = {}", trained.evaluation.r2);
    assert!(trained.evaluation.mse >= 0.0);
}

#[test]
fn saved_artifact_reloads_with_the_same_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let trained = trainer::fit(&config).unwrap();
    trained.save(config.model_path()).unwrap();

    let loaded = persist::load(config.model_path()).unwrap();
    let dataset = trainer::load_dataset(&config).unwrap();

    assert_eq!(loaded.feature_names(), FEATURE_NAMES);
    assert_eq!(
        loaded.predict(dataset.features()).unwrap(),
        trained.forest.predict(dataset.features()).unwrap()
    );
}

#[test]
fn scaled_training_still_fits() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path()).with_scale(true);

    let dataset = trainer::load_dataset(&config).unwrap();
    let bmi_mean = dataset.features().column(2).mean().unwrap();
    assert!(bmi_mean.abs() < 1e-12);

    assert!(trainer::fit(&config).is_ok());
}

#[test]
fn unexpected_columns_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("other.csv");
    fs::write(&dataset, "height,weight,target\n1,2,3\n4,5,6\n").unwrap();

    let config = TrainerConfig::new(dataset, dir.path().join("model.json"));
    assert!(matches!(
        trainer::fit(&config),
        Err(TrainerErr::FeatureMismatch { .. })
    ));
}

#[test]
fn missing_dataset_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainerConfig::new(dir.path().join("absent.csv"), dir.path().join("m.json"));

    assert!(matches!(
        trainer::fit(&config),
        Err(TrainerErr::Forest(ForestErr::Io(_)))
    ));
}
