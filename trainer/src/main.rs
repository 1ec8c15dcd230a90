use anyhow::Context;
use trainer::TrainerConfig;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = TrainerConfig::from_env()?;
    let trained = trainer::fit(&config).with_context(|| {
        format!(
            "failed to train on {}",
            config.dataset_path().display()
        )
    })?;

    println!("Model trained successfully");
    println!("Mean Squared Error (MSE): {:.2}", trained.evaluation.mse);
    println!("R^2 Score: {:.2}", trained.evaluation.r2);

    trained
        .save(config.model_path())
        .with_context(|| format!("failed to save {}", config.model_path().display()))?;
    println!("Model saved to {}", config.model_path().display());

    Ok(())
}
