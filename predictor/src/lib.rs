pub mod config;
pub mod error;
pub mod features;
pub mod handlers;

use std::{path::Path, sync::Arc};

use actix_web::web;
use forest::{persist, RandomForest, FEATURE_NAMES};

pub use config::PredictorConfig;
pub use error::{PredictorErr, Result};
pub use features::{FeatureRecord, Prediction};

/// Loads the model artifact once, for sharing between every request.
///
/// # Returns
/// An error if the file is missing or corrupt, or the model was not trained
/// on `FEATURE_NAMES` in that order.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Arc<RandomForest>> {
    let path = path.as_ref();
    let model = persist::load(path).map_err(|source| PredictorErr::ModelLoad {
        path: path.to_path_buf(),
        source,
    })?;

    if model.feature_names() != FEATURE_NAMES {
        return Err(PredictorErr::IncompatibleModel {
            features: model.feature_names().to_vec(),
        });
    }

    Ok(Arc::new(model))
}

/// Registers the service's routes.
///
/// The model must be registered as `web::Data<RandomForest>` by the caller.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config())
        .route("/", web::get().to(handlers::home))
        .route("/predict", web::post().to(handlers::predict));
}
