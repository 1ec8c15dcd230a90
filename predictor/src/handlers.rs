use actix_web::{
    http::header::ContentType, web, Error, HttpRequest, HttpResponse, Responder,
};
use forest::{RandomForest, Regressor};
use log::debug;

use crate::{FeatureRecord, Prediction, PredictorErr};

/// Body of the liveness endpoint.
pub const HOME_MESSAGE: &str = "Diabetes prediction API is running";

/// JSON extractor settings: a body that is not a valid feature record is a
/// client error, reported like every other `PredictorErr`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| -> Error {
        PredictorErr::InvalidInput(err.to_string()).into()
    })
}

/// `GET /`
pub async fn home() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(HOME_MESSAGE)
}

/// `POST /predict`
pub async fn predict(
    model: web::Data<RandomForest>,
    record: web::Json<FeatureRecord>,
) -> Result<web::Json<Prediction>, PredictorErr> {
    let value = model
        .predict_one(&record.to_row())
        .map_err(PredictorErr::Prediction)?;

    debug!("predicted {value} for {:?}", *record);
    Ok(web::Json(Prediction::rounded(value)))
}
