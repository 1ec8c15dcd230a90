use std::io;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;

use predictor::PredictorConfig;

#[actix_rt::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = PredictorConfig::from_env()?;
    let model = web::Data::from(predictor::load_model(config.model_path())?);
    info!(
        "loaded model with {} trees from {}",
        model.trees().len(),
        config.model_path().display()
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(model.clone())
            .configure(predictor::routes)
    });

    if let Some(workers) = config.workers() {
        server = server.workers(workers.get());
    }

    let server = server.bind((config.host(), config.port()))?;
    info!("listening at {}", config.addr());

    server.run().await
}
