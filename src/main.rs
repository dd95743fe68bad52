use std::sync::Arc;

use clap::Parser;
use mintforge::catalog::Catalog;
use mintforge::config::setup_logging;
use mintforge::generator::Generator;
use mintforge::services::{LocalAssetStore, OpenAiImageSynthesizer};
use sea_orm_migration::MigratorTrait;
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = mintforge::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let catalog = match Catalog::load(cli.catalog.as_deref()) {
        Ok(catalog) => catalog,
        Err(err) => {
            error!("Failed to load catalog: {}", err);
            return;
        }
    };

    let db = match mintforge::db::connect_db(&cli.database_path).await {
        Ok(db) => db,
        Err(err) => {
            error!("Database connection error: {}", err);
            return;
        }
    };

    if let Err(err) = mintforge::db::migrations::Migrator::up(&db, None).await {
        error!("Database migration error: {}", err);
        return;
    }

    let assets = match LocalAssetStore::new(&cli.image_dir, &cli.base_url) {
        Ok(assets) => assets,
        Err(err) => {
            error!("Image store setup error: {}", err);
            return;
        }
    };
    info!(
        "Storing images in {} using model {}",
        assets.root().display(),
        cli.image_model
    );

    let db = Arc::new(db);
    let generator = Arc::new(Generator::new(
        Arc::new(catalog),
        Arc::new(
            OpenAiImageSynthesizer::new(&cli.openai_api_key, &cli.image_model)
                .with_endpoint(&cli.images_endpoint),
        ),
        Arc::new(assets),
        db.clone(),
    ));

    if let Err(err) = mintforge::web::setup_server(
        &cli.listen_address,
        cli.port,
        generator,
        db,
        cli.batch_size,
        &cli.image_dir,
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
