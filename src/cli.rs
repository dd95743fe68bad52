//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_IMAGE_DIR, DEFAULT_IMAGE_MODEL, MAX_BATCH_SIZE,
};
use crate::services::openai::DEFAULT_IMAGES_ENDPOINT;

fn parse_batch_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|err| format!("invalid batch size {value}: {err}"))?;
    if size == 0 || size > MAX_BATCH_SIZE {
        return Err(format!("batch size must be between 1 and {MAX_BATCH_SIZE}"));
    }
    Ok(size)
}

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "MINTFORGE_DEBUG")]
    /// Enable debug logging. Env: MINTFORGE_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "MINTFORGE_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: MINTFORGE_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "MINTFORGE_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: MINTFORGE_LISTEN_ADDRESS
    pub listen_address: String,
    #[clap(
        long,
        short,
        default_value = "http://localhost:9000/",
        env = "MINTFORGE_BASE_URL"
    )]
    /// Public URL prefix stored image references are built from.
    /// Env: MINTFORGE_BASE_URL
    pub base_url: String,

    #[clap(
        long,
        default_value = "mintforge.sqlite",
        env = "MINTFORGE_DATABASE_PATH"
    )]
    /// Path to the database file, eg `/data/mintforge.sqlite`.
    /// Env: MINTFORGE_DATABASE_PATH
    pub database_path: String,

    #[clap(long, default_value = DEFAULT_IMAGE_DIR, env = "MINTFORGE_IMAGE_DIR")]
    /// Where generated images are written and served from.
    /// Env: MINTFORGE_IMAGE_DIR
    pub image_dir: PathBuf,

    #[clap(long, env = "MINTFORGE_CATALOG")]
    /// JSON file replacing the bundled trait, style and motion catalog.
    /// Env: MINTFORGE_CATALOG
    pub catalog: Option<PathBuf>,

    #[clap(
        long,
        default_value_t = DEFAULT_BATCH_SIZE,
        value_parser = parse_batch_size,
        env = "MINTFORGE_BATCH_SIZE"
    )]
    /// Units per batch when the request does not say, 1 to 10.
    /// Env: MINTFORGE_BATCH_SIZE
    pub batch_size: usize,

    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    /// OpenAI API key. Env: OPENAI_API_KEY
    pub openai_api_key: String,

    #[clap(long, default_value = DEFAULT_IMAGE_MODEL, env = "MINTFORGE_IMAGE_MODEL")]
    /// Image model name. Env: MINTFORGE_IMAGE_MODEL
    pub image_model: String,

    #[clap(
        long,
        default_value = DEFAULT_IMAGES_ENDPOINT,
        env = "MINTFORGE_IMAGES_ENDPOINT"
    )]
    /// Image generations endpoint, eg an API-compatible proxy.
    /// Env: MINTFORGE_IMAGES_ENDPOINT
    pub images_endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cli = CliOptions::try_parse_from(["mintforge", "--openai-api-key", "sk-test"])
            .expect("parse");
        assert_eq!(cli.port.get(), 9000);
        assert_eq!(cli.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(cli.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(cli.images_endpoint, DEFAULT_IMAGES_ENDPOINT);
        assert!(cli.catalog.is_none());
    }

    #[test]
    fn batch_size_is_bounded() {
        assert!(parse_batch_size("0").is_err());
        assert!(parse_batch_size("11").is_err());
        assert_eq!(parse_batch_size("10"), Ok(10));
    }
}
