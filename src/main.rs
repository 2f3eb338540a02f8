use anyhow::Result;
use clap::Parser;

use ocr_desk::cli::{self, Cli, Commands, ExtractOptions};
use ocr_desk::server;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();

    match cli.command {
        Some(Commands::Serve) | None => {
            actix_web::rt::System::new().block_on(server::run(config))?;
        }
        Some(Commands::Extract {
            image,
            transform,
            original,
            save,
            copy,
        }) => {
            let options = ExtractOptions {
                transform,
                original,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::handle_extract(
                &config,
                &image,
                options,
                save.as_deref(),
                copy,
            ))?;
        }
        Some(Commands::Status) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::handle_status(&config))?;
        }
    }

    Ok(())
}
