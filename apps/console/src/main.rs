mod config;
mod demos;
mod dispatch;

use std::io::{stdin, stdout};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use futures::Future;

use config::Settings;
use dispatch::{Dispatcher, MenuEntry};

#[derive(Debug, Parser)]
#[command(name = "console", about = "Interactive demos for the document store")]
struct Args {
    /// Settings file with the service endpoint and master key.
    #[arg(long, default_value = "console.toml")]
    settings: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let dispatcher = Dispatcher::new("Document Db Demos", menu(&args.settings));

    let stdin = stdin();
    let mut stdout = stdout();
    dispatcher.run(stdin.lock(), &mut stdout).await?;
    Ok(())
}

/// The immutable command table. Settings are re-read at the start of every
/// action so edits to the file take effect without restarting.
fn menu(settings_path: &Path) -> Vec<MenuEntry> {
    vec![
        entry("DB", "Databases", settings_path, demos::databases::run),
        entry("CO", "Collections", settings_path, demos::collections::run),
        entry("DO", "Documents", settings_path, demos::documents::run),
        entry("IX", "Indexing", settings_path, demos::indexing::run),
        entry(
            "UP",
            "Users & Permissions",
            settings_path,
            demos::users_permissions::run,
        ),
        entry(
            "SP",
            "Stored Procedures",
            settings_path,
            demos::stored_procedures::run,
        ),
        entry("TR", "Triggers", settings_path, demos::triggers::run),
        entry(
            "UF",
            "User Defined Functions",
            settings_path,
            demos::udfs::run,
        ),
        entry("C", "Cleanup", settings_path, demos::cleanup::run),
    ]
}

fn entry<F, Fut>(
    code: &'static str,
    label: &'static str,
    settings_path: &Path,
    demo: F,
) -> MenuEntry
where
    F: Fn(Settings) -> Fut + Copy + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let settings_path = settings_path.to_path_buf();
    MenuEntry {
        code,
        label,
        action: Box::new(move || {
            let settings_path = settings_path.clone();
            Box::pin(async move {
                let settings = Settings::load(&settings_path)?;
                demo(settings).await
            })
        }),
    }
}
