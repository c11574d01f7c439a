pub mod file;
pub mod hud;
pub mod hud_payload;
pub mod memory;

use anyhow::Context;

use crate::application::config::{AppConfig, Credentials, SourceKind};
use crate::domain::ports::data_source::SignalSource;

use self::file::FileSource;
use self::hud::HudSource;

/// Build the signal source selected by `config.source.kind`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created or a file source
/// has no path.
pub fn create_source(
    config: &AppConfig,
    credentials: &Credentials,
) -> anyhow::Result<Box<dyn SignalSource>> {
    let target = &config.target;
    match config.source.kind {
        SourceKind::Hud => {
            let source = HudSource::new(
                &config.source.base_url,
                &target.organization,
                &target.repo,
                &target.branch,
                credentials.source_token.clone(),
                config.source.timeout_secs,
            )
            .context("cannot build HUD client")?;
            Ok(Box::new(source))
        }
        SourceKind::File => {
            let path = config
                .source
                .path
                .as_deref()
                .context("file source needs source.path")?;
            Ok(Box::new(FileSource::new(path, &target.branch)))
        }
    }
}
