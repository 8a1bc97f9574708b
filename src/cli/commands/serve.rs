//! Serve command - run the document server.

use std::path::PathBuf;

use crate::config::Settings;

/// Arguments for the serve command.
pub struct ServeArgs {
    pub root: Option<PathBuf>,
    pub bind: Option<String>,
    pub no_watch: bool,
    pub static_dir: Option<PathBuf>,
}

/// Fold CLI flags into the loaded settings (CLI wins).
pub fn apply_overrides(args: &ServeArgs, settings: &mut Settings) {
    if let Some(bind) = &args.bind {
        settings.server.bind = bind.clone();
    }
    if args.no_watch {
        settings.file_watch.enabled = false;
    }
    if let Some(dir) = &args.static_dir {
        settings.server.static_dir = Some(dir.clone());
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs, mut settings: Settings) {
    apply_overrides(&args, &mut settings);
    let root = crate::cli::resolve_root(args.root, &settings);

    if let Err(e) = crate::server::serve(&settings, &root).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
