use std::env;
use std::path::Path;
use std::sync::{Arc, mpsc};

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::RodioEngine;
use crate::config;
use crate::library::{Catalog, CatalogError, LibraryStore, default_store_path, scan};
use crate::mpris::ControlCmd;

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;

/// Entry point of the `segue` binary.
///
/// `segue import <dir>` imports and exits; `segue [dir]` imports `dir` (when
/// given) and opens the TUI.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, fallback) = settings::load_settings();
    let log_path = logging::configure_logging(&settings.log);
    if let Some(reason) = fallback {
        warn!("{reason}");
    }
    info!(log = ?log_path, "segue starting");

    let store_path = settings
        .library
        .store_path
        .clone()
        .or_else(default_store_path)
        .ok_or("cannot locate the library file; set library.store_path")?;
    let store = Arc::new(LibraryStore::open(&store_path)?);

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("import") => {
            let dir = args.next().ok_or("usage: segue import <dir>")?;
            let added = import_dir(&store, Path::new(&dir), &settings)?;
            println!("segue: imported {added} new tracks from {dir}");
            return Ok(());
        }
        Some(dir) => {
            import_dir(&store, Path::new(dir), &settings)?;
        }
        None => {}
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("segue-sync")
        .enable_time()
        .build()?;

    let mut listing = store.watch_tracks();
    let mut app = App::new(listing.borrow_and_update().clone());

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let services = event_loop::Services {
        settings: &settings,
        runtime: &runtime,
        engine: RodioEngine,
        store,
        mpris: &mpris,
        control_rx: &control_rx,
    };
    let run_result = event_loop::run(&mut terminal, &services, &mut app, &mut listing);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("segue exiting");
    run_result
}

fn import_dir(
    store: &LibraryStore,
    dir: &Path,
    settings: &config::Settings,
) -> Result<usize, CatalogError> {
    let found = scan(dir, &settings.library);
    let added = store.import(found)?;
    store.save()?;
    info!(dir = %dir.display(), added = added.len(), "imported directory");
    Ok(added.len())
}
