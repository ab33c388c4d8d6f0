//! Laulud TUI entry point.

use crossterm::{
    event::{Event as CrosstermEvent, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use laulud_client::LauludClient;
use laulud_tui::config::TuiConfig;
use laulud_tui::error::TuiError;
use laulud_tui::events::TuiEvent;
use laulud_tui::keys::map_key;
use laulud_tui::nav::Route;
use laulud_tui::persistence::{self, PersistedState, PersistenceError};
use laulud_tui::state::{App, Effect};
use laulud_tui::views::render_view;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    let _log_guard = laulud_tui::logging::init(&config.log_path)?;
    info!(transport = %config.transport, "Starting Laulud");

    let client = LauludClient::from_config(&config.client_config(), config.cache_config())?;
    let route = restore_route(&config);
    let mut app = App::new(config, client, route);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(64);
    spawn_auth_check(&app, event_tx.clone());

    let mut input = EventStream::new();
    let mut revisions = app.client.cache().subscribe_revisions();
    let mut settled = app.search.subscribe_settled();
    let mut mutation_status = app.subscribe_mutation_status();
    let mut ticker = tokio::time::interval(app.config.refresh_interval());

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => {
                let evicted = app.client.cache().collect_garbage();
                if evicted > 0 {
                    info!(evicted, "Collected unobserved cache entries");
                }
            }
            Ok(()) = revisions.changed() => {
                app.on_revision();
            }
            Ok(()) = settled.changed() => {
                app.on_search_settled();
            }
            Ok(()) = mutation_status.changed() => {
                debug!(saving = app.is_saving(), "Mutation status changed");
            }
            Some(event) = input.next() => {
                match event? {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        if handle_event(&mut app, TuiEvent::Input(key), &event_tx) {
                            break;
                        }
                    }
                    CrosstermEvent::Resize(width, height) => {
                        handle_event(&mut app, TuiEvent::Resize { width, height }, &event_tx);
                    }
                    _ => {}
                }
            }
            Some(event) = event_rx.recv() => {
                handle_event(&mut app, event, &event_tx);
            }
        }

        if let Some(err) = app.fatal.take() {
            if let Err(save_err) = save_route(&app) {
                warn!(error = %save_err, "Failed to persist state");
            }
            return Err(TuiError::Fatal(err));
        }
    }

    save_route(&app)?;
    info!("Exiting");
    Ok(())
}

fn restore_route(config: &TuiConfig) -> Route {
    match persistence::load(&config.persistence_path) {
        Ok(Some(state)) => state.route.parse().unwrap_or_else(|err| {
            warn!(error = %err, "Ignoring persisted route");
            Route::Home
        }),
        Ok(None) => Route::Home,
        Err(err) => {
            warn!(error = %err, "Failed to load persisted state");
            Route::Home
        }
    }
}

fn save_route(app: &App) -> Result<(), PersistenceError> {
    let state = PersistedState {
        route: app.persisted_route(),
    };
    persistence::save(&app.config.persistence_path, &state)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_auth_check(app: &App, sender: mpsc::Sender<TuiEvent>) {
    let client = app.client.clone();
    tokio::spawn(async move {
        let status = client.auth_check().await;
        let _ = sender.send(TuiEvent::AuthChecked(status)).await;
    });
}

/// Returns true when the application should exit.
fn handle_event(app: &mut App, event: TuiEvent, sender: &mpsc::Sender<TuiEvent>) -> bool {
    match event {
        TuiEvent::Input(key) => {
            if let Some(action) = map_key(key, app.input_mode()) {
                let effect = app.handle_action(action);
                return run_effect(app, effect, sender);
            }
        }
        TuiEvent::AuthChecked(status) => app.set_auth(status),
        TuiEvent::MutationFinished { kind, result } => app.on_mutation_finished(kind, result),
        TuiEvent::LoggedOut(result) => app.on_logged_out(result),
        TuiEvent::Resize { .. } => {}
    }
    false
}

fn run_effect(app: &mut App, effect: Effect, sender: &mpsc::Sender<TuiEvent>) -> bool {
    match effect {
        Effect::None => {}
        Effect::Quit => return true,
        Effect::CheckAuth => spawn_auth_check(app, sender.clone()),
        Effect::Logout => {
            let client = app.client.clone();
            let sender = sender.clone();
            tokio::spawn(async move {
                let result = client.logout().await;
                let _ = sender.send(TuiEvent::LoggedOut(result)).await;
            });
        }
        Effect::Mutate(mutation) => {
            let tags = app.client.tags().clone();
            let sender = sender.clone();
            let kind = mutation.kind;
            tokio::spawn(async move {
                let result = mutation.run(&tags).await;
                let _ = sender.send(TuiEvent::MutationFinished { kind, result }).await;
            });
        }
    }
    false
}
