//! Interactive terminal UI
//!
//! The orchestrator runs in its own task and receives upload/verify
//! commands; the draw loop mirrors its state from the events it emits.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tokio::sync::{mpsc, oneshot};
use voice_judge::{ClientConfig, Command, Orchestrator};

use crate::app::{App, InputMode};
use crate::commands::{connect_wallet, fetch_descriptor};
use crate::ui;

const FRAME_INTERVAL: Duration = Duration::from_millis(100);

pub async fn run(config: &ClientConfig, file: Option<PathBuf>) -> Result<()> {
    let mut terminal = ratatui::try_init()?;

    let result = run_app(&mut terminal, config, file).await;

    ratatui::try_restore()?;

    result
}

async fn run_app(
    terminal: &mut ratatui::DefaultTerminal,
    config: &ClientConfig,
    file: Option<PathBuf>,
) -> Result<()> {
    let mut app = App::new(config.model_name.clone(), config.backend_url.clone());
    if let Some(path) = file {
        app.select_path(&path).await;
    }

    let mut wallet = connect_wallet(config).await;
    let mut accounts = wallet.watch();
    app.set_accounts(accounts.borrow_and_update().clone());

    // descriptor is read once per session
    let (descriptor_tx, mut descriptor_rx) = oneshot::channel();
    let descriptor_config = config.clone();
    tokio::spawn(async move {
        let descriptor = fetch_descriptor(&descriptor_config).await;
        let _ = descriptor_tx.send(descriptor);
    });

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::from_config(config, wallet.watch())?.with_events(event_tx);
    let worker = tokio::spawn(orchestrator.run(command_rx));

    loop {
        while let Ok(event) = event_rx.try_recv() {
            app.apply_event(&event);
        }
        if accounts.has_changed().unwrap_or(false) {
            app.set_accounts(accounts.borrow_and_update().clone());
        }
        if let Ok(descriptor) = descriptor_rx.try_recv() {
            app.set_descriptor(descriptor);
        }

        terminal.draw(|f| ui::draw(f, &app))?;

        if event::poll(FRAME_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match app.input_mode {
                        InputMode::EditingPath => match key.code {
                            KeyCode::Enter => app.confirm_path().await,
                            KeyCode::Esc => app.cancel_editing(),
                            KeyCode::Backspace => app.pop_char(),
                            KeyCode::Char(c) => app.push_char(c),
                            _ => {}
                        },
                        InputMode::Normal => match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => {
                                app.should_quit = true;
                            }
                            KeyCode::Char('f') => app.start_editing(),
                            KeyCode::Char('u') => {
                                if let Some(command) = app.submit_command() {
                                    send(&command_tx, command);
                                }
                            }
                            KeyCode::Char('v') => {
                                if let Some(command) = app.verify_command() {
                                    send(&command_tx, command);
                                }
                            }
                            _ => {}
                        },
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    wallet.unmount();
    // pending requests are abandoned on exit
    worker.abort();

    Ok(())
}

fn send(commands: &mpsc::UnboundedSender<Command>, command: Command) {
    if commands.send(command).is_err() {
        tracing::warn!("Orchestrator stopped; command dropped");
    }
}
