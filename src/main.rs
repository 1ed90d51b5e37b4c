use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::time::Duration;

use agentdeck::app::{App, PendingAction};
use agentdeck::discovery::Discovery;
use agentdeck::event::{Event, EventHandler};
use agentdeck::panel;
use agentdeck::sessionlog::{self, DeclaredSession};
use agentdeck::tmux::{Multiplexer, TmuxMultiplexer};
use agentdeck::ui;

const EVENT_TICK_RATE: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(name = "agentdeck", version, about = "Terminal dashboard for background coding agents")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List discovered agent sessions
    Ls,
    /// Declare a new agent session in the session log
    Log {
        /// Agent type (claude, codex, gemini)
        agent: String,
        /// Command the agent runs
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Attach to a declared session
    Attach {
        /// Session id (agent-...)
        session_id: String,
    },
    /// Kill a declared session
    Kill {
        /// Session id (agent-...)
        session_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Ls) => cmd_ls().await,
        Some(Commands::Log { agent, command }) => cmd_log(&agent, &command),
        Some(Commands::Attach { session_id }) => cmd_attach(&session_id).await,
        Some(Commands::Kill { session_id }) => cmd_kill(&session_id).await,
        None => run_tui().await,
    }
}

async fn cmd_ls() -> Result<()> {
    let mux = TmuxMultiplexer::new();
    let mut discovery = Discovery::new();
    let sessions = discovery.discover(&mux, true).await;
    if sessions.is_empty() {
        println!("No agent sessions found.");
    } else {
        for s in &sessions {
            let pid = s.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
            println!(
                "{} [{}] {} pid={} {}",
                s.session_id,
                s.agent_type,
                s.status_label(),
                pid,
                s.command
            );
        }
    }
    Ok(())
}

fn cmd_log(agent: &str, command: &[String]) -> Result<()> {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let session_id = format!("agent-{}-{}", agent, &suffix[..8]);
    let record = DeclaredSession {
        timestamp: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        session_id: session_id.clone(),
        command: command.join(" "),
    };
    let path = sessionlog::resolve_log_path();
    sessionlog::append_session(&path, &record)?;
    println!("Declared session: {session_id}");
    Ok(())
}

async fn cmd_attach(session_id: &str) -> Result<()> {
    let mux = TmuxMultiplexer::new();
    if panel::attach_session(&mux, session_id).await {
        Ok(())
    } else {
        anyhow::bail!("could not attach to '{session_id}'")
    }
}

async fn cmd_kill(session_id: &str) -> Result<()> {
    let mux = TmuxMultiplexer::new();
    mux.kill_session(session_id).await?;
    println!("Killed session: {session_id}");
    Ok(())
}

async fn run_tui() -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let result = event_loop(&mut terminal).await;

    // Restore terminal even when the loop errored.
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    let mux: Box<dyn Multiplexer> = Box::new(TmuxMultiplexer::new());
    let mut app = App::new(Discovery::new());
    app.refresh(mux.as_ref()).await;
    let mut events = EventHandler::new(EVENT_TICK_RATE);

    // Draw initial frame before entering event loop
    terminal.draw(|frame| ui::draw(frame, &mut app))?;

    loop {
        if app.should_quit {
            break;
        }

        match events.next().await {
            Some(Event::Key(key)) => {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
            Some(Event::Mouse(mouse)) => app.handle_mouse(mouse),
            Some(Event::Tick) => app.on_tick(mux.as_ref()).await,
            Some(Event::Resize) => app.panel.redraw = true,
            None => break,
        }

        if let Some(action) = app.pending.take() {
            run_action(terminal, &mut app, mux.as_ref(), action).await?;
        }

        if app.panel.redraw {
            terminal.draw(|frame| ui::draw(frame, &mut app))?;
        }
    }

    Ok(())
}

/// Kill runs in place; attach-style actions hand the terminal to tmux and
/// take it back afterwards. Either way the session list is re-probed.
async fn run_action(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mux: &dyn Multiplexer,
    action: PendingAction,
) -> Result<()> {
    match action {
        PendingAction::Kill => {
            let ok = app.panel.kill_selected(mux).await;
            app.status_message = Some(if ok {
                "Session killed".to_string()
            } else {
                "Kill failed".to_string()
            });
        }
        PendingAction::Activate | PendingAction::Resume => {
            suspend_terminal(terminal)?;
            let ok = match action {
                PendingAction::Activate => app.panel.activate_selected(mux).await,
                _ => app.panel.resume_selected(mux).await,
            };
            restore_terminal(terminal)?;
            if !ok {
                app.status_message = Some("Could not attach session".to_string());
            }
        }
    }
    app.refresh(mux).await;
    app.panel.redraw = true;
    Ok(())
}

fn suspend_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    enable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        EnterAlternateScreen,
        EnableMouseCapture
    )?;
    terminal.clear()?;
    Ok(())
}
