mod tui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{enable_raw_mode, EnterAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use command_menu::logging;
use command_menu::session::Session;
use command_menu::settings::{self, AppPaths, Settings};
use command_menu::store::FileStore;
use command_menu::tree;

use tui::{App, DeferredAction, Screen};

#[derive(Parser, Debug)]
#[command(name = "command-menu", version, about = "Custom command menus from a JSON file")]
struct Cli {
    /// Commands file to use instead of the one in settings.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the launcher (default).
    Launch,
    /// Open the menu editor.
    Edit,
    /// Print every menu as indented rows.
    Show,
    /// Validate the commands file.
    Check,
    /// Print the resolved commands file path.
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = AppPaths::new()?;
    let settings = Settings::load(&paths.settings_file)?;
    if let Err(err) = logging::init(&paths.log_file) {
        eprintln!("logging disabled: {err:#}");
    }
    let commands_path = settings::resolve_commands_path(cli.config.as_deref(), &settings)?;
    tracing::info!(path = %commands_path.display(), "starting");

    match cli.command.unwrap_or(Commands::Launch) {
        Commands::Path => {
            println!("{}", commands_path.display());
            Ok(())
        }
        Commands::Show => show(&commands_path),
        Commands::Check => check(&commands_path),
        Commands::Launch => run_app(settings, &paths, commands_path, Screen::Launcher),
        Commands::Edit => run_app(settings, &paths, commands_path, Screen::General),
    }
}

fn open_session(commands_path: &Path) -> Result<Session> {
    Session::open(Box::new(FileStore::new(commands_path)))
        .with_context(|| format!("opening {}", commands_path.display()))
}

fn show(commands_path: &Path) -> Result<()> {
    let session = open_session(commands_path)?;
    if let Some(err) = session.load_error() {
        bail!("{} could not be read: {err}", commands_path.display());
    }
    let mut out = io::stdout().lock();
    for (index, menu) in session.menus().iter().enumerate() {
        writeln!(
            out,
            "{} [{} #{}]",
            App::menu_label(menu, index),
            menu.position.as_str(),
            menu.index
        )?;
        for row in tree::flatten(&menu.items, 0) {
            let row = command_menu::Row::from(row);
            let indent = "  ".repeat(row.depth + 1);
            if row.command.is_empty() {
                writeln!(out, "{indent}{}", row.display_title())?;
            } else {
                writeln!(out, "{indent}{}  $ {}", row.display_title(), row.command)?;
            }
        }
    }
    Ok(())
}

fn check(commands_path: &Path) -> Result<()> {
    let session = open_session(commands_path)?;
    if let Some(err) = session.load_error() {
        bail!("{} could not be read: {err}", commands_path.display());
    }
    let mut problems = 0;
    for (index, menu) in session.menus().iter().enumerate() {
        let rows = tree::rows(&menu.items);
        if let Some(gap) = tree::check_depths(&rows) {
            problems += 1;
            println!(
                "{}: row {} is at depth {} but at most {} is allowed",
                App::menu_label(menu, index),
                gap.index + 1,
                gap.depth,
                gap.max_depth
            );
        }
    }
    if problems > 0 {
        bail!("{problems} menu(s) have depth gaps");
    }
    println!(
        "{}: {} menu(s), ok",
        commands_path.display(),
        session.menus().len()
    );
    Ok(())
}

fn run_app(settings: Settings, paths: &AppPaths, commands_path: PathBuf, screen: Screen) -> Result<()> {
    let session = open_session(&commands_path)?;
    let mut app = App::new(
        session,
        settings,
        paths.settings_file.clone(),
        commands_path,
        screen,
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = event_loop(&mut terminal, &mut app);

    tui::restore_terminal(&mut terminal)?;
    result
}

fn event_loop<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    let tick_rate = Duration::from_millis(200);
    loop {
        app.sync_with_session();
        terminal.draw(|frame| tui::render(frame, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if let Some(pending) = app.take_pending_command() {
            match tui::run_command(terminal, &pending) {
                Ok(code) => app.set_status(Some(format!(
                    "{} exited with status {}",
                    pending.title,
                    code.unwrap_or_default()
                ))),
                Err(err) => app.set_status(Some(format!("Command failed: {err}"))),
            }
        }

        if let Some(action) = app.take_pending_action() {
            match action {
                DeferredAction::EditCommandsFile => {
                    let path = app.commands_path().to_path_buf();
                    let result = tui::edit_file(terminal, &path);
                    app.finish_file_edit(result);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
