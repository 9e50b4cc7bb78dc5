use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::Terminal;

use command_menu::launcher;

use super::app::PendingCommand;

pub fn restore_terminal<B>(terminal: &mut Terminal<B>) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Hands the terminal back to the shell while `f` runs.
fn with_terminal_suspension<B, F, T>(terminal: &mut Terminal<B>, f: F) -> Result<T>
where
    B: ratatui::backend::Backend + Write,
    F: FnOnce() -> Result<T>,
{
    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    let result = f();
    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    result
}

pub fn run_command<B>(terminal: &mut Terminal<B>, pending: &PendingCommand) -> Result<Option<i32>>
where
    B: ratatui::backend::Backend + Write,
{
    with_terminal_suspension(terminal, || {
        tracing::info!(title = %pending.title, command = %pending.command, "running command");
        let status = launcher::shell_command(&pending.command).status();
        let exit_code = match status {
            Ok(status) => {
                println!(
                    "\n{} exited with code {:?}. Press Enter to return...",
                    pending.title,
                    status.code()
                );
                let _ = io::stdin().read_line(&mut String::new());
                status.code()
            }
            Err(err) => {
                tracing::warn!(command = %pending.command, error = %err, "command failed to start");
                println!("Failed to run command: {err}");
                println!("Press Enter to continue...");
                let _ = io::stdin().read_line(&mut String::new());
                None
            }
        };
        Ok(exit_code)
    })
}

/// Opens `path` in `$VISUAL` or `$EDITOR`, falling back to `vi`.
pub fn edit_file<B>(terminal: &mut Terminal<B>, path: &Path) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    let editor = env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string());
    with_terminal_suspension(terminal, || {
        tracing::info!(%editor, path = %path.display(), "editing commands file");
        let status = Command::new(&editor)
            .arg(path)
            .status()
            .with_context(|| format!("starting {editor}"))?;
        if !status.success() {
            anyhow::bail!("{editor} exited with {status}");
        }
        Ok(())
    })
}
