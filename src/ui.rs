use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

#[macro_export]
macro_rules! warning {
    // format string literal (with or without inline formatting)
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).yellow());
    }};
    // arbitrary expression (non-literal)
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).yellow());
    }};
}

#[macro_export]
macro_rules! error {
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).red());
    }};
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).red());
    }};
}

#[macro_export]
macro_rules! status {
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!($fmt $(, $($arg)*)?).green());
    }};
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!("{}", $expr).green());
    }};
}

#[macro_export]
macro_rules! info {
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), $fmt $(, $($arg)*)?);
    }};
    ($expr:expr) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", $expr);
    }};
}

/// true when both stdin and stdout are attached to a terminal
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// run `work` while a spinner ticks on stderr (hidden when stderr isn't a terminal)
pub fn with_spinner<T>(work: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("reading working tree status");
    spinner.enable_steady_tick(Duration::from_millis(
        crate::constants::SPINNER_TICK_MILLIS,
    ));

    let result = work();

    spinner.finish_and_clear();
    result
}

/// single-key prompt like "[y]es/[n]o ? "; enter selects the first option
///
/// returns the lowercased first character of the chosen option
pub fn prompt(options: &[&str]) -> Result<char> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
        terminal::{disable_raw_mode, enable_raw_mode},
    };
    use std::io::{self, Write};

    debug_assert!(!options.is_empty(), "prompt requires at least one option");

    let mut labels = Vec::with_capacity(options.len());
    let mut keys = Vec::with_capacity(options.len());
    for option in options {
        let mut chars = option.chars();
        let Some(first) = chars.next() else {
            bail!("prompt options cannot be empty");
        };
        labels.push(format!("[{first}]{}", chars.as_str()));
        keys.push(first.to_ascii_lowercase());
    }

    print!("{} ? ", labels.join("/"));
    let _ = io::stdout().flush();

    enable_raw_mode().context("this command requires an interactive terminal")?;

    loop {
        let Ok(Event::Key(KeyEvent {
            code, modifiers, ..
        })) = event::read()
        else {
            continue;
        };

        let chosen = match code {
            KeyCode::Esc => None,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => None,
            KeyCode::Enter => Some(0),
            KeyCode::Char(c) => match keys.iter().position(|&k| k == c.to_ascii_lowercase()) {
                Some(idx) => Some(idx),
                None => continue,
            },
            _ => continue,
        };

        disable_raw_mode().ok();
        return match chosen {
            Some(idx) => {
                info!(options[idx]);
                Ok(keys[idx])
            }
            None => {
                info!("^C");
                bail!("aborted");
            }
        };
    }
}

/// read one line of text, pre-filled with `line`
pub fn edit_one_line(line: &str) -> Result<String> {
    use rustyline::DefaultEditor;

    let mut editor = DefaultEditor::new().context("failed to initialise line editor")?;

    match editor.readline_with_initial("? ", (line, "")) {
        Ok(edited) => Ok(edited.trim().to_string()),
        Err(_) => {
            info!("^C");
            bail!("aborted");
        }
    }
}

/// open `text` in $EDITOR and return what the user saved
pub fn edit_multi_line(text: &str) -> Result<String> {
    use std::env;
    use std::fs;
    use std::io::Write;
    use std::process::Command;
    use tempfile::Builder;

    let editor = env::var("EDITOR").context("EDITOR not set")?;

    let mut temp_file = Builder::new()
        .prefix("COMMIT_EDITMSG")
        .suffix(".txt")
        .tempfile()
        .context("failed to create temporary file")?;
    temp_file
        .write_all(text.as_bytes())
        .context("failed to write to temporary file")?;
    temp_file
        .flush()
        .context("failed to flush temporary file")?;

    let temp_path = temp_file.path().to_owned();
    let quoted = shlex::try_quote(&temp_path.to_string_lossy())
        .ok()
        .context("failed to quote temporary file path")?
        .into_owned();

    // run via the shell so arguments inside EDITOR are honoured
    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("{editor} {quoted}"))
        .status()
        .with_context(|| format!("failed to run editor: {editor}"))?;
    if !status.success() {
        bail!("editor exited with {status}");
    }

    fs::read_to_string(&temp_path).context("failed to read edited message")
}
