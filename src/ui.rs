// UI module: the prompt/progress capability tasks call into, and terminal output helpers
//
// Stage bodies block on prompts, so every implementation answers synchronously.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use console::{Term, style};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Spinner style similar to uv/pnpm
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// What tasks need from whoever is driving them.
///
/// `None` from a prompt means the user backed out; tasks turn that into cancellation.
pub trait Ui: Send + Sync {
    fn confirm(&self, title: &str, message: &str) -> bool;
    fn choose_one(&self, title: &str, message: &str, options: &[String]) -> Option<String>;
    fn prompt_string(&self, title: &str, message: &str) -> Option<String>;
    fn report_progress(&self, stage_label: &str, percent: u8);
    fn report_message(&self, level: MessageLevel, text: &str);
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Check if stderr is a TTY (for interactive output)
fn is_tty() -> bool {
    Term::stderr().is_term()
}

/// Whether prompts can be answered by a person.
pub fn is_interactive() -> bool {
    is_tty() && Term::stdout().is_term()
}

/// Interactive terminal front-end: prompts on stderr, one progress bar per run.
pub struct TerminalUi {
    assume_yes: bool,
    bar: Mutex<Option<ProgressBar>>,
    last_label: Mutex<String>,
}

impl TerminalUi {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            bar: Mutex::new(None),
            last_label: Mutex::new(String::new()),
        }
    }

    fn read_line(&self, prompt: &str) -> Option<String> {
        let term = Term::stderr();
        term.write_str(prompt).ok()?;
        let line = term.read_line().ok()?;
        let line = line.trim().to_string();
        (!line.is_empty()).then_some(line)
    }

    /// Run `f` with the bar hidden so plain lines do not tear it.
    fn suspended(&self, f: impl FnOnce()) {
        match lock(&self.bar).as_ref() {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    fn finish_bar(&self) {
        if let Some(bar) = lock(&self.bar).take() {
            bar.finish_and_clear();
        }
        lock(&self.last_label).clear();
    }
}

impl Ui for TerminalUi {
    fn confirm(&self, title: &str, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        if !is_tty() {
            return false;
        }
        let mut answer = None;
        self.suspended(|| {
            eprintln!("{} {}", style(title).bold(), message);
            answer = self.read_line(&format!("{} ", style("[y/N]").dim()));
        });
        matches!(answer.as_deref(), Some("y" | "Y" | "yes" | "Yes"))
    }

    fn choose_one(&self, title: &str, message: &str, options: &[String]) -> Option<String> {
        if options.is_empty() || !is_tty() {
            return None;
        }
        let mut answer = None;
        self.suspended(|| {
            eprintln!("{} {}", style(title).bold(), message);
            for (i, option) in options.iter().enumerate() {
                eprintln!("  {} {}", style(format!("{:>3})", i + 1)).cyan(), option);
            }
            answer = self.read_line("Number or id (empty to cancel): ");
        });
        let answer = answer?;
        if let Ok(n) = answer.parse::<usize>() {
            if (1..=options.len()).contains(&n) {
                return Some(options[n - 1].clone());
            }
        }
        options.iter().find(|o| **o == answer).cloned()
    }

    fn prompt_string(&self, title: &str, message: &str) -> Option<String> {
        if !is_tty() {
            return None;
        }
        let mut answer = None;
        self.suspended(|| {
            eprintln!("{} {}", style(title).bold(), message);
            answer = self.read_line("> ");
        });
        answer
    }

    fn report_progress(&self, stage_label: &str, percent: u8) {
        let mut slot = lock(&self.bar);
        let bar = slot.get_or_insert_with(progress_bar);
        bar.set_position(u64::from(percent.min(100)));

        let mut last = lock(&self.last_label);
        if *last != stage_label {
            bar.set_message(stage_label.to_string());
            if !is_tty() {
                eprintln!("{} {}", style("→").cyan(), stage_label);
            }
            *last = stage_label.to_string();
        }
        drop(last);
        drop(slot);

        if percent >= 100 {
            self.finish_bar();
        }
    }

    fn report_message(&self, level: MessageLevel, text: &str) {
        self.suspended(|| match level {
            MessageLevel::Info => success(text),
            MessageLevel::Warning => warning(text),
            MessageLevel::Error => error(text),
        });
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        self.finish_bar();
    }
}

/// Headless front-end with pre-seeded answers.
///
/// Exhausted confirmations answer `default_confirm`; exhausted choices and
/// strings answer `None`, so a prompt loop always ends in cancellation.
/// Progress events and messages are recorded, and echoed to the terminal
/// when `echo` is set (batch mode).
#[derive(Default)]
pub struct ScriptedUi {
    confirms: Mutex<VecDeque<bool>>,
    choices: Mutex<VecDeque<Option<String>>>,
    #[allow(dead_code)]
    strings: Mutex<VecDeque<Option<String>>>,
    default_confirm: bool,
    echo: bool,
    prompts: Mutex<Vec<String>>,
    progress: Mutex<Vec<(String, u8)>>,
    messages: Mutex<Vec<(MessageLevel, String)>>,
}

impl ScriptedUi {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-interactive driver for the CLI: confirmations answer `assume_yes`,
    /// choices cancel, and everything reported is printed.
    pub fn batch(assume_yes: bool) -> Self {
        Self {
            default_confirm: assume_yes,
            echo: true,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn with_confirm(self, answer: bool) -> Self {
        lock(&self.confirms).push_back(answer);
        self
    }

    pub fn with_choice(self, answer: Option<&str>) -> Self {
        lock(&self.choices).push_back(answer.map(String::from));
        self
    }

    #[cfg(test)]
    pub fn with_string(self, answer: Option<&str>) -> Self {
        lock(&self.strings).push_back(answer.map(String::from));
        self
    }

    /// Titles of every prompt asked, in order.
    #[cfg(test)]
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    #[cfg(test)]
    pub fn progress(&self) -> Vec<(String, u8)> {
        lock(&self.progress).clone()
    }

    #[cfg(test)]
    pub fn messages(&self) -> Vec<(MessageLevel, String)> {
        lock(&self.messages).clone()
    }
}

impl Ui for ScriptedUi {
    fn confirm(&self, title: &str, _message: &str) -> bool {
        lock(&self.prompts).push(title.to_string());
        lock(&self.confirms).pop_front().unwrap_or(self.default_confirm)
    }

    fn choose_one(&self, title: &str, _message: &str, options: &[String]) -> Option<String> {
        lock(&self.prompts).push(title.to_string());
        let answer = lock(&self.choices).pop_front().flatten()?;
        // Answers outside the offered options pass through; callers re-validate.
        options
            .iter()
            .find(|o| **o == answer)
            .cloned()
            .or(Some(answer))
    }

    fn prompt_string(&self, title: &str, _message: &str) -> Option<String> {
        lock(&self.prompts).push(title.to_string());
        lock(&self.strings).pop_front().flatten()
    }

    fn report_progress(&self, stage_label: &str, percent: u8) {
        let mut progress = lock(&self.progress);
        if self.echo && progress.last().map(|(l, _)| l.as_str()) != Some(stage_label) {
            action(stage_label);
        }
        progress.push((stage_label.to_string(), percent));
    }

    fn report_message(&self, level: MessageLevel, text: &str) {
        if self.echo {
            match level {
                MessageLevel::Info => success(text),
                MessageLevel::Warning => warning(text),
                MessageLevel::Error => error(text),
            }
        }
        lock(&self.messages).push((level, text.to_string()));
    }
}

/// Create a styled spinner for async operations
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if !is_tty() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars(SPINNER_CHARS)
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());

    if is_tty() {
        pb.enable_steady_tick(Duration::from_millis(80));
    }

    pb
}

/// Percentage bar for a task run
fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    if !is_tty() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.cyan} {msg} [{bar:25.cyan/dim}] {pos:>3}%")
    {
        pb.set_style(style.tick_chars(SPINNER_CHARS).progress_chars("━━╺"));
    }
    pb
}

/// Clear a spinner; the caller prints the outcome.
pub fn clear_spinner(pb: &ProgressBar) {
    pb.finish_and_clear();
}

/// Print a success message with checkmark
pub fn success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Print an info/action message with arrow
pub fn action(message: &str) {
    println!("{} {}", style("→").cyan(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red(), message);
}

/// Print a header/section message
pub fn header(message: &str) {
    println!("{}", style(message).bold());
}

/// Print a dimmed/secondary message
pub fn dim(message: &str) {
    println!("{}", style(message).dim());
}

/// Print a labelled line
pub fn status(prefix: &str, message: &str) {
    println!("{} {}", style(prefix).cyan().bold(), message);
}
