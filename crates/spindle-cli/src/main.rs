//! `spindle`: terminal host and tooling for Spindle stories.
//!
//! `play` runs a story in the terminal, `check` compiles and reports, and
//! `dump` prints the compiled program for debugging story scripts.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spindle_core::{Host, Selection, Vm, VmState};
use spindle_twee::compile;

/// Default text panel width when `--width` is not given.
const DEFAULT_WIDTH: usize = 30;

#[derive(Parser)]
#[command(name = "spindle", about = "Twee story engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a story in the terminal.
    Play {
        /// Path to the .twee source file.
        story: PathBuf,
        /// Text panel width in characters.
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: usize,
        /// Seed the random number generator for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Compile a story and report what it contains.
    Check {
        /// Path to the .twee source file.
        story: PathBuf,
    },
    /// Print the compiled program.
    Dump {
        /// Path to the .twee source file.
        story: PathBuf,
        /// Emit JSON instead of the readable listing.
        #[arg(long)]
        json: bool,
    },
}

/// Read a source file, stripping a UTF-8 byte-order mark if present.
fn read_source(path: &Path) -> Result<String> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read story: {}", path.display()))?;
    Ok(source.strip_prefix('\u{feff}').unwrap_or(&source).to_string())
}

// ---------------------------------------------------------------------------
// Terminal host
// ---------------------------------------------------------------------------

/// Renders the callback surface onto stdout/stderr. Text and selections go
/// to stdout; image and music cues are bracketed notices on stderr so piped
/// output stays clean.
#[derive(Default)]
struct TerminalHost;

impl Host for TerminalHost {
    fn set_text(&mut self, text: &str) {
        println!();
        println!("{text}");
    }

    fn set_image(&mut self, name: &str) {
        if name.is_empty() {
            eprintln!("[image] hidden");
        } else {
            eprintln!("[image] {name}");
        }
    }

    fn set_music(&mut self, name: &str, track: i32) {
        if name.is_empty() {
            eprintln!("[music] stopped");
        } else {
            eprintln!("[music] {name} (track {track})");
        }
    }

    fn set_selections(&mut self, selections: &[Selection]) {
        if selections.is_empty() {
            return;
        }
        println!();
        for (i, selection) in selections.iter().enumerate() {
            println!("  {}) {}", i + 1, selection.text);
        }
    }

    fn fatal_error(&mut self, message: &str) {
        eprintln!("[error] {message}");
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_play(path: &Path, width: usize, seed: Option<u64>) -> Result<()> {
    let source = read_source(path)?;
    let story = compile(&source)?;

    let mut vm = match seed {
        Some(seed) => Vm::with_seed(story, width, seed),
        None => Vm::new(story, width),
    };
    let mut host = TerminalHost::default();
    vm.run(&mut host);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        match vm.state() {
            VmState::ScreenPause => {
                print!("\n[more] ");
                io::stdout().flush()?;
                if lines.next().transpose()?.is_none() {
                    break;
                }
                vm.player_input(0, &mut host);
            }
            VmState::WaitingForSelection => {
                print!("> ");
                io::stdout().flush()?;
                let Some(line) = lines.next().transpose()? else {
                    break;
                };
                // 1-based on screen, 0-based in the VM. Bad input leaves
                // the VM waiting and we prompt again.
                if let Ok(choice) = line.trim().parse::<usize>() {
                    if choice > 0 {
                        vm.player_input(choice - 1, &mut host);
                    }
                }
            }
            VmState::Running | VmState::Stopped => break,
        }
    }
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let source = read_source(path)?;
    let story = compile(&source)?;
    let commands: usize = story.passages().map(|p| p.commands.len()).sum();
    println!(
        "{}: {} passage(s), {} command(s)",
        path.display(),
        story.len(),
        commands
    );
    Ok(())
}

fn cmd_dump(path: &Path, json: bool) -> Result<()> {
    let source = read_source(path)?;
    let story = compile(&source)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&story)?);
    } else {
        print!("{story}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Play { story, width, seed } => cmd_play(story, *width, *seed),
        Command::Check { story } => cmd_check(story),
        Command::Dump { story, json } => cmd_dump(story, *json),
    }
}
