use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use pure_doc::{
    command::{Command, root_children_json},
    editor::Editor,
    outline::{DEFAULT_OUTLINE_WIDTH, render_outline},
};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PURE_DOC_LOG";

const USAGE: &str = "\
Usage:
  pure-doc normalize <file.md>
  pure-doc outline <file.md> [width]
  pure-doc summary <file.md>
  pure-doc apply <file.md> <commands.json> [title]";

fn main() -> Result<()> {
    init_logging();
    run()
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let (Some(subcommand), Some(path_arg)) = (args.next(), args.next()) else {
        eprintln!("{USAGE}");
        return Ok(());
    };
    let path = PathBuf::from(path_arg);

    match subcommand.as_str() {
        "normalize" => {
            let editor = load_editor(&path)?;
            println!("{}", editor.export_markdown());
        }
        "outline" => {
            let width = match args.next() {
                Some(raw) => raw
                    .parse::<usize>()
                    .with_context(|| format!("invalid outline width {raw:?}"))?,
                None => DEFAULT_OUTLINE_WIDTH,
            };
            let editor = load_editor(&path)?;
            let outline = editor.read(|tree, _| render_outline(tree, width));
            println!("{outline}");
        }
        "summary" => {
            let editor = load_editor(&path)?;
            let summary = editor
                .read(|tree, _| root_children_json(tree))
                .context("failed to serialize document summary")?;
            println!("{summary}");
        }
        "apply" => {
            let Some(commands_arg) = args.next() else {
                bail!("apply needs a commands file\n{USAGE}");
            };
            let title = args.next().unwrap_or_default();
            apply_commands(&path, Path::new(&commands_arg), &title)?;
        }
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }
    Ok(())
}

fn load_editor(path: &Path) -> Result<Editor> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Editor::from_markdown(&source)
        .with_context(|| format!("failed to import {}", path.display()))
}

fn apply_commands(path: &Path, commands_path: &Path, title: &str) -> Result<()> {
    let mut editor = load_editor(path)?;
    let raw = fs::read_to_string(commands_path)
        .with_context(|| format!("failed to read {}", commands_path.display()))?;
    let commands: Vec<Command> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse commands in {}", commands_path.display()))?;

    for command in &commands {
        let outcome = editor
            .execute_command(command)
            .context("command aborted the editing session")?;
        let line = serde_json::to_string(&outcome).context("failed to serialize outcome")?;
        println!("{line}");
    }

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let written = editor
        .export_file(dir, title)
        .with_context(|| format!("failed to write result into {}", dir.display()))?;
    eprintln!("wrote {}", written.display());
    Ok(())
}
