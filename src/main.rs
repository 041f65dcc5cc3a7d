#![allow(clippy::collapsible_if)]

use std::{fs::OpenOptions, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Target};
use yaml_splice::{EditOperation, Editor, Value};

/// Edit YAML files in place without disturbing their formatting or comments.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Output {
    /// Write the result back to the file instead of printing it
    #[arg(long, short = 'i')]
    in_place: bool,

    /// Print a unified diff of the change
    #[arg(long)]
    diff: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove a key and its value, or a sequence element
    Delete {
        file: String,
        path: String,
        #[command(flatten)]
        output: Output,
    },

    /// Replace the value at PATH. VALUE is read as YAML, so `4` is a number
    Update {
        file: String,
        path: String,
        value: String,
        #[command(flatten)]
        output: Output,
    },

    /// Rename the key of the mapping entry at PATH
    Rename {
        file: String,
        path: String,
        new_name: String,
        #[command(flatten)]
        output: Output,
    },

    /// Add KEY: VALUE to the mapping at PATH
    MapAdd {
        file: String,
        path: String,
        key: String,
        value: String,
        #[command(flatten)]
        output: Output,
    },

    /// Add VALUE to the sequence at PATH
    SeqAdd {
        file: String,
        path: String,
        value: String,
        /// Insert before this element instead of appending
        #[arg(long)]
        index: Option<usize>,
        #[command(flatten)]
        output: Output,
    },

    /// Apply a JSON array of edit operations, in order
    Apply {
        file: String,
        script: String,
        #[command(flatten)]
        output: Output,
    },

    /// Print the value at PATH
    Get { file: String, path: String },

    /// Print the JSON schema of edit scripts
    Schema,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(&*shellexpand::tilde(path))
}

fn parse_value(text: &str) -> Result<Value> {
    serde_yaml::from_str(text).with_context(|| format!("{text:?} is not a YAML value"))
}

fn read_script(script: &str) -> Result<Vec<EditOperation>> {
    let path = expand(script);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("reading edit script {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing edit script {}", path.display()))
}

fn open(file: &str) -> Result<(PathBuf, Editor)> {
    let path = expand(file);
    let editor =
        yaml_splice::load_file(&path).with_context(|| format!("loading {}", path.display()))?;
    Ok((path, editor))
}

fn edit(file: &str, operations: Vec<EditOperation>, output: &Output) -> Result<()> {
    let (path, mut editor) = open(file)?;
    for operation in operations {
        editor.enqueue(operation);
    }
    let rendered = editor
        .render()
        .with_context(|| format!("editing {}", path.display()))?;

    if output.diff {
        print!("{}", editor.diff());
    }

    if output.in_place {
        if editor.is_modified() {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
    } else if !output.diff {
        print!("{rendered}");
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let mut builder = Builder::from_default_env();
    if let Ok(log_location) = std::env::var("LOG_LOCATION") {
        let path = expand(&log_location);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        builder.target(Target::Pipe(Box::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    match Cli::parse().command {
        Command::Delete { file, path, output } => {
            edit(&file, vec![EditOperation::Delete { path }], &output)
        }
        Command::Update {
            file,
            path,
            value,
            output,
        } => {
            let value = parse_value(&value)?;
            edit(&file, vec![EditOperation::Update { path, value }], &output)
        }
        Command::Rename {
            file,
            path,
            new_name,
            output,
        } => edit(
            &file,
            vec![EditOperation::Rename { path, to: new_name }],
            &output,
        ),
        Command::MapAdd {
            file,
            path,
            key,
            value,
            output,
        } => {
            let value = parse_value(&value)?;
            edit(&file, vec![EditOperation::MapAdd { path, key, value }], &output)
        }
        Command::SeqAdd {
            file,
            path,
            value,
            index,
            output,
        } => {
            let value = parse_value(&value)?;
            edit(
                &file,
                vec![EditOperation::SeqAdd { path, value, index }],
                &output,
            )
        }
        Command::Apply {
            file,
            script,
            output,
        } => edit(&file, read_script(&script)?, &output),
        Command::Get { file, path } => {
            let (_, editor) = open(&file)?;
            let value = editor.value(&path)?;
            print!("{}", serde_yaml::to_string(&value)?);
            Ok(())
        }
        Command::Schema => {
            let schema = schemars::schema_for!(Vec<EditOperation>);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}
