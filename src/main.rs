use std::{env, fs, io, path::PathBuf};

use anyhow::{Context, Result, bail};
use content_model_core::{
    delete::{
        DeleteResult, DeleteSelectionStep, backward_delete_collapsed_selection, delete_selection,
        forward_delete_collapsed_selection,
    },
    editor::{adjust_selection_for_copy_cut, preprocess_table, retain_selected_content},
    model::{ContentModelDocument, normalize_content_model, table_mut},
    options::EditorOptions,
    selection::{IterateSelectionsOption, collect_selections},
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "Usage: content-model <delete|copy|normalize> <model.json> [--options <file>] [--key <Backspace|Delete>]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Delete,
    Copy,
    Normalize,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    model_path: PathBuf,
    options_path: Option<PathBuf>,
    key: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    run()
}

fn run() -> Result<()> {
    let Some(args) = parse_args(env::args().skip(1))? else {
        eprintln!("{USAGE}");
        return Ok(());
    };

    let options = match &args.options_path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            EditorOptions::from_json(&json)
                .with_context(|| format!("invalid options in {}", path.display()))?
        }
        None => EditorOptions::default(),
    };
    let mut model = load_model(&args.model_path)?;
    if model.format.is_none() {
        model.format = options.default_segment_format.clone();
    }

    let output = match args.command {
        Command::Delete => {
            let result = delete(&mut model, args.key.as_deref())?;
            json!({ "deleteResult": result, "model": model })
        }
        Command::Copy => {
            copy(&mut model);
            json!({ "model": model })
        }
        Command::Normalize => {
            normalize_content_model(&mut model);
            json!({ "model": model })
        }
    };
    let rendered = serde_json::to_string_pretty(&output).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let Some(command) = args.next() else {
        return Ok(None);
    };
    let command = match command.as_str() {
        "delete" => Command::Delete,
        "copy" => Command::Copy,
        "normalize" => Command::Normalize,
        "-h" | "--help" => return Ok(None),
        other => bail!("unknown command '{other}'"),
    };

    let mut model_path = None;
    let mut options_path = None;
    let mut key = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--options" => {
                let path = args.next().context("--options needs a file")?;
                options_path = Some(PathBuf::from(path));
            }
            "--key" => key = Some(args.next().context("--key needs a key name")?),
            _ if model_path.is_none() => model_path = Some(PathBuf::from(arg)),
            other => bail!("unexpected argument '{other}'"),
        }
    }
    let model_path = model_path.context("missing model file")?;

    Ok(Some(Args {
        command,
        model_path,
        options_path,
        key,
    }))
}

fn load_model(path: &PathBuf) -> Result<ContentModelDocument> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a content model document", path.display()))
}

fn delete(model: &mut ContentModelDocument, key: Option<&str>) -> Result<DeleteResult> {
    let steps: Vec<DeleteSelectionStep> = match key {
        None => Vec::new(),
        Some("Backspace") => vec![backward_delete_collapsed_selection],
        Some("Delete") => vec![forward_delete_collapsed_selection],
        Some(other) => bail!("unsupported key '{other}'"),
    };
    let result = delete_selection(model, &steps, None).delete_result;
    if matches!(result, DeleteResult::SingleChar | DeleteResult::Range) {
        normalize_content_model(model);
    }
    tracing::info!(?result, "deleted selection");
    Ok(result)
}

/// What the clipboard would receive for the model's selection.
fn copy(model: &mut ContentModelDocument) {
    let table = collect_selections(model, IterateSelectionsOption::default())
        .into_iter()
        .find_map(|record| record.table_context.map(|context| context.table));
    match table {
        Some(address) => {
            if let Some(table) = table_mut(model, &address) {
                preprocess_table(table);
            }
        }
        None => adjust_selection_for_copy_cut(model),
    }
    retain_selected_content(model);
}
