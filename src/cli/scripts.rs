use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use script_store::ScriptStore;
use serde::Serialize;
use tokio::fs;
use webminer_core_types::{Command, Script, Step};

use crate::cli::context::CliContext;
use crate::cli::output::emit;

#[derive(Args, Clone, Debug)]
pub struct ScriptsArgs {
    #[command(subcommand)]
    pub action: ScriptsAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ScriptsAction {
    /// List saved script names
    List,

    /// Print one saved script
    Show { name: String },

    /// Delete a saved script
    Remove { name: String },

    /// Save a script from a JSON file
    Import {
        file: PathBuf,

        /// Name the script was saved under before; the entry is moved
        #[arg(long, value_name = "ORIGINAL")]
        replace: Option<String>,
    },

    /// Verify that every step of a script can be played
    Check { name: String },
}

#[derive(Debug, Serialize)]
struct StepProblem {
    step: usize,
    problem: &'static str,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    name: String,
    executable: bool,
    problems: Vec<StepProblem>,
}

pub async fn cmd_scripts(args: ScriptsArgs, ctx: &CliContext) -> Result<()> {
    let store = ctx.store();
    match args.action {
        ScriptsAction::List => {
            let names = store.list_names().await?;
            emit(ctx.output(), &names, |names| {
                if names.is_empty() {
                    println!("No saved scripts");
                }
                for name in names {
                    println!("{}", name);
                }
            })
        }
        ScriptsAction::Show { name } => {
            let script = load(&store, &name).await?;
            emit(ctx.output(), &script, print_script)
        }
        ScriptsAction::Remove { name } => {
            if !store.remove(&name).await? {
                bail!("No saved script named '{}'", name);
            }
            emit(ctx.output(), &name, |name| println!("Removed '{}'", name))
        }
        ScriptsAction::Import { file, replace } => {
            let raw = fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let script: Script = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a valid script", file.display()))?;
            let name = script.name.trim().to_string();
            store.save(script, replace.as_deref()).await?;
            emit(ctx.output(), &name, |name| println!("Saved '{}'", name))
        }
        ScriptsAction::Check { name } => {
            let script = load(&store, &name).await?;
            let report = check(&script);
            emit(ctx.output(), &report, |report| {
                if report.executable {
                    println!("'{}' is ready to play", report.name);
                }
                for problem in &report.problems {
                    println!("step {}: {}", problem.step, problem.problem);
                }
            })?;
            if !report.executable {
                bail!("Script '{}' is not executable", name);
            }
            Ok(())
        }
    }
}

pub(crate) async fn load(store: &dyn ScriptStore, name: &str) -> Result<Script> {
    match store.get(name).await? {
        Some(script) => Ok(script),
        None => bail!("No saved script named '{}'", name),
    }
}

fn step_problem(step: &Step) -> Option<&'static str> {
    match (&step.element, &step.command) {
        (None, _) => Some("no element selected"),
        (_, None) => Some("no command"),
        (Some(element), _) if element.is_empty() => Some("element has no selectors"),
        (_, Some(Command::Unknown)) => Some("unknown command"),
        (_, Some(Command::InputText { text })) if text.is_empty() => Some("input text is empty"),
        _ => None,
    }
}

fn check(script: &Script) -> CheckReport {
    let problems: Vec<StepProblem> = script
        .steps
        .iter()
        .enumerate()
        .filter_map(|(index, step)| {
            step_problem(step).map(|problem| StepProblem {
                step: index + 1,
                problem,
            })
        })
        .collect();
    CheckReport {
        name: script.name.clone(),
        executable: script.can_execute() && problems.is_empty(),
        problems,
    }
}

fn print_script(script: &Script) {
    println!("{} ({})", script.name, script.url);
    for (index, step) in script.steps.iter().enumerate() {
        let command = step
            .command
            .as_ref()
            .map(|command| match command {
                Command::InputText { text } => format!("Input Text {:?}", text),
                Command::OpenLink {
                    script_name: Some(chained),
                } => format!("Open Link -> {}", chained),
                other => other.name().to_string(),
            })
            .unwrap_or_else(|| "-".to_string());
        let element = step
            .element
            .as_ref()
            .map(|element| element.describe())
            .unwrap_or_else(|| "-".to_string());
        println!("  {}. {:<24} {}", index + 1, command, element);
    }
}
