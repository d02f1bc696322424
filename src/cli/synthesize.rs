use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use element_picker::{step_element, Facet, FacetKey, Fingerprint, SelectionSet};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::cli::context::CliContext;
use crate::cli::output::emit;

#[derive(Args, Clone, Debug)]
pub struct SynthesizeArgs {
    /// Fingerprint JSON captured by the picker
    #[arg(long, value_name = "FILE")]
    pub fingerprint: PathBuf,

    /// Facet to toggle on, in click order (e.g. `id`, `path`, `text`, `tag`,
    /// `class:btn`, `attr:data-test`, `href`)
    #[arg(long = "facet", value_name = "FACET")]
    pub facets: Vec<String>,

    /// List the fingerprint's facets instead of synthesizing
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Serialize)]
struct FacetLine {
    facet: String,
    value: String,
    exclusive: bool,
}

pub async fn cmd_synthesize(args: SynthesizeArgs, ctx: &CliContext) -> Result<()> {
    let raw = fs::read_to_string(&args.fingerprint)
        .await
        .with_context(|| format!("Failed to read {}", args.fingerprint.display()))?;
    let fingerprint: Fingerprint = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid fingerprint", args.fingerprint.display()))?;

    if args.list {
        let lines: Vec<FacetLine> = fingerprint
            .facets()
            .into_iter()
            .map(|facet| FacetLine {
                exclusive: facet.key.is_exclusive(),
                facet: facet.key.to_string(),
                value: facet.value,
            })
            .collect();
        return emit(ctx.output(), &lines, |lines| {
            for line in lines {
                let marker = if line.exclusive { "*" } else { " " };
                println!("{} {:<24} {}", marker, line.facet, line.value);
            }
        });
    }

    let selection = select(&fingerprint, &args.facets)?;
    debug!(?selection, "Selection built");
    let Some(element) = step_element(&fingerprint, &selection) else {
        bail!("Selection is empty; pass at least one --facet");
    };

    emit(ctx.output(), &element, |element| {
        for descriptor in &element.selectors {
            println!("{}", descriptor);
        }
    })
}

/// Toggle each named facet in order, taking values from the fingerprint.
fn select(fingerprint: &Fingerprint, names: &[String]) -> Result<SelectionSet> {
    let facets = names
        .iter()
        .map(|name| {
            let key: FacetKey = name.parse()?;
            fingerprint
                .facet(&key)
                .ok_or_else(|| anyhow!("Fingerprint has no value for facet '{}'", key))
        })
        .collect::<Result<Vec<Facet>>>()?;
    Ok(SelectionSet::from_facets(&facets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button() -> Fingerprint {
        Fingerprint {
            tag_name: "button".into(),
            id: Some("save".into()),
            class_names: vec!["btn".into(), "primary".into()],
            text_content: Some("Save".into()),
            ..Fingerprint::default()
        }
    }

    #[test]
    fn test_select_follows_toggle_rules() {
        let selection = select(&button(), &["id".into(), "class:btn".into()]).unwrap();
        assert!(selection.id.is_none());
        assert_eq!(selection.class_names, vec!["btn".to_string()]);
    }

    #[test]
    fn test_select_rejects_missing_facets() {
        let err = select(&button(), &["href".into()]).unwrap_err();
        assert!(err.to_string().contains("href"));
        assert!(select(&button(), &["bogus".into()]).is_err());
    }
}
