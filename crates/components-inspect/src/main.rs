//! Offline inspector for captured component payloads

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]

use std::{
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context};
use discord_components::{
    component::{normalize_layout, ActionRow, Component, ComponentType, LayoutItem, Wire},
    dispatch::EventKind,
    http::{Request, Transport, TransportError},
    interaction::{self, MessageRef},
    ClientOptions,
};
use serde_json::Value;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;

/// Transport for decoding without a network connection
#[derive(Debug, Clone, Copy)]
struct Offline;

#[async_trait::async_trait]
impl Transport for Offline {
    async fn request(&self, req: Request) -> Result<Option<Value>, TransportError> {
        Err(TransportError::Unsupported {
            method: req.method,
            path: req.route.path(),
        })
    }
}

#[derive(clap::Subcommand)]
enum Subcommand {
    /// Decode a gateway event envelope and show the interacted component
    Decode {
        /// Path to the JSON payload, or stdin if omitted
        file: Option<PathBuf>,
    },
    /// Decode a message's components array and print the normalized rows
    Layout {
        /// Path to the JSON payload, or stdin if omitted
        file: Option<PathBuf>,
    },
}

#[derive(clap::Parser)]
#[command(version, about)]
struct Opts {
    /// Log filter directives
    #[arg(long, env = "RUST_LOG")]
    log_filter: Option<String>,

    #[command(subcommand)]
    subcommand: Subcommand,
}

fn read_json(file: Option<&Path>) -> anyhow::Result<Value> {
    let mut buf = String::new();

    match file {
        Some(p) => {
            buf = std::fs::read_to_string(p).with_context(|| format!("Error reading {p:?}"))?;
        },
        None => {
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Error reading stdin")?;
        },
    }

    serde_json::from_str(&buf).context("Error parsing payload JSON")
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Error serializing output")?
    );
    Ok(())
}

fn decode(file: Option<&Path>) -> anyhow::Result<()> {
    let event = read_json(file)?;
    let Some(int) = interaction::decode(
        &event,
        Arc::new(Offline),
        Arc::new(ClientOptions::default()),
    )
    .context("Error decoding interaction")?
    else {
        warn!("Payload is not a component interaction");
        return Ok(());
    };

    let kind = EventKind::of(int.component_type()).unwrap_or(EventKind::Interaction);
    let message = match int.message() {
        MessageRef::Resolved(m) if m.is_ephemeral() => "resolved (ephemeral)",
        MessageRef::Resolved(_) => "resolved",
        MessageRef::Unresolved(_) => "unresolved",
        MessageRef::Missing => "missing",
    };

    info!(
        %kind,
        custom_id = int.custom_id(),
        user = %int.user_id(),
        name = int.actor().display_name(),
        message,
        "Decoded interaction"
    );

    print_json(&int.component().to_wire())?;

    if int.component_type() == ComponentType::Select {
        let selected: Vec<_> = int
            .selected_options()
            .iter()
            .map(Wire::to_wire)
            .collect();
        debug!(values = ?int.values(), "Selected {} option(s)", selected.len());
        print_json(&selected)?;
    }

    Ok(())
}

fn layout_item(value: Value) -> anyhow::Result<LayoutItem> {
    Ok(match value {
        Value::Array(group) => LayoutItem::Group(
            group
                .into_iter()
                .map(Component::from_wire)
                .collect::<Result<_, _>>()?,
        ),
        v if v.get("type").and_then(Value::as_u64) == Some(1) => {
            LayoutItem::Row(ActionRow::from_wire(v)?)
        },
        v => LayoutItem::Component(Component::from_wire(v)?),
    })
}

fn layout(file: Option<&Path>) -> anyhow::Result<()> {
    let Value::Array(items) = read_json(file)? else {
        bail!("Expected a JSON array of rows or components");
    };

    let items = items
        .into_iter()
        .enumerate()
        .map(|(i, v)| layout_item(v).with_context(|| format!("Invalid layout item {i}")))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let rows = normalize_layout(items).context("Invalid layout")?;

    info!(
        rows = rows.len(),
        components = rows.iter().map(ActionRow::len).sum::<usize>(),
        "Layout is valid"
    );
    print_json(&rows)
}

fn main() {
    [".env.local", ".env.dev", ".env"]
        .into_iter()
        .try_for_each(|p| {
            dotenvy::from_filename(p).map(|_| ()).or_else(|e| match e {
                dotenvy::Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                e => Err(e),
            })
        })
        .expect("Failed to load .env files");

    let Opts {
        log_filter,
        subcommand,
    } = clap::Parser::parse();
    let log_filter = log_filter.as_deref().unwrap_or("info");

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(log_filter).expect("Invalid log filter"))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let res = match subcommand {
        Subcommand::Decode { file } => decode(file.as_deref()),
        Subcommand::Layout { file } => layout(file.as_deref()),
    };

    std::process::exit(match res {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{e:?}");
            1
        },
    });
}

#[cfg(test)]
mod test {
    use discord_components::component::{normalize_layout, LayoutItem};
    use serde_json::json;

    use super::layout_item;

    #[test]
    fn test_layout_items() {
        let button = json!({ "type": 2, "style": 1, "label": "A", "custom_id": "a" });
        let items = [
            json!({ "type": 1, "components": [button.clone()] }),
            button.clone(),
            json!([button.clone(), { "type": 2, "style": 2, "label": "B", "custom_id": "b" }]),
        ]
        .into_iter()
        .map(layout_item)
        .collect::<anyhow::Result<Vec<_>>>()
        .unwrap();

        assert!(matches!(items[0], LayoutItem::Row(_)));
        assert!(matches!(items[1], LayoutItem::Component(_)));
        assert!(matches!(items[2], LayoutItem::Group(ref g) if g.len() == 2));

        let rows = normalize_layout(items).unwrap();
        assert_eq!(rows.iter().map(|r| r.len()).collect::<Vec<_>>(), [1, 1, 2]);
    }

    #[test]
    fn test_layout_item_errors() {
        assert!(layout_item(json!({ "type": 9 })).is_err());
        assert!(layout_item(json!([{ "type": 1, "components": [] }])).is_err());
    }
}
