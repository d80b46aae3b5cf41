use anyhow::Context as _;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::cli::{MarkArgs, StateImportArgs};
use crate::formats::StateSnapshot;
use crate::store::KeyValueStore;

pub fn mark(args: MarkArgs, store: &dyn KeyValueStore) -> anyhow::Result<()> {
    if !args.owned && !args.read {
        anyhow::bail!("nothing to mark: pass --owned and/or --read");
    }

    let mut catalog = Catalog::load(store).context("load catalog")?;
    if !catalog.contains(&args.id) {
        anyhow::bail!("unknown book id: {}", args.id);
    }

    let on = !args.unset;
    if args.owned {
        catalog
            .set_owned(store, &args.id, on)
            .context("save owned flags")?;
    }
    if args.read {
        catalog
            .set_read(store, &args.id, on)
            .context("save read flags")?;
    }
    tracing::info!(id = %args.id, owned = args.owned, read = args.read, on, "marked book");
    Ok(())
}

/// Replaces owned/read flags. Non-array `owned`/`read` members count as
/// empty lists.
pub fn import(args: StateImportArgs, store: &dyn KeyValueStore) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read input: {}", args.input))?;
    let snapshot = snapshot_from_json(&text)?;

    let mut catalog = Catalog::load(store).context("load catalog")?;
    tracing::info!(
        owned = snapshot.owned.len(),
        read = snapshot.read.len(),
        "import state"
    );
    catalog.replace_state(store, snapshot).context("save state")
}

pub fn clear(store: &dyn KeyValueStore) -> anyhow::Result<()> {
    let mut catalog = Catalog::load(store).context("load catalog")?;
    catalog.clear_state(store).context("clear state")?;
    tracing::info!("cleared owned/read state");
    Ok(())
}

fn snapshot_from_json(text: &str) -> anyhow::Result<StateSnapshot> {
    let parsed: Value = serde_json::from_str(text).context("parse state json")?;
    let ids = |key: &str| -> Vec<String> {
        match parsed.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(id) => Some(id.clone()),
                    Value::Number(id) => Some(id.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    };
    Ok(StateSnapshot {
        owned: ids("owned"),
        read: ids("read"),
    })
}
