//! # Buffet Catalog Administration
//!
//! Edits the item catalog and prices orders from the command line.
//!
//! ## Usage
//! ```bash
//! # Add an item with a picture
//! cargo run -p buffet-db --bin buffet -- item add --price 12.50 --img ./khachapuri.png Khachapuri
//!
//! # Reprice by name, drop the description
//! cargo run -p buffet-db --bin buffet -- item mod --price 13 --nodescr Khachapuri
//!
//! # Delete by id and by name
//! cargo run -p buffet-db --bin buffet -- item del 3 Lobiani
//!
//! # List everything (or selected items), optionally as JSON
//! cargo run -p buffet-db --bin buffet -- item show --json
//!
//! # Price an order: two of item 1, one of item 2
//! cargo run -p buffet-db --bin buffet -- order 1=2 2=1
//! ```
//!
//! Settings come from `BUFFET_DB`, `BUFFET_IMG_DIR`, `BUFFET_DELIVERY` and
//! `BUFFET_CURRENCY`; `--db PATH` before the command overrides the database.
//! Log verbosity follows `RUST_LOG` (default `info`).

use buffet_core::{compute_order, quantities_from_pairs, ItemFilter, ItemKey, Patch, Price};
use buffet_db::{
    BuffetConfig, Database, FsAssetStore, ImageUpload, ItemChanges, ItemRepository, NewItem,
};
use std::env;
use std::error::Error;
use tracing_subscriber::EnvFilter;

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

const USAGE: &str = "\
Usage: buffet [--db PATH] COMMAND

Commands:
  item add [--id N] [--descr TEXT] [--img PATH] [--price P] NAME
  item del ITEM...
  item mod [--id N] [--name NAME] [--descr TEXT | --nodescr]
           [--img PATH | --noimg] [--price P] ITEM
  item show [--json] [ITEM...]
  order [--json] ID=QTY...

ITEM is a numeric id or a name; prefix with `name:` for names made of digits.";

#[tokio::main]
async fn main() -> CliResult {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut config = BuffetConfig::from_env()?;

    // Global options stop at the first command word
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                config.database_path = take_value(&args, &mut i)?.into();
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            _ => break,
        }
        i += 1;
    }
    let args = &args[i..];

    let Some(command) = args.first() else {
        return Err(USAGE.into());
    };

    let db = Database::new(config.db_config()).await?;
    let items = db.items(config.asset_store());

    let result = match (command.as_str(), args.get(1).map(String::as_str)) {
        ("item", Some("add")) => cmd_add(&items, &args[2..]).await,
        ("item", Some("del")) => cmd_del(&items, &args[2..]).await,
        ("item", Some("mod")) => cmd_mod(&items, &args[2..]).await,
        ("item", Some("show")) => cmd_show(&items, &args[2..]).await,
        ("item", Some(other)) => Err(format!(
            "unknown item subcommand: {other}\navailable subcommands: add, del, mod, show"
        )
        .into()),
        ("order", _) => cmd_order(&items, &config, &args[1..]).await,
        _ => Err(USAGE.into()),
    };

    db.close().await;
    result
}

// =============================================================================
// item add
// =============================================================================

async fn cmd_add(items: &ItemRepository<FsAssetStore>, args: &[String]) -> CliResult {
    let mut id = None;
    let mut description = None;
    let mut image = None;
    let mut price = Price::zero();
    let mut names = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--id" => id = Some(take_value(args, &mut i)?.parse::<i64>()?),
            "--descr" => description = Some(take_value(args, &mut i)?.to_string()),
            "--img" => image = Some(take_value(args, &mut i)?.to_string()),
            "--price" => price = take_value(args, &mut i)?.parse()?,
            flag if flag.starts_with("--") => return Err(format!("unknown option: {flag}").into()),
            name => names.push(name.to_string()),
        }
        i += 1;
    }

    let [name] = names.as_slice() else {
        return Err("usage: buffet item add [--id N] [--descr TEXT] [--img PATH] [--price P] NAME".into());
    };

    let mut new_item = NewItem::new(name.clone(), price);
    if let Some(id) = id {
        new_item = new_item.id(id);
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        new_item = new_item.description(description);
    }
    if let Some(path) = image {
        items.assets().ensure_dir().await?;
        new_item = new_item.image(ImageUpload::open(&path).await?);
    }

    let item = items.create(new_item).await?;
    println!("{}", item.id);
    Ok(())
}

// =============================================================================
// item del
// =============================================================================

async fn cmd_del(items: &ItemRepository<FsAssetStore>, args: &[String]) -> CliResult {
    let keys = parse_keys(args)?;
    if keys.is_empty() {
        return Err("usage: buffet item del ITEM...".into());
    }

    let deleted = items.delete(&ItemFilter::from_keys(&keys)).await?;
    println!("deleted {} item(s)", deleted);
    Ok(())
}

// =============================================================================
// item mod
// =============================================================================

async fn cmd_mod(items: &ItemRepository<FsAssetStore>, args: &[String]) -> CliResult {
    let mut changes = ItemChanges::new();
    let mut image_path = None;
    let mut drop_image = false;
    let mut targets = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--id" => changes = changes.id(take_value(args, &mut i)?.parse()?),
            "--name" => changes = changes.name(take_value(args, &mut i)?),
            "--price" => changes = changes.price(take_value(args, &mut i)?.parse()?),
            "--descr" => {
                let description = take_value(args, &mut i)?.to_string();
                if !matches!(changes.description, Patch::Clear) {
                    changes = changes.description(Patch::Set(description));
                }
            }
            "--nodescr" => changes = changes.description(Patch::Clear),
            "--img" => image_path = Some(take_value(args, &mut i)?.to_string()),
            "--noimg" => drop_image = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option: {flag}").into()),
            target => targets.push(target.to_string()),
        }
        i += 1;
    }

    let [target] = targets.as_slice() else {
        return Err("usage: buffet item mod [flags ...] ITEM".into());
    };
    let key: ItemKey = target.parse()?;

    if drop_image {
        changes = changes.image(Patch::Clear);
    } else if let Some(path) = image_path {
        items.assets().ensure_dir().await?;
        changes = changes.image(Patch::Set(ImageUpload::open(&path).await?));
    }

    items.update(&key, changes).await?;
    Ok(())
}

// =============================================================================
// item show
// =============================================================================

async fn cmd_show(items: &ItemRepository<FsAssetStore>, args: &[String]) -> CliResult {
    let json = args.iter().any(|a| a == "--json");
    let keys: Vec<String> = args.iter().filter(|a| *a != "--json").cloned().collect();
    let keys = parse_keys(&keys)?;

    let found = items.query(&ItemFilter::from_keys(&keys)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    println!("{:>5} {:>15} {:>8} {:>40} DESCRIPTION", "ID", "NAME", "PRICE", "IMAGE");
    for item in &found {
        println!(
            "{:>5} {:>15} {:>8} {:>40} {}",
            item.id,
            item.name,
            item.price.to_string(),
            item.image.as_deref().unwrap_or("-"),
            item.description.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

// =============================================================================
// order
// =============================================================================

async fn cmd_order(
    items: &ItemRepository<FsAssetStore>,
    config: &BuffetConfig,
    args: &[String],
) -> CliResult {
    let json = args.iter().any(|a| a == "--json");

    let mut pairs = Vec::new();
    for arg in args.iter().filter(|a| *a != "--json") {
        let Some(pair) = arg.split_once('=') else {
            return Err(format!("expected ID=QTY, got {arg}").into());
        };
        pairs.push(pair);
    }

    let quantities = quantities_from_pairs(pairs);
    if quantities.is_empty() {
        return Err("no valid ID=QTY pairs (quantities must be 1-100)".into());
    }

    let found = items
        .query(&ItemFilter::ids(quantities.keys().copied()))
        .await?;
    let order = compute_order(&found, &quantities, config.delivery);

    if json {
        println!("{}", serde_json::to_string_pretty(&order)?);
        return Ok(());
    }

    for line in &order.lines {
        println!(
            "{:>3} x {:<20} {:>10} {:>10}",
            line.quantity,
            line.name,
            line.unit_price.to_string(),
            line.line_total.to_string()
        );
    }
    println!("{:<35} {:>10}", "Delivery", order.delivery.to_string());
    println!(
        "{:<35} {:>10} {}",
        "Total",
        order.total.to_string(),
        config.currency
    );
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Logs go to stderr so command output stays pipeable.
///
/// - `RUST_LOG=debug` - Show every statement the repositories run
/// - Default: INFO level, sqlx quiet
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the value following the option at `i`, advancing `i` past it.
fn take_value<'a>(args: &'a [String], i: &mut usize) -> CliResult<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value").into())
}

fn parse_keys(args: &[String]) -> CliResult<Vec<ItemKey>> {
    let mut keys = Vec::with_capacity(args.len());
    for arg in args {
        keys.push(arg.parse::<ItemKey>()?);
    }
    Ok(keys)
}
