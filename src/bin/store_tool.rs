use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use instancestore::{
    InstanceCommand, InstanceContext, InstanceStore, LoadInstanceCommand, PropertyBag,
    StoreConfig,
};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "store-tool")]
#[command(about = "Inspect an instance store directory")]
struct Cli {
    /// Store directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List instances that have records on disk
    Instances,
    /// Print the Data and Metadata of one instance
    Show { id: Uuid },
    /// Print the timer index, earliest deadline first
    Timers,
    /// Print the instance that would run next
    Expired {
        /// Evaluate at this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.dir.is_dir() {
        return Err(anyhow!("'{}' is not a directory", cli.dir.display()));
    }
    let store = InstanceStore::open(StoreConfig::new(&cli.dir))
        .await
        .with_context(|| format!("Failed to open store at '{}'", cli.dir.display()))?;

    match cli.command {
        Command::Instances => {
            for id in store.list_instances().await? {
                println!("{id}");
            }
        }
        Command::Show { id } => show(&store, id).await?,
        Command::Timers => {
            for (id, at) in store.timers().await? {
                println!("{id}  {}", at.to_rfc3339());
            }
        }
        Command::Expired { at } => {
            let now = match at {
                Some(text) => DateTime::parse_from_rfc3339(&text)
                    .with_context(|| format!("Invalid timestamp '{text}'"))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            match store.find_expired(now).await? {
                Some(id) => println!("{id}"),
                None => println!("no runnable instance"),
            }
        }
    }

    Ok(())
}

async fn show(store: &InstanceStore, id: Uuid) -> Result<()> {
    let mut context = InstanceContext::for_instance(id);
    store
        .execute(
            &mut context,
            InstanceCommand::LoadInstance(LoadInstanceCommand::default()),
            Duration::from_secs(30),
        )
        .await
        .with_context(|| format!("Failed to load instance {id}"))?;

    println!("instance {id}");
    print_bag("data", context.view().data());
    print_bag("metadata", context.view().metadata());
    Ok(())
}

fn print_bag(title: &str, bag: &PropertyBag) {
    println!("{title}:");
    for (name, value) in bag {
        let rendered =
            serde_json::to_string(&value.value).unwrap_or_else(|err| format!("<{err}>"));
        println!("  {name} = {rendered}");
    }
}
