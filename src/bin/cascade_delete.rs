

use std::sync::Arc;

use anyhow::{bail, Context};
use cascade_delete::{CascadeInterceptor, CascadeSettings, InMemoryStore, InterceptDecision};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};


const USAGE: &str =
    "usage: cascade-delete <settings file | -> <entities.json> <request path> [method]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("cascade_delete=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        bail!(USAGE);
    }
    let method = args.get(3).map(String::as_str).unwrap_or("DELETE");

    let settings = match args[0].as_str() {
        "-" => CascadeSettings::from_env(),
        path => CascadeSettings::load(path).context("Failed to load cascade settings")?,
    };
    let store = InMemoryStore::load(&args[1])
        .with_context(|| format!("Failed to load entity fixture {}", args[1]))?;

    let interceptor = CascadeInterceptor::from_settings(&settings, Arc::new(store.clone()))?;
    let decision = interceptor.intercept(method, &args[2]).await;

    if let InterceptDecision::Proceed { report, .. } = &decision {
        info!("{} entities deleted, {} remain", report.deleted.len(), store.len());
    }
    println!("{}", serde_json::to_string_pretty(&decision)?);

    if matches!(decision, InterceptDecision::Reject { .. }) {
        std::process::exit(1);
    }
    Ok(())
}
