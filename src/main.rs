// src/main.rs
//
// Diagnostic runner: loads one dashboard list page against the configured
// backend and prints its first page as JSON.

use std::env;

use anyhow::Context;

use educhub::application::{Dashboard, Educator, PageViewDto};
use educhub::config::DashboardConfig;
use educhub::domain::ResourceKind;

fn print_usage() {
    println!("educhub {}, dashboard list diagnostics.", env!("CARGO_PKG_VERSION"));
    print!(
        r#"
Usage: educhub <KIND> [SEARCH]

Kinds: tests, questions, test-series, courses, students, videos,
       study-materials, webinars

Configuration is read from <config dir>/educhub/config.json and
EDUCHUB_* environment variables. Set RUST_LOG=debug for details.

"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut argv = env::args();
    argv.next(); // skip executable name

    let kind = match argv.next().as_deref() {
        None | Some("--help") => {
            print_usage();
            return Ok(());
        }
        Some("--version") => {
            println!("educhub {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(other) => other
            .parse::<ResourceKind>()
            .map_err(|e| anyhow::anyhow!("{e}"))?,
    };
    let search: Option<String> = argv.next();

    env_logger::init();

    let config = DashboardConfig::load().context("loading configuration")?;
    log::debug!("Using backend {}", config.api_base_url);

    let dashboard = Dashboard::from_config(config).context("building dashboard")?;
    dashboard.init(Educator::new("diagnostics").with_name("educhub CLI"));

    let controller = dashboard.controller_for(kind)?;
    controller
        .refresh()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("loading {}", kind.label()))?;

    if let Some(text) = search {
        controller.search_now(text).await?;
    }

    let view = PageViewDto::from(controller.page_view());
    println!("{}", serde_json::to_string_pretty(&view)?);

    dashboard.teardown();
    Ok(())
}
