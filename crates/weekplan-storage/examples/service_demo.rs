//! Example: wiring the persistence service to a file store
//!
//! Run with `RUST_LOG=debug cargo run -p weekplan-storage --example service_demo`

use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use weekplan_core::{Day, NewTask, PlannerConfig, TimeBlock};
use weekplan_storage::TodoService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("weekplan-demo"));
    let config = PlannerConfig::load_or_default(&root)?;
    let service = TodoService::open(&root, &config);

    let tags = service.get_tags().await?;
    println!("Tags: {}", tags.iter().map(|t| t.label.as_str()).collect::<Vec<_>>().join(", "));

    let task = service
        .add_task(
            NewTask::new("Buy milk", Day::Tuesday)
                .with_time_block(TimeBlock::Morning)
                .with_estimated_time(15),
        )
        .await?;
    service.toggle_task(&task.id).await?;

    for task in service.get_all_tasks().await? {
        println!(
            "[{}] {:<9} {:<7} {} ({}m)",
            if task.completed { "x" } else { " " },
            task.day,
            task.time_block,
            task.text,
            task.estimated_time
        );
    }

    Ok(())
}
