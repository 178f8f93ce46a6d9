//! Reorder queue commands, backed by a shared bucket object.

use anyhow::Result;
use chrono::Local;

use crate::bucket::{self, create_bucket};
use crate::config::Config;

/// One queue entry. The line format is what the published queue file has
/// always used, so consumers parsing it keep working.
fn reorder_line(timestamp: &str, part_number: &str, description: &str, requester: &str) -> String {
    format!(
        "Date and Time: {}, Part Number: {}, Description: {}, Requester Name: {}",
        timestamp, part_number, description, requester
    )
}

pub async fn run_reorder_add(
    config: &Config,
    part_number: &str,
    description: &str,
    requester: &str,
) -> Result<()> {
    let bucket = create_bucket(&config.bucket)?;
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let line = reorder_line(&timestamp, part_number, description, requester);

    bucket::append_line(bucket.as_ref(), &config.bucket.reorder_object, &line).await?;

    println!("reorder add");
    println!("  object: {}", config.bucket.reorder_object);
    println!("  line: {}", line);
    println!("ok");
    Ok(())
}

pub async fn run_reorder_list(config: &Config) -> Result<()> {
    let bucket = create_bucket(&config.bucket)?;
    match bucket.get(&config.bucket.reorder_object).await? {
        Some(content) if !content.trim().is_empty() => {
            for line in content.lines() {
                println!("{}", line);
            }
        }
        _ => println!("No reorder requests."),
    }
    Ok(())
}
