use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::task::Task;

/// Read tasks from a JSON file, or from stdin when `path` is `-`.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let tasks = if path.as_os_str() == "-" {
        read_tasks(std::io::stdin().lock())?
    } else {
        read_tasks(std::fs::File::open(path)?)?
    };
    log::info!("Loaded {} tasks from {}", tasks.len(), path.display());
    Ok(tasks)
}

/// Parse a JSON array of tasks.
///
/// Duplicate ids are reported but kept; every metric treats tasks
/// independently.
pub fn read_tasks(reader: impl Read) -> Result<Vec<Task>> {
    let tasks: Vec<Task> = serde_json::from_reader(reader)?;

    let mut seen = HashSet::new();
    for task in &tasks {
        if !seen.insert(task.id.as_str()) {
            log::warn!("Duplicate task id: {}", task.id);
        }
    }
    let inverted = tasks.iter().filter(|t| t.has_inverted_timestamps()).count();
    if inverted > 0 {
        log::warn!("{inverted} tasks have out-of-order timestamps; their durations count as zero");
    }
    Ok(tasks)
}
