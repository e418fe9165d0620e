use std::fs;
use std::path::{Path, PathBuf};

use mpdx_filter::task::TaskRecord;
use tempfile::TempDir;

/// A scratch directory holding a JSONL task file and, optionally, a config.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_tasks(&self, tasks: &[TaskRecord]) -> PathBuf {
        let path = self.dir.path().join("tasks.jsonl");
        let mut contents = String::new();
        for task in tasks {
            contents.push_str(&serde_json::to_string(task).expect("serialize task"));
            contents.push('\n');
        }
        fs::write(&path, contents).expect("write tasks");
        path
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join(".mpdx-filter.toml");
        fs::write(&path, contents.trim()).expect("write config");
        path
    }
}

pub fn task(id: &str, subject: &str) -> TaskRecord {
    TaskRecord::new(id, subject)
}

pub fn tagged(id: &str, subject: &str, tags: &[&str]) -> TaskRecord {
    let mut task = TaskRecord::new(id, subject);
    task.tag_list = tags.iter().map(|tag| tag.to_string()).collect();
    task
}

pub fn due(mut task: TaskRecord, rfc3339: &str) -> TaskRecord {
    task.start_at = Some(rfc3339.parse().expect("timestamp"));
    task
}

/// Ten tasks; even ids are tagged `urgent`, every third is completed.
pub fn sample_tasks() -> Vec<TaskRecord> {
    (0..10)
        .map(|n| {
            let mut task = if n % 2 == 0 {
                tagged(&format!("t{n}"), &format!("Call partner {n}"), &["urgent"])
            } else {
                task(&format!("t{n}"), &format!("Write thank-you {n}"))
            };
            task.completed = n % 3 == 0;
            task
        })
        .collect()
}
