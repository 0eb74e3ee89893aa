use std::borrow::Borrow;

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Group name used for tasks with an empty field value.
pub const UNDEFINED_KEY: &str = "undefined";

/// Task field a collection can be partitioned by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Project,
    Department,
    Assignee,
}

impl GroupField {
    /// The task's value for this field, or [`UNDEFINED_KEY`] when empty.
    pub fn key<'a>(&self, task: &'a Task) -> &'a str {
        let value = match self {
            GroupField::Project => task.project.as_str(),
            GroupField::Department => task.department.as_str(),
            GroupField::Assignee => task.assignee.as_str(),
        };
        if value.is_empty() {
            UNDEFINED_KEY
        } else {
            value
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupField::Project => "project",
            GroupField::Department => "department",
            GroupField::Assignee => "assignee",
        }
    }
}

impl std::fmt::Display for GroupField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition tasks by `field`.
///
/// Groups appear in order of first occurrence and each keeps the input order
/// of its tasks. Every input task lands in exactly one group.
pub fn group<T: Borrow<Task>>(tasks: &[T], field: GroupField) -> IndexMap<String, Vec<&Task>> {
    let mut groups: IndexMap<String, Vec<&Task>> = IndexMap::new();
    for task in tasks.iter().map(<T as Borrow<Task>>::borrow) {
        groups
            .entry(field.key(task).to_string())
            .or_default()
            .push(task);
    }
    log::debug!("Grouped {} tasks by {field} into {} groups", tasks.len(), groups.len());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{task, ts};

    fn sample() -> Vec<Task> {
        let mut a = task("T-1", ts(1));
        a.project = "Apollo".into();
        a.department = "Design".into();
        a.assignee = "Diya".into();
        let mut b = task("T-2", ts(2));
        b.project = "Nimbus".into();
        b.department = "Design".into();
        b.assignee = "Kabir".into();
        let mut c = task("T-3", ts(3));
        c.project = "Apollo".into();
        c.department = "QA".into();
        let mut d = task("T-4", ts(4));
        d.project = "Orion".into();
        d.department = "QA".into();
        d.assignee = "Diya".into();
        vec![a, b, c, d]
    }

    #[test]
    fn test_group_preserves_first_seen_order() {
        let tasks = sample();
        let groups = group(&tasks, GroupField::Project);
        let names: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["Apollo", "Nimbus", "Orion"]);

        let apollo: Vec<&str> = groups["Apollo"].iter().map(|t| t.id.as_str()).collect();
        assert_eq!(apollo, vec!["T-1", "T-3"]);
    }

    #[test]
    fn test_group_sizes_sum_to_input() {
        let tasks = sample();
        for field in [GroupField::Project, GroupField::Department, GroupField::Assignee] {
            let groups = group(&tasks, field);
            let total: usize = groups.values().map(Vec::len).sum();
            assert_eq!(total, tasks.len(), "field {field}");
        }
    }

    #[test]
    fn test_group_empty_value_uses_placeholder() {
        let tasks = sample();
        let groups = group(&tasks, GroupField::Assignee);
        assert_eq!(groups[UNDEFINED_KEY].len(), 1);
        assert_eq!(groups[UNDEFINED_KEY][0].id, "T-3");
    }

    #[test]
    fn test_group_accepts_borrowed_tasks() {
        let tasks = sample();
        let refs: Vec<&Task> = tasks.iter().skip(1).collect();
        let groups = group(&refs, GroupField::Department);
        assert_eq!(groups["Design"].len(), 1);
        assert_eq!(groups["QA"].len(), 2);
    }

    #[test]
    fn test_group_empty_input() {
        let tasks: Vec<Task> = Vec::new();
        assert!(group(&tasks, GroupField::Project).is_empty());
    }
}
