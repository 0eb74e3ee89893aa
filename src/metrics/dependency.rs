use std::borrow::Borrow;

use indexmap::IndexMap;

use crate::task::Task;

use super::{borrowed, Blocker};

/// Tasks most depended on, by number of dependents, highest first.
///
/// Ties keep the order in which the blocking id was first referenced. Ids are
/// counted whether or not they exist in the collection.
pub fn top_blockers<T: Borrow<Task>>(tasks: &[T], limit: usize) -> Vec<Blocker> {
    let mut indegree: IndexMap<&str, u64> = IndexMap::new();
    for task in borrowed(tasks) {
        if let Some(id) = task.dependency() {
            *indegree.entry(id).or_default() += 1;
        }
    }

    let mut blockers: Vec<Blocker> = indegree
        .into_iter()
        .map(|(id, dependents)| Blocker {
            id: id.to_string(),
            dependents,
        })
        .collect();
    blockers.sort_by(|a, b| b.dependents.cmp(&a.dependents));
    blockers.truncate(limit);
    blockers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{task, ts};

    fn depends(id: &str, on: &str) -> Task {
        let mut t = task(id, ts(1));
        t.depends_on = Some(on.into());
        t
    }

    #[test]
    fn test_counts_and_order() {
        let tasks = vec![
            depends("1", "T-9"),
            depends("2", "T-4"),
            depends("3", "T-4"),
            depends("4", "T-7"),
            depends("5", ""),
            task("6", ts(1)),
            depends("7", "T-7"),
        ];
        let blockers = top_blockers(&tasks, 5);
        assert_eq!(
            blockers,
            vec![
                Blocker { id: "T-4".into(), dependents: 2 },
                Blocker { id: "T-7".into(), dependents: 2 },
                Blocker { id: "T-9".into(), dependents: 1 },
            ]
        );
    }

    #[test]
    fn test_limit() {
        let tasks: Vec<Task> = (0..8).map(|i| depends(&i.to_string(), &format!("B-{i}"))).collect();
        assert_eq!(top_blockers(&tasks, 5).len(), 5);
        assert!(top_blockers(&tasks, 0).is_empty());
    }
}
