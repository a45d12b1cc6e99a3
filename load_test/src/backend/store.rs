//! Read-only in-memory todo store

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;

use super::model::Todo;

#[derive(Debug, Clone, Default)]
pub struct TodoStore {
    todos: BTreeMap<String, Todo>,
}

impl TodoStore {
    /// One todo per identifier in `ids`, except those listed in `absent`.
    /// Every third seeded todo is marked done.
    pub fn seeded<S: AsRef<str>>(ids: &[S], absent: &[S]) -> Self {
        let absent: HashSet<&str> = absent.iter().map(AsRef::as_ref).collect();
        let now = Utc::now();

        let todos = ids
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| !absent.contains(id))
            .enumerate()
            .map(|(n, id)| {
                let done = n % 3 == 2;
                let todo = Todo {
                    id: id.to_string(),
                    title: format!("Todo {}", n + 1),
                    description: "Seeded for load testing".to_string(),
                    done,
                    created_at: now,
                    done_at: done.then_some(now),
                };
                (todo.id.clone(), todo)
            })
            .collect();

        Self { todos }
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.get(id)
    }

    /// All todos ordered by id
    pub fn list(&self) -> Vec<Todo> {
        self.todos.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_skips_absent_ids() {
        let ids = ["b", "a", "c"];
        let store = TodoStore::seeded(&ids, &["c"]);

        assert_eq!(store.len(), 2);
        assert!(store.get("c").is_none());
        assert_eq!(store.get("a").map(|t| t.id.as_str()), Some("a"));

        let listed: Vec<String> = store.list().into_iter().map(|t| t.id).collect();
        assert_eq!(listed, vec!["a", "b"]);
    }

    #[test]
    fn test_done_todos_have_done_at() {
        let store = TodoStore::seeded(&["a", "b", "c"], &[]);
        for todo in store.list() {
            assert_eq!(todo.done, todo.done_at.is_some());
        }
        assert!(store.get("c").is_some_and(|t| t.done));
    }
}
