use serde::Serialize;

use crate::models::Task;

/// Live title filter for the list view. Case-insensitive substring match; an
/// empty or whitespace-only query yields the full set.
pub fn filter_tasks(tasks: &[Task], query: &str) -> Vec<Task> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return tasks.to_vec();
    }
    tasks
        .iter()
        .filter(|task| task.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchOverlay {
    pub open: bool,
    pub query: String,
}

impl SearchOverlay {
    // Reopening always starts from a blank filter.
    pub fn open(&mut self) {
        self.open = true;
        self.query.clear();
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
    }

    /// Query edits are only meaningful while the overlay is shown.
    pub fn set_query(&mut self, query: String) {
        if self.open {
            self.query = query;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: &str, title: &str) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            details: String::new(),
            completed: false,
            created_at: 1,
            user_id: "u1".to_string(),
        }
    }

    #[test]
    fn empty_query_returns_all_tasks() {
        let tasks = vec![make_task("a", "Buy milk"), make_task("b", "Call mom")];
        assert_eq!(filter_tasks(&tasks, "").len(), 2);
        assert_eq!(filter_tasks(&tasks, "   ").len(), 2);
    }

    #[test]
    fn filter_matches_substrings_case_insensitively() {
        let tasks = vec![
            make_task("a", "Buy milk"),
            make_task("b", "Call mom"),
            make_task("c", "buy stamps"),
        ];
        let hits = filter_tasks(&tasks, "BUY");
        assert_eq!(
            hits.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        // Interior match, query whitespace trimmed.
        let hits = filter_tasks(&tasks, "  mo ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[test]
    fn filter_with_no_hits_is_empty() {
        let tasks = vec![make_task("a", "Buy milk")];
        assert!(filter_tasks(&tasks, "xyz").is_empty());
    }

    #[test]
    fn overlay_open_resets_query() {
        let mut overlay = SearchOverlay::default();
        overlay.open();
        overlay.set_query("milk".to_string());
        assert_eq!(overlay.query, "milk");

        overlay.close();
        assert!(!overlay.open);
        assert!(overlay.query.is_empty());

        overlay.open();
        overlay.set_query("eggs".to_string());
        overlay.open();
        assert!(overlay.query.is_empty());
    }

    #[test]
    fn query_edits_ignored_while_closed() {
        let mut overlay = SearchOverlay::default();
        overlay.set_query("milk".to_string());
        assert!(overlay.query.is_empty());
    }
}
