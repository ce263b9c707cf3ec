//! Case-insensitive task search over customer, batch number and style.
use crate::task::Task;

/// Tasks whose customer, batch number or style contains `query`, ignoring
/// case. An empty query returns every task.
pub fn filter(tasks: &[Task], query: &str) -> Vec<Task> {
    if query.is_empty() {
        return tasks.to_vec();
    }
    let needle = query.to_lowercase();
    tasks
        .iter()
        .filter(|task| {
            [&task.customer, &task.batch_no, &task.style]
                .iter()
                .any(|field| !field.is_empty() && field.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}
