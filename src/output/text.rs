use chrono::{DateTime, Local, Utc};

use crate::models::{Statistics, Task, TaskStatus};

const RULE_WIDTH: usize = 72;
const TITLE_WIDTH: usize = 32;

fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "○",
        TaskStatus::Completed => "✓",
    }
}

fn local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn truncate(title: &str) -> String {
    if title.chars().count() <= TITLE_WIDTH {
        return title.to_string();
    }
    let cut: String = title.chars().take(TITLE_WIDTH - 3).collect();
    format!("{cut}...")
}

pub fn print_task(t: &Task) {
    println!(
        "[{}] {} {} ({}, {})",
        t.id,
        status_icon(t.status),
        t.title,
        t.category.as_str(),
        t.priority
    );
}

pub fn print_task_detail(t: &Task) {
    println!("{}", "─".repeat(RULE_WIDTH));
    println!("ID:        {}", t.id);
    println!("Title:     {}", t.title);
    println!("Status:    {} {}", status_icon(t.status), t.status.as_str());
    println!("Category:  {}", t.category.as_str());
    println!("Priority:  {} ({})", t.priority, t.priority.level());
    println!("Created:   {}", local(&t.created_at));
    println!("Updated:   {}", local(&t.updated_at));
    if let Some(ref completed) = t.completed_at {
        println!("Completed: {}", local(completed));
    }
    if let Some(desc) = t.description.as_deref().filter(|d| !d.is_empty()) {
        println!("\n{desc}");
    }
    println!("{}", "─".repeat(RULE_WIDTH));
}

pub fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    println!("{}", "═".repeat(RULE_WIDTH));
    println!(
        "{:<6} {:<2} {:<w$} {:<6} {:<5} {}",
        "ID",
        "",
        "TITLE",
        "CAT",
        "PRI",
        "CREATED",
        w = TITLE_WIDTH
    );
    println!("{}", "─".repeat(RULE_WIDTH));
    for t in tasks {
        println!(
            "{:<6} {:<2} {:<w$} {:<6} {:<5} {}",
            t.id,
            status_icon(t.status),
            truncate(&t.title),
            t.category.as_str(),
            "!".repeat(t.priority.level() as usize),
            local(&t.created_at),
            w = TITLE_WIDTH
        );
    }
    println!("{}", "═".repeat(RULE_WIDTH));
    println!("{} task(s)", tasks.len());
}

pub fn print_statistics(s: &Statistics) {
    println!("Total: {}  Completed: {}  Pending: {}", s.total, s.completed, s.pending);
    println!("Completion: {:.1}%", s.completion_rate);
    if !s.by_category.is_empty() {
        println!("\nBy category:");
        for (category, count) in &s.by_category {
            println!("  {:<8} {count}", category.as_str());
        }
    }
    if !s.by_priority.is_empty() {
        println!("\nPending by priority:");
        for (priority, count) in s.by_priority.iter().rev() {
            println!("  {:<8} {count}", priority.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_titles_are_truncated_on_char_boundaries() {
        let title = "准备项目演示".repeat(10);
        let cut = truncate(&title);
        assert_eq!(cut.chars().count(), TITLE_WIDTH);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short"), "short");
    }
}
