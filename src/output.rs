use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::model::{ActiveTimer, Task, TaskStatistics, Timer, User};

#[derive(Serialize)]
pub struct TaskDetail<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub overdue: bool,
    pub statistics: &'a TaskStatistics,
}

/// `3725` → `1h 02m 05s`, `65` → `1m 05s`, `9` → `9s`
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

fn format_time(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn format_timer(timer: &Timer) -> String {
    let mut out = String::new();
    out.push_str(&format!("Timer:       {}\n", timer.id));
    out.push_str(&format!("Task:        {}\n", timer.task));
    out.push_str(&format!("User:        {}\n", timer.user_id));
    out.push_str(&format!("Started:     {}\n", format_time(&timer.start_time)));
    match (&timer.end_time, timer.duration) {
        (Some(end), Some(d)) => {
            out.push_str(&format!("Stopped:     {}\n", format_time(end)));
            out.push_str(&format!("Duration:    {} ({d}s)\n", format_duration(d)));
        }
        _ => out.push_str("Stopped:     (running)\n"),
    }
    if timer.flagged {
        out.push_str("Flagged:     stop time preceded start time; duration clamped to 0\n");
    }
    out
}

pub fn format_active(active: &ActiveTimer) -> String {
    format!(
        "* {} on '{}' running for {} (since {})\n",
        active.timer.id,
        active.timer.task,
        format_duration(active.elapsed),
        format_time(&active.timer.start_time)
    )
}

pub fn format_timer_list(timers: &[Timer]) -> String {
    let mut out = String::new();
    for timer in timers {
        let (icon, span) = match timer.duration {
            Some(d) => (".", format_duration(d)),
            None => ("*", "running".to_string()),
        };
        let flag = if timer.flagged { " !" } else { "" };
        out.push_str(&format!(
            "{icon} {}  {}  {}  {}  {span}{flag}\n",
            timer.id,
            timer.task,
            timer.user_id,
            format_time(&timer.start_time)
        ));
    }
    out
}

pub fn format_stats(stats: &TaskStatistics) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total:       {}\n", format_duration(stats.total_time_spent)));
    out.push_str(&format!("Today:       {}\n", format_duration(stats.time_spent_today)));
    out.push_str(&format!("This week:   {}\n", format_duration(stats.time_spent_this_week)));
    out.push_str(&format!("Sessions:    {}\n", stats.timer_count));
    match stats.last_worked_on {
        Some(ref t) => out.push_str(&format!("Last worked: {}\n", format_time(t))),
        None => out.push_str("Last worked: never\n"),
    }
    out
}

pub fn format_task_detail(task: &Task, stats: &TaskStatistics, today: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str(&format!("Key:         {}\n", task.key));
    out.push_str(&format!("Title:       {}\n", task.title));
    out.push_str(&format!("Status:      {}\n", task.status));
    out.push_str(&format!("Priority:    {}\n", task.priority));
    if let Some(ref p) = task.project {
        out.push_str(&format!("Project:     {}\n", p));
    }
    if !task.description.is_empty() {
        out.push_str(&format!("Description: {}\n", task.description));
    }
    out.push_str(&format!("Assignee:    {}\n", task.assignee));
    out.push_str(&format!("Creator:     {}\n", task.creator));
    if let Some(due) = task.due_date {
        let overdue = if task.is_overdue(today) { " (overdue)" } else { "" };
        out.push_str(&format!("Due:         {due}{overdue}\n"));
    }
    out.push_str(&format!("Created:     {}\n", task.created_at));
    out.push_str(&format!("Updated:     {}\n", task.updated_at));
    out.push('\n');
    out.push_str(&format_stats(stats));
    out
}

pub fn format_task_list(tasks: &[Task], today: NaiveDate) -> String {
    let mut out = String::new();
    for task in tasks {
        let project = task
            .project
            .as_ref()
            .map(|p| format!(" [{p}]"))
            .unwrap_or_default();
        let overdue = if task.is_overdue(today) { " (overdue)" } else { "" };
        out.push_str(&format!(
            "{} {}{}  {}  @{}{}\n",
            task.status.icon(),
            task.key,
            project,
            task.title,
            task.assignee,
            overdue
        ));
    }
    out
}

pub fn format_users(users: &[User]) -> String {
    let mut out = String::new();
    for user in users {
        let name = if user.name.is_empty() {
            String::new()
        } else {
            format!("  {}", user.name)
        };
        out.push_str(&format!("{}  {}{}\n", user.id, user.role, name));
    }
    out
}
