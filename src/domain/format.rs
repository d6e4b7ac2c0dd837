//! Plain-text formatting of live state for status and watch output

use chrono::{DateTime, Local, Utc};

use super::definition::{Deployment, ServiceEvent, TaskSet};
use super::task::{LogEvent, Task};

/// Width used when the terminal size is unknown
pub const DEFAULT_WIDTH: usize = 120;

const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Last `/`-separated segment of an identifier
pub fn arn_to_name(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

pub fn format_deployment(d: &Deployment) -> String {
    format!(
        "{:>8} {} desired:{} pending:{} running:{}",
        d.status,
        arn_to_name(&d.task_definition),
        d.desired_count,
        d.pending_count,
        d.running_count
    )
}

pub fn format_task_set(ts: &TaskSet) -> String {
    format!(
        "{:>8} {} desired:{} pending:{} running:{}",
        ts.status,
        arn_to_name(&ts.task_definition),
        ts.computed_desired_count,
        ts.pending_count,
        ts.running_count
    )
}

pub fn format_task(t: &Task) -> String {
    format!(
        "{:>8} {} {} type:{}",
        t.last_status.as_deref().unwrap_or("UNKNOWN"),
        t.id(),
        arn_to_name(&t.task_definition_arn),
        t.launch_type.as_deref().unwrap_or("-")
    )
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIME_FORMAT).to_string()
}

/// Event line split into chunks of at most `width` characters
pub fn format_event(e: &ServiceEvent, width: usize) -> Vec<String> {
    wrap(&format!("{} \t{}", local_time(e.created_at_utc()), e.message), width)
}

/// Log line with `prefix`, split into chunks of at most `width` characters
pub fn format_log_event(e: &LogEvent, prefix: &str, width: usize) -> Vec<String> {
    let at = DateTime::from_timestamp_millis(e.timestamp).unwrap_or_default();
    wrap(&format!("{}{} \t{}", prefix, local_time(at), e.message), width)
}

/// Hard-wrap on character boundaries; `width == 0` disables wrapping
pub fn wrap(line: &str, width: usize) -> Vec<String> {
    if width == 0 || line.chars().count() <= width {
        return vec![line.to_string()];
    }
    let chars: Vec<char> = line.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}
