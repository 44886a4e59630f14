//! Offline digest of an audit log, used by `board-cli audit-summary`.

use std::collections::HashMap;
use std::io::BufRead;

use serde::Serialize;

use crate::audit::AuditRecord;

#[derive(Debug, Default, Serialize)]
pub struct AuditSummary {
    pub total: usize,
    pub malformed: usize,
    pub by_event: Vec<(String, usize)>,
    pub top_ips: Vec<(String, usize)>,
    pub first: Option<String>,
    pub last: Option<String>,
}

/// Read JSON lines and tally them. Unparseable lines are counted, not fatal.
pub fn summarize<R: BufRead>(reader: R, top: usize) -> std::io::Result<AuditSummary> {
    let mut summary = AuditSummary::default();
    let mut events: HashMap<String, usize> = HashMap::new();
    let mut ips: HashMap<String, usize> = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: AuditRecord = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(_) => {
                summary.malformed += 1;
                continue;
            }
        };

        summary.total += 1;
        if summary.first.is_none() {
            summary.first = Some(record.timestamp.clone());
        }
        summary.last = Some(record.timestamp.clone());
        *events.entry(record.event).or_default() += 1;
        *ips.entry(record.ip).or_default() += 1;
    }

    summary.by_event = ranked(events, usize::MAX);
    summary.top_ips = ranked(ips, top);
    Ok(summary)
}

fn ranked(counts: HashMap<String, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<_> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}
