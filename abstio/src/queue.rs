use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "init")]
    Init,
    #[serde(rename = "requested")]
    Requested,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "error")]
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let x = match self {
            Status::Init => "init",
            Status::Requested => "requested",
            Status::InProgress => "in progress",
            Status::Ready => "ready",
            Status::Error => "error",
        };
        write!(f, "{}", x)
    }
}

/// One city or intersection to process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: usize,
    /// A city name, or street names joined by " -x- "
    pub name: String,
    pub status: Status,
    pub file_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

/// Hands out rows to workers. A claim moves a row to `InProgress` with a fresh timestamp, so at
/// most one worker holds a row unless the claim goes stale.
#[derive(Serialize, Deserialize)]
pub struct WorkQueue {
    rows: BTreeMap<usize, Row>,
    /// Rows stuck in progress longer than this are handed out again
    stale_after_seconds: i64,
}

impl WorkQueue {
    pub fn new(stale_after: Duration) -> WorkQueue {
        WorkQueue {
            rows: BTreeMap::new(),
            stale_after_seconds: stale_after.num_seconds(),
        }
    }

    pub fn add(&mut self, name: &str, now: DateTime<Utc>) -> usize {
        let id = self.rows.keys().next_back().map(|x| x + 1).unwrap_or(1);
        self.rows.insert(
            id,
            Row {
                id,
                name: name.to_string(),
                status: Status::Init,
                file_name: None,
                timestamp: now,
                error: None,
            },
        );
        id
    }

    pub fn get(&self, id: usize) -> Option<&Row> {
        self.rows.get(&id)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Moves a row from one status to another, only if it's currently in `from`.
    pub fn compare_and_set(
        &mut self,
        id: usize,
        from: Status,
        to: Status,
        now: DateTime<Utc>,
    ) -> bool {
        match self.rows.get_mut(&id) {
            Some(row) if row.status == from => {
                row.status = to;
                row.timestamp = now;
                true
            }
            _ => false,
        }
    }

    pub fn request(&mut self, id: usize, now: DateTime<Utc>) -> bool {
        self.compare_and_set(id, Status::Init, Status::Requested, now)
            || self.compare_and_set(id, Status::Ready, Status::Requested, now)
            || self.compare_and_set(id, Status::Error, Status::Requested, now)
    }

    /// Picks the next row to work on and marks it in progress. Explicit requests and stale claims
    /// win, newest first. Otherwise the oldest row that isn't in progress or failed.
    pub fn claim(&mut self, now: DateTime<Utc>) -> Option<usize> {
        let stale_before = now - Duration::seconds(self.stale_after_seconds);
        let urgent = self
            .rows
            .values()
            .filter(|r| {
                r.status == Status::Requested
                    || (r.status == Status::InProgress && r.timestamp < stale_before)
            })
            .max_by_key(|r| (r.timestamp, r.id))
            .map(|r| r.id);
        let id = urgent.or_else(|| {
            self.rows
                .values()
                .filter(|r| r.status != Status::InProgress && r.status != Status::Error)
                .min_by_key(|r| (r.status.to_string(), r.timestamp, r.id))
                .map(|r| r.id)
        })?;

        let row = self.rows.get_mut(&id)?;
        if row.status == Status::InProgress {
            warn!("Reclaiming stale row {} ({})", row.id, row.name);
        }
        row.status = Status::InProgress;
        row.timestamp = now;
        Some(id)
    }

    /// Records the outcome of processing a claimed row: the key of the stored result, or the error.
    pub fn finish(&mut self, id: usize, result: Result<String>, now: DateTime<Utc>) {
        let row = match self.rows.get_mut(&id) {
            Some(row) => row,
            None => {
                warn!("Finishing unknown row {}", id);
                return;
            }
        };
        row.timestamp = now;
        match result {
            Ok(file_name) => {
                info!("Row {} ({}) is ready at {}", id, row.name, file_name);
                row.status = Status::Ready;
                row.file_name = Some(file_name);
                row.error = None;
            }
            Err(err) => {
                error!("Row {} ({}) failed: {:#}", id, row.name, err);
                row.status = Status::Error;
                row.error = Some(format!("{:#}", err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn claims() {
        let mut queue = WorkQueue::new(Duration::seconds(60));
        let a = queue.add("A -x- B", at(0));
        let b = queue.add("B -x- C", at(1));
        let c = queue.add("C -x- D", at(2));

        // Oldest first
        assert_eq!(queue.claim(at(10)), Some(a));
        assert_eq!(queue.get(a).unwrap().status, Status::InProgress);
        // A request jumps the line
        assert!(queue.request(c, at(11)));
        assert_eq!(queue.claim(at(12)), Some(c));
        assert_eq!(queue.claim(at(13)), Some(b));
        assert_eq!(queue.claim(at(14)), None);

        queue.finish(a, Ok("USA/CA/Test/A-x-B.json".to_string()), at(15));
        queue.finish(b, Err(anyhow::anyhow!("no common nodes")), at(16));
        assert_eq!(queue.get(a).unwrap().status, Status::Ready);
        assert_eq!(queue.get(b).unwrap().status, Status::Error);
        assert!(queue.get(b).unwrap().error.as_ref().unwrap().contains("no common nodes"));

        // Ready rows get reprocessed eventually; c's claim goes stale after a minute
        assert_eq!(queue.claim(at(20)), Some(a));
        assert_eq!(queue.claim(at(75)), Some(c));
    }

    #[test]
    fn compare_and_set() {
        let mut queue = WorkQueue::new(Duration::seconds(60));
        let a = queue.add("A -x- B", at(0));
        assert!(!queue.compare_and_set(a, Status::Ready, Status::InProgress, at(1)));
        assert!(queue.compare_and_set(a, Status::Init, Status::InProgress, at(1)));
        assert!(!queue.compare_and_set(a, Status::Init, Status::InProgress, at(2)));
    }
}
