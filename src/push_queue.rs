//! `PushQueue`: a background worker batching per-series writes, caching
//! schemas, and retrying indefinitely on failure (spec §4.10).

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::client::{Client, ClientConfig};
use crate::error::{Error, Result};
use crate::protocol::types::{Point, Schema};

const RETRY_BACKOFF: Duration = Duration::from_secs(30);

type PushCallback<C> = dyn FnMut(Point, Option<C>) + Send;

struct QueueState<C> {
    points: HashMap<String, Vec<Point>>,
    cookies: HashMap<String, Vec<Option<C>>>,
    running: bool,
}

impl<C> QueueState<C> {
    fn new() -> Self {
        Self {
            points: HashMap::new(),
            cookies: HashMap::new(),
            running: true,
        }
    }
}

struct Shared<C> {
    state: Mutex<QueueState<C>>,
    cond: Condvar,
}

/// Parse `"database/measurement/series"` (spec §6 "Path grammar").
fn split_path(path: &str) -> Result<(&str, &str, &str)> {
    let mut parts = path.split('/');
    let (db, meas, series, rest) = (parts.next(), parts.next(), parts.next(), parts.next());
    match (db, meas, series, rest) {
        (Some(d), Some(m), Some(s), None) if !d.is_empty() && !m.is_empty() && !s.is_empty() => {
            Ok((d, m, s))
        }
        _ => Err(Error::InvalidPath {
            path: path.to_string(),
        }),
    }
}

/// A batching, retrying, schema-caching write queue. Owns exactly one
/// [`Client`] and exactly one background worker thread (spec §5); callers
/// may freely call `append`/`append_list`/`flush` concurrently without
/// additional synchronization.
pub struct PushQueue<C: Send + 'static = ()> {
    shared: Arc<Shared<C>>,
    thread: Option<JoinHandle<()>>,
    config: ClientConfig,
    throttle: Duration,
    push_cb: Option<Arc<Mutex<PushCallback<C>>>>,
}

impl<C: Send + 'static> PushQueue<C> {
    /// Create a queue with no throttle and no push callback.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_throttle(config, Duration::ZERO)
    }

    pub fn with_throttle(config: ClientConfig, throttle: Duration) -> Self {
        let mut queue = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::new()),
                cond: Condvar::new(),
            }),
            thread: None,
            config,
            throttle,
            push_cb: None,
        };
        queue.spawn_worker();
        queue
    }

    /// Install a callback invoked once per point, in append order, after
    /// that point's batch has been successfully written.
    pub fn set_push_cb(&mut self, cb: impl FnMut(Point, Option<C>) + Send + 'static) {
        self.push_cb = Some(Arc::new(Mutex::new(cb)) as Arc<Mutex<PushCallback<C>>>);
    }

    fn spawn_worker(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.running = true;
        }
        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        let throttle = self.throttle;
        let push_cb = self.push_cb.clone();
        self.thread = Some(thread::spawn(move || {
            worker_loop(shared, config, throttle, push_cb);
        }));
    }

    /// Append one point for `path`. `cookie` is passed back to the push
    /// callback, if configured, once the point is written.
    pub fn append(&self, point: Point, path: &str, cookie: Option<C>) {
        self.append_list(vec![point], path, Some(vec![cookie]));
    }

    /// Append several points at once. `cookies` defaults to a list of
    /// `None`s matching `points` when omitted.
    pub fn append_list(&self, points: Vec<Point>, path: &str, cookies: Option<Vec<Option<C>>>) {
        let cookies = cookies.unwrap_or_else(|| points.iter().map(|_| None).collect());
        let mut state = self.shared.state.lock().unwrap();
        state
            .points
            .entry(path.to_string())
            .or_default()
            .extend(points);
        state
            .cookies
            .entry(path.to_string())
            .or_default()
            .extend(cookies);
        self.shared.cond.notify_one();
    }

    /// Block until every point appended before this call has been
    /// delivered, without the source's busy-wait: acquire the lock, clear
    /// `running`, signal, join the worker, then start a fresh one (Design
    /// Notes §9, "Open question — flush() busy-wait").
    pub fn flush(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.running = false;
            self.shared.cond.notify_all();
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        self.spawn_worker();
    }
}

impl<C: Send + 'static> Drop for PushQueue<C> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.running = false;
            self.shared.cond.notify_all();
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop<C: Send + 'static>(
    shared: Arc<Shared<C>>,
    config: ClientConfig,
    throttle: Duration,
    push_cb: Option<Arc<Mutex<PushCallback<C>>>>,
) {
    let mut client = Client::new(config);
    let mut schemas: HashMap<(String, String), Schema> = HashMap::new();

    loop {
        if !throttle.is_zero() {
            thread::sleep(throttle);
        }

        let (points, mut cookies) = {
            let mut state = shared.state.lock().unwrap();
            loop {
                if !state.points.is_empty() {
                    break;
                }
                if !state.running {
                    return;
                }
                state = shared.cond.wait(state).unwrap();
            }
            (
                std::mem::take(&mut state.points),
                std::mem::take(&mut state.cookies),
            )
        };

        for (path, batch) in points {
            let batch_cookies = cookies.remove(&path).unwrap_or_default();
            deliver_with_retry(&mut client, &mut schemas, &path, &batch);

            if let Some(cb) = &push_cb {
                let mut cb = cb.lock().unwrap();
                for (point, cookie) in batch.into_iter().zip(batch_cookies.into_iter()) {
                    cb(point, cookie);
                }
            }
        }
    }
}

/// Write `batch` to `path`, retrying indefinitely on any failure with a
/// fixed 30s backoff (spec §4.10 step 3, Design Notes "Retry policy is
/// intentionally simple"). Schema lookup is retried too when it was the
/// step that failed.
fn deliver_with_retry(
    client: &mut Client,
    schemas: &mut HashMap<(String, String), Schema>,
    path: &str,
    batch: &[Point],
) {
    let (database, measurement, series) = match split_path(path) {
        Ok(parts) => parts,
        Err(e) => {
            log::error!("dropping batch for invalid path {path:?}: {e}");
            return;
        }
    };

    loop {
        let key = (database.to_string(), measurement.to_string());
        let schema = match schemas.get(&key) {
            Some(s) => s.clone(),
            None => match client.get_schema(database, measurement) {
                Ok(s) => {
                    schemas.insert(key, s.clone());
                    s
                }
                Err(e) => {
                    log::warn!("get_schema({database}, {measurement}) failed: {e}; retrying in {RETRY_BACKOFF:?}");
                    thread::sleep(RETRY_BACKOFF);
                    continue;
                }
            },
        };

        match client.write_points(database, measurement, series, &schema, batch) {
            Ok(()) => return,
            Err(e) => {
                log::warn!("write_points({path}) failed: {e}; retrying in {RETRY_BACKOFF:?}");
                thread::sleep(RETRY_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_grammar() {
        assert_eq!(split_path("db/meas/series").unwrap(), ("db", "meas", "series"));
        assert!(split_path("db/meas").is_err());
        assert!(split_path("db/meas/series/extra").is_err());
        assert!(split_path("db//series").is_err());
        assert!(split_path("").is_err());
    }
}
