//! Download progress reporting.
//!
//! Sessions report metadata downloads through [`DownloadProgress`];
//! [`MetadataProgress`] folds those notifications down to a single
//! `(name, fraction)` callback supplied by the caller.

use log::{trace, warn};
use std::fmt;

/// Something being downloaded. Its `Display` form is the name shown to users.
pub trait Payload: fmt::Display {
    /// Total bytes for this payload, when the engine knows it.
    fn download_size(&self) -> Option<u64> {
        None
    }
}

/// Terminal state of a single payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
    AlreadyExists,
    Mirror,
    Drpm,
}

/// Observer for a set of downloads, invoked synchronously by the session.
pub trait DownloadProgress {
    /// A new download set begins.
    fn start(&mut self, total_files: usize, total_size: u64);

    /// `done` bytes of `payload` have been received so far.
    fn progress(&mut self, payload: &dyn Payload, done: u64);

    /// `payload` finished with `status`.
    fn end(&mut self, payload: &dyn Payload, status: Status, msg: Option<&str>);
}

/// Caller-supplied progress callback: `(name, fraction in [0, 1])`.
pub type ProgressFn = Box<dyn FnMut(&str, f64) + Send>;

const LAST_UNSET: f64 = -1.0;
const STEP: f64 = 0.01;

/// Adapts download notifications to a [`ProgressFn`].
pub struct MetadataProgress {
    last: f64,
    callback: Option<ProgressFn>,
}

impl MetadataProgress {
    pub fn new(callback: Option<ProgressFn>) -> Self {
        Self {
            last: LAST_UNSET,
            callback,
        }
    }

    /// Last fraction that moved the tracked high-water mark.
    pub fn last(&self) -> f64 {
        self.last
    }

    fn emit(&mut self, name: &str, fraction: f64) {
        if let Some(cb) = self.callback.as_mut() {
            cb(name, fraction);
        }
    }
}

impl Default for MetadataProgress {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for MetadataProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataProgress")
            .field("last", &self.last)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl DownloadProgress for MetadataProgress {
    fn start(&mut self, total_files: usize, total_size: u64) {
        trace!("Download set started: {} file(s), {} byte(s)", total_files, total_size);
        self.last = LAST_UNSET;
    }

    fn progress(&mut self, payload: &dyn Payload, done: u64) {
        let name = payload.to_string();
        let fraction = match payload.download_size() {
            Some(total) if total > 0 => done as f64 / total as f64,
            _ => 0.0,
        };

        // Only the bookkeeping is thresholded; every update is delivered.
        if fraction > self.last + STEP {
            self.last = fraction;
        }

        trace!("{}: {:.3}", name, fraction);
        self.emit(&name, fraction);
    }

    fn end(&mut self, payload: &dyn Payload, status: Status, msg: Option<&str>) {
        let name = payload.to_string();
        match status {
            Status::Ok => self.emit(&name, 1.0),
            Status::Failed => warn!("Download of {} failed: {}", name, msg.unwrap_or("unknown error")),
            other => trace!("{} ended with {:?}", name, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Known(&'static str, Option<u64>);

    impl fmt::Display for Known {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Payload for Known {
        fn download_size(&self) -> Option<u64> {
            self.1
        }
    }

    struct Unknown(&'static str);

    impl fmt::Display for Unknown {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Payload for Unknown {}

    type Calls = Arc<Mutex<Vec<(String, f64)>>>;

    fn recording() -> (MetadataProgress, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let progress = MetadataProgress::new(Some(Box::new(move |name, frac| {
            sink.lock().unwrap().push((name.to_string(), frac));
        })));
        (progress, calls)
    }

    #[test]
    fn test_progress_reports_fraction() {
        let (mut progress, calls) = recording();
        progress.start(1, 200);
        progress.progress(&Known("fedora", Some(200)), 100);

        assert_eq!(*calls.lock().unwrap(), vec![("fedora".to_string(), 0.5)]);
        assert_eq!(progress.last(), 0.5);
    }

    #[test]
    fn test_progress_unknown_or_zero_size_is_zero() {
        let (mut progress, calls) = recording();
        progress.progress(&Unknown("updates"), 4096);
        progress.progress(&Known("updates", Some(0)), 4096);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, frac)| *frac == 0.0));
    }

    #[test]
    fn test_progress_small_steps_still_delivered() {
        let (mut progress, calls) = recording();
        let payload = Known("fedora", Some(1000));
        progress.progress(&payload, 100);
        progress.progress(&payload, 105);

        // 0.105 is within the step of 0.1, so the high-water mark stays put
        assert_eq!(progress.last(), 0.1);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_start_resets_last() {
        let (mut progress, _calls) = recording();
        progress.progress(&Known("fedora", Some(10)), 9);
        assert!(progress.last() > 0.8);

        progress.start(2, 0);
        assert_eq!(progress.last(), -1.0);
    }

    #[test]
    fn test_end_ok_reports_complete() {
        let (mut progress, calls) = recording();
        let payload = Known("fedora", Some(200));
        progress.progress(&payload, 20);
        progress.end(&payload, Status::Ok, None);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.last(), Some(&("fedora".to_string(), 1.0)));
    }

    #[test]
    fn test_end_other_status_is_silent() {
        let (mut progress, calls) = recording();
        let payload = Known("fedora", Some(200));
        progress.end(&payload, Status::Failed, Some("Curl error (28)"));
        progress.end(&payload, Status::AlreadyExists, None);
        progress.end(&payload, Status::Mirror, None);

        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_without_callback() {
        let mut progress = MetadataProgress::default();
        let payload = Known("fedora", Some(200));
        progress.start(1, 200);
        progress.progress(&payload, 200);
        progress.end(&payload, Status::Ok, None);
        assert_eq!(progress.last(), 1.0);
    }
}
