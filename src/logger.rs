//! Leveled asynchronous logger. There is exactly one background worker per
//! service and it is the only thing that ever touches the sink, so emitted
//! lines come out whole and in enqueue order no matter which thread logged
//! them.
//!
//! The logger is an explicitly constructed service: the process entry point
//! creates it, hands clones to collaborators, and owns its shutdown. There
//! is no process-global state and no implicit first-use initialization.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use framepull_core::LogLevel;
use parking_lot::Mutex;

/// Destination for emitted log lines. Called only from the worker thread.
pub trait LogSink: Send {
    fn write_line(&mut self, line: &str);
}

/// Default sink: one line to stderr per message, errors swallowed.
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write_line(&mut self, line: &str) {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "{line}").ok();
    }
}

struct Inner {
    threshold: LogLevel,
    sender: Mutex<Option<Sender<String>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Cheaply cloneable handle to the logging service. All clones share the
/// same worker and threshold.
#[derive(Clone)]
pub struct AsyncLogger {
    inner: Arc<Inner>,
}

impl AsyncLogger {
    /// Create a logger emitting to stderr.
    pub fn new(threshold: LogLevel) -> Self {
        Self::with_sink(threshold, Box::new(StderrSink))
    }

    /// Create a logger emitting to the given sink.
    pub fn with_sink(threshold: LogLevel, mut sink: Box<dyn LogSink>) -> Self {
        let (sender, receiver) = mpsc::channel::<String>();

        let worker = thread::Builder::new()
            .name("framepull-log".to_string())
            .spawn(move || {
                // Runs until every sender is gone and the queue drains.
                while let Ok(line) = receiver.recv() {
                    sink.write_line(&line);
                }
            })
            .ok();

        Self {
            inner: Arc::new(Inner {
                threshold,
                sender: Mutex::new(Some(sender)),
                worker: Mutex::new(worker),
            }),
        }
    }

    /// The configured threshold.
    pub fn threshold(&self) -> LogLevel {
        self.inner.threshold
    }

    /// Log a pre-formatted message at the given level.
    ///
    /// A no-op when the level is above the threshold or the service has shut
    /// down. The message is materialized on the calling thread; the caller
    /// never blocks on the actual write.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !level.enabled(self.inner.threshold) {
            return;
        }

        let line = format!("[{}] {}", level.label(), message.into());
        if let Some(sender) = self.inner.sender.lock().as_ref() {
            sender.send(line).ok();
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn verbose(&self, message: impl Into<String>) {
        self.log(LogLevel::Verbose, message);
    }

    /// Flush queued lines and join the worker. Idempotent; later log calls
    /// on any clone are silently dropped.
    pub fn shutdown(&self) {
        // Dropping the sender closes the channel once queued lines drain.
        self.inner.sender.lock().take();
        if let Some(worker) = self.inner.worker.lock().take() {
            worker.join().ok();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.sender.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            worker.join().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread::ThreadId;

    use super::*;

    /// Sink that records lines and the thread that wrote them.
    #[derive(Clone, Default)]
    struct MemorySink {
        lines: Arc<Mutex<Vec<(ThreadId, String)>>>,
    }

    impl MemorySink {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().iter().map(|(_, l)| l.clone()).collect()
        }

        fn writer_threads(&self) -> Vec<ThreadId> {
            self.lines.lock().iter().map(|(id, _)| *id).collect()
        }
    }

    impl LogSink for MemorySink {
        fn write_line(&mut self, line: &str) {
            self.lines
                .lock()
                .push((thread::current().id(), line.to_string()));
        }
    }

    fn logger_with_sink(threshold: LogLevel) -> (AsyncLogger, MemorySink) {
        let sink = MemorySink::default();
        let logger = AsyncLogger::with_sink(threshold, Box::new(sink.clone()));
        (logger, sink)
    }

    #[test]
    fn test_above_threshold_is_dropped() {
        let (logger, sink) = logger_with_sink(LogLevel::Warning);
        logger.info("info");
        logger.debug("debug");
        logger.verbose("verbose");
        logger.shutdown();
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_at_or_below_threshold_emitted_once() {
        let (logger, sink) = logger_with_sink(LogLevel::Warning);
        logger.error("boom");
        logger.warning("careful");
        logger.shutdown();
        assert_eq!(sink.lines(), vec!["[ERROR] boom", "[WARN] careful"]);
    }

    #[test]
    fn test_single_thread_fifo() {
        let (logger, sink) = logger_with_sink(LogLevel::Verbose);
        for i in 0..100 {
            logger.info(format!("message {i}"));
        }
        logger.shutdown();
        let expected: Vec<String> = (0..100).map(|i| format!("[INFO] message {i}")).collect();
        assert_eq!(sink.lines(), expected);
    }

    #[test]
    fn test_concurrent_producers_keep_per_thread_order() {
        let (logger, sink) = logger_with_sink(LogLevel::Verbose);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let logger = logger.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        logger.info(format!("t{t} m{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        logger.shutdown();

        let lines = sink.lines();
        assert_eq!(lines.len(), 200);
        for t in 0..4 {
            let from_thread: Vec<&String> = lines
                .iter()
                .filter(|l| l.starts_with(&format!("[INFO] t{t} ")))
                .collect();
            let expected: Vec<String> = (0..50).map(|i| format!("[INFO] t{t} m{i}")).collect();
            assert_eq!(from_thread.len(), 50, "no partial or lost lines");
            for (got, want) in from_thread.iter().zip(&expected) {
                assert_eq!(*got, want, "per-thread enqueue order preserved");
            }
        }
    }

    #[test]
    fn test_clones_share_one_worker() {
        let (logger, sink) = logger_with_sink(LogLevel::Verbose);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let logger = logger.clone();
                thread::spawn(move || logger.info(format!("hello from {t}")))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        logger.shutdown();

        let writers = sink.writer_threads();
        assert_eq!(writers.len(), 8);
        assert!(
            writers.iter().all(|id| *id == writers[0]),
            "every line written by the same worker thread"
        );
    }

    #[test]
    fn test_shutdown_idempotent_and_silences_later_calls() {
        let (logger, sink) = logger_with_sink(LogLevel::Verbose);
        logger.info("before");
        logger.shutdown();
        logger.shutdown();
        logger.info("after");
        assert_eq!(sink.lines(), vec!["[INFO] before"]);
    }
}
