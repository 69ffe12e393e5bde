//! Line-by-line forwarding of a child process's output streams.

use std::io::{BufRead, BufReader, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::error::Result;

/// A thread forwarding one byte stream to an output stream, prefixing every
/// line with a caller-chosen label.
///
/// The thread runs until the source reaches end-of-file or [`stop`] is
/// called. The stop flag is checked at line boundaries, and the source pipe
/// closes when the owning process exits, which ends a blocked read.
///
/// [`stop`]: Redirector::stop
pub struct Redirector {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Spawn a redirector thread named `thread_name` forwarding `source` to
/// `sink` with each line prefixed by `prefix`.
pub fn spawn<R, W>(prefix: &str, thread_name: &str, source: R, mut sink: W) -> Result<Redirector>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    let prefix = prefix.to_string();
    let name = thread_name.to_string();

    let thread = thread::Builder::new().name(name.clone()).spawn(move || {
        let input = BufReader::new(source);
        for line in input.lines() {
            if flag.load(Ordering::Relaxed) {
                break;
            }
            match line {
                Ok(line) => {
                    if writeln!(sink, "{}{}", prefix, line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("error reading from process stream '{}': {}", name, e);
                    break;
                }
            }
        }
    })?;

    Ok(Redirector {
        stop,
        thread: Some(thread),
    })
}

impl Redirector {
    /// Stop forwarding and wait for the thread to finish.
    ///
    /// Called exactly once per redirector, when the owning process
    /// terminates or is killed; safe to call again after that.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Redirector {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedSink {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn wait_for<F: Fn() -> bool>(condition: F) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition never became true");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_lines_are_prefixed() {
        let sink = SharedSink::default();
        let source = Cursor::new(b"one\ntwo\n".to_vec());

        let mut redirector = spawn("3: ", "test-redirector", source, sink.clone()).unwrap();
        wait_for(|| sink.contents().contains("two"));
        redirector.stop();

        assert_eq!(sink.contents(), "3: one\n3: two\n");
    }

    #[test]
    fn test_empty_stream_forwards_nothing() {
        let sink = SharedSink::default();
        let source = Cursor::new(Vec::new());

        let mut redirector = spawn("x: ", "test-redirector-empty", source, sink.clone()).unwrap();
        redirector.stop();

        assert!(sink.contents().is_empty());
    }

    #[test]
    fn test_stop_twice_is_harmless() {
        let sink = SharedSink::default();
        let source = Cursor::new(b"line\n".to_vec());

        let mut redirector = spawn("", "test-redirector-twice", source, sink).unwrap();
        redirector.stop();
        redirector.stop();
    }
}
