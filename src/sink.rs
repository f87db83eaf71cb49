//! Buffered log sink shared by the subscriber and the flusher.

use std::{
    fmt,
    io::{self, BufWriter, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;

/// Something whose buffered output can be pushed to its destination.
pub trait Flush: Send + Sync + 'static {
    fn flush(&self) -> io::Result<()>;
}

type Inner = BufWriter<Box<dyn Write + Send>>;

/// Log destination that holds formatted events in memory until flushed.
///
/// Clones share one buffer, so the same sink can be handed to
/// `tracing_subscriber` as a writer and to [`crate::flusher::Flusher`].
/// Output is also written through whenever the buffer fills up.
///
/// The lock is held while bytes move into the inner writer, so anything
/// that can block on a terminal or pipe belongs behind [`BufferedSink::non_blocking`].
#[derive(Clone)]
pub struct BufferedSink {
    inner: Arc<Mutex<Inner>>,
}

impl BufferedSink {
    pub const DEFAULT_CAPACITY: usize = 32 * 1024;

    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY, writer)
    }

    pub fn with_capacity(capacity: usize, writer: impl Write + Send + 'static) -> Self {
        let writer: Box<dyn Write + Send> = Box::new(writer);
        Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(capacity, writer))),
        }
    }

    /// Buffers in front of a `tracing_appender` worker thread that owns `writer`.
    ///
    /// Flushing only hands the buffer to the worker. Keep the guard alive for
    /// as long as output should be written; dropping it drains the worker.
    pub fn non_blocking(writer: impl Write + Send + 'static) -> (Self, WorkerGuard) {
        let (writer, guard): (NonBlocking, WorkerGuard) = tracing_appender::non_blocking(writer);
        (Self::new(writer), guard)
    }

    pub fn stdout() -> (Self, WorkerGuard) {
        Self::non_blocking(io::stdout())
    }

    /// Bytes written but not yet flushed.
    pub fn pending(&self) -> usize {
        self.lock().buffer().len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic mid-write leaves at worst a partial line; keep logging.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for BufferedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedSink")
            .field("pending", &self.pending())
            .finish()
    }
}

impl Flush for BufferedSink {
    fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }
}

/// Writer handed out per event; holds the sink lock so events never interleave.
pub struct SinkWriter<'a> {
    guard: MutexGuard<'a, Inner>,
}

impl Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.guard.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Left to the flusher.
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferedSink {
    type Writer = SinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter { guard: self.lock() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_held_until_flush() {
        let out = SharedBuf::default();
        let sink = BufferedSink::new(out.clone());

        sink.make_writer().write_all(b"hello\n").unwrap();
        assert_eq!(out.contents(), "");
        assert_eq!(sink.pending(), 6);

        Flush::flush(&sink).unwrap();
        assert_eq!(out.contents(), "hello\n");
        assert_eq!(sink.pending(), 0);
    }

    #[test]
    fn test_clones_share_buffer() {
        let out = SharedBuf::default();
        let sink = BufferedSink::new(out.clone());
        let other = sink.clone();

        other.make_writer().write_all(b"a").unwrap();
        sink.make_writer().write_all(b"b").unwrap();
        Flush::flush(&sink).unwrap();

        assert_eq!(out.contents(), "ab");
    }

    #[test]
    fn test_full_buffer_writes_through() {
        let out = SharedBuf::default();
        let sink = BufferedSink::with_capacity(4, out.clone());

        sink.make_writer().write_all(b"0123456789").unwrap();
        assert_eq!(out.contents(), "0123456789");
    }

    #[derive(Clone, Default)]
    struct SlowBuf {
        out: SharedBuf,
    }

    impl Write for SlowBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            std::thread::sleep(Duration::from_millis(300));
            self.out.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_slow_writer_does_not_block_events() {
        let slow = SlowBuf::default();
        let (sink, guard) = BufferedSink::non_blocking(slow.clone());

        sink.make_writer().write_all(b"first\n").unwrap();
        let flushing = sink.clone();
        let started = Instant::now();
        std::thread::spawn(move || Flush::flush(&flushing).unwrap())
            .join()
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(200));

        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .finish();
        let started = Instant::now();
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("while the worker is busy");
        });
        Flush::flush(&sink).unwrap();
        assert!(
            started.elapsed() < Duration::from_millis(200),
            "event waited {:?}",
            started.elapsed()
        );

        drop(guard);
        let written = slow.out.contents();
        assert!(written.contains("first"));
        assert!(written.contains("while the worker is busy"));
    }

    #[test]
    fn test_subscriber_events_are_buffered() {
        let out = SharedBuf::default();
        let sink = BufferedSink::new(out.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("buffered event");
        });

        assert_eq!(out.contents(), "");
        Flush::flush(&sink).unwrap();
        assert!(out.contents().contains("buffered event"));
    }
}
