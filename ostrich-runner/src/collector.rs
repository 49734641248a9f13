use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::debug;

const CHUNK_SIZE: usize = 8192;

/// Drains one child output stream on its own task.
///
/// Bytes land in a shared buffer as they arrive, so whatever was read stays
/// available even if the stream never reaches EOF.
pub(crate) struct StreamCollector {
    name: &'static str,
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<std::io::Result<()>>,
    joined: bool,
}

impl StreamCollector {
    pub(crate) fn spawn<R>(name: &'static str, mut reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let handle = tokio::spawn(async move {
            let mut chunk = [0u8; CHUNK_SIZE];
            loop {
                let read = reader.read(&mut chunk).await?;
                if read == 0 {
                    return Ok(());
                }
                sink.lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .extend_from_slice(&chunk[..read]);
            }
        });
        Self {
            name,
            buffer,
            handle,
            joined: false,
        }
    }

    /// Wait until the stream reaches EOF.
    ///
    /// A read error from the reader task is returned by the first call only;
    /// later calls return `Ok(())`.
    pub(crate) async fn finish(&mut self) -> std::io::Result<()> {
        if self.joined {
            return Ok(());
        }
        let joined = (&mut self.handle).await;
        self.joined = true;
        match joined {
            Ok(result) => result,
            Err(join_err) => Err(std::io::Error::new(std::io::ErrorKind::Other, join_err)),
        }
    }

    /// Give the reader up to `grace` to reach EOF, then stop it.
    pub(crate) async fn finish_within(&mut self, grace: Duration) {
        match tokio::time::timeout(grace, self.finish()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(stream = self.name, error = %e, "Stream read failed while draining"),
            Err(_) => {
                debug!(stream = self.name, "Stream still open after drain grace, giving up");
                self.handle.abort();
            }
        }
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.handle.abort();
        let mut buffer = self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::new(std::io::ErrorKind::Other, "broken")))
        }
    }

    #[tokio::test]
    async fn test_collects_until_eof() {
        let mut collector = StreamCollector::spawn("stdout", &b"hello world"[..]);
        collector.finish().await.unwrap();
        assert_eq!(collector.into_bytes(), b"hello world");
    }

    #[tokio::test]
    async fn test_keeps_partial_output_when_stream_stays_open() {
        let (mut writer, reader) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut writer, b"partial").await.unwrap();

        let mut collector = StreamCollector::spawn("stdout", reader);
        collector.finish_within(Duration::from_millis(100)).await;
        assert_eq!(collector.into_bytes(), b"partial");
        drop(writer);
    }

    #[tokio::test]
    async fn test_reports_read_error_after_task_ended() {
        let mut collector = StreamCollector::spawn("stderr", BrokenReader);
        while !collector.handle.is_finished() {
            tokio::task::yield_now().await;
        }

        let err = collector.finish().await.unwrap_err();
        assert_eq!(err.to_string(), "broken");
        assert!(collector.finish().await.is_ok());
        assert!(collector.into_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_finish_twice_after_eof() {
        let mut collector = StreamCollector::spawn("stdout", &b"once"[..]);
        collector.finish().await.unwrap();
        collector.finish().await.unwrap();
        assert_eq!(collector.into_bytes(), b"once");
    }
}
