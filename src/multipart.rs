//! Streaming multipart/form-data body construction
//!
//! The upload body is produced by a spawned encoder task and handed to the
//! HTTP transport through a bounded channel, so a payload of any size keeps a
//! small constant amount of data in flight. The encoder exclusively owns the
//! caller's byte source and drops it once the copy finishes or fails; errors
//! on the encoder side travel down the channel and surface to the transport
//! as read failures.

use std::io;

use bytes::Bytes;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

/// A byte source consumed by an upload. Fully read and dropped by the
/// encoder task, never by the caller.
pub type ByteSource = Box<dyn AsyncRead + Send + Unpin + 'static>;

const FOLDER_ID_FIELD: &str = "folderId";
const FILE_FIELD: &str = "file";

/// Chunks in flight between the encoder and the transport.
pub(crate) const PIPE_CAPACITY: usize = 8;
/// Read window per chunk pulled from the byte source.
pub(crate) const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A multipart body being produced concurrently with its transmission.
pub(crate) struct StreamingForm {
    /// Value for the request's `Content-Type` header
    pub content_type: String,
    /// Chunk stream the HTTP transport drains lazily
    pub stream: ReceiverStream<io::Result<Bytes>>,
}

/// Build the streaming multipart body for a (folder id, file name, source)
/// triple and spawn its encoder task.
pub(crate) fn streaming_form<R>(folder_id: &str, file_name: &str, source: R) -> StreamingForm
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let boundary = format!("gofile-{}", Uuid::new_v4().simple());
    let content_type = format!("multipart/form-data; boundary={boundary}");

    let head = form_head(&boundary, folder_id, file_name);
    let tail = Bytes::from(format!("\r\n--{boundary}--\r\n"));

    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(PIPE_CAPACITY);
    tokio::spawn(encode(tx, head, tail, source));

    StreamingForm {
        content_type,
        stream: ReceiverStream::new(rx),
    }
}

/// Encoder task: form field, file part header, source copy, closing
/// boundary. A failed `send` means the transport dropped the request
/// (completion or cancellation); the task exits and the source is dropped
/// with it on every path.
async fn encode<R>(tx: mpsc::Sender<io::Result<Bytes>>, head: Bytes, tail: Bytes, source: R)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    if tx.send(Ok(head)).await.is_err() {
        return;
    }

    let mut chunks = ReaderStream::with_capacity(source, READ_CHUNK_SIZE);
    while let Some(chunk) = chunks.next().await {
        let failed = chunk.is_err();
        if failed {
            debug!("copying byte source into multipart body failed");
        }
        if tx.send(chunk).await.is_err() || failed {
            return;
        }
    }

    let _ = tx.send(Ok(tail)).await;
}

fn form_head(boundary: &str, folder_id: &str, file_name: &str) -> Bytes {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    Bytes::from(format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{FOLDER_ID_FIELD}\"\r\n\r\n\
         {folder_id}\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"{FILE_FIELD}\"; filename=\"{name}\"\r\n\
         Content-Type: {mime}\r\n\r\n",
        name = escape_quotes(file_name),
    ))
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// AsyncRead wrapper that counts bytes handed to the encoder and flags
    /// its own drop.
    struct TrackedReader<R> {
        inner: R,
        produced: Arc<AtomicUsize>,
        dropped: Arc<AtomicBool>,
    }

    impl<R: AsyncRead + Unpin> AsyncRead for TrackedReader<R> {
        fn poll_read(
            self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let me = self.get_mut();
            let before = buf.filled().len();
            match Pin::new(&mut me.inner).poll_read(cx, buf) {
                Poll::Ready(Ok(())) => {
                    me.produced
                        .fetch_add(buf.filled().len() - before, Ordering::SeqCst);
                    Poll::Ready(Ok(()))
                }
                other => other,
            }
        }
    }

    impl<R> Drop for TrackedReader<R> {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    /// Source that yields one chunk then fails.
    struct FailingReader {
        served: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let me = self.get_mut();
            if me.served {
                Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "source died")))
            } else {
                me.served = true;
                buf.put_slice(b"partial");
                Poll::Ready(Ok(()))
            }
        }
    }

    async fn collect(form: StreamingForm) -> Vec<u8> {
        let mut stream = form.stream;
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn frames_field_file_and_closing_boundary() {
        let form = streaming_form("folder-1", "notes.txt", &b"hello world"[..]);
        let boundary = form
            .content_type
            .strip_prefix("multipart/form-data; boundary=")
            .unwrap()
            .to_string();

        let body = String::from_utf8(collect(form).await).unwrap();

        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.contains("Content-Disposition: form-data; name=\"folderId\"\r\n\r\nfolder-1\r\n"));
        assert!(body.contains("name=\"file\"; filename=\"notes.txt\""));
        assert!(body.contains("Content-Type: text/plain"));
        assert!(body.contains("hello world"));
        assert!(body.ends_with(&format!("\r\n--{boundary}--\r\n")));
    }

    #[tokio::test]
    async fn escapes_quotes_in_file_name() {
        let form = streaming_form("f", "we\"ird\\name", &b"x"[..]);
        let body = String::from_utf8(collect(form).await).unwrap();
        assert!(body.contains(r#"filename="we\"ird\\name""#));
    }

    #[tokio::test]
    async fn buffered_window_is_bounded_with_slow_consumer() {
        let total = 4 * 1024 * 1024;
        let produced = Arc::new(AtomicUsize::new(0));
        let source = TrackedReader {
            inner: std::io::Cursor::new(vec![7u8; total]),
            produced: Arc::clone(&produced),
            dropped: Arc::new(AtomicBool::new(false)),
        };

        let mut stream = streaming_form("folder-1", "huge.bin", source).stream;

        // One extra chunk may sit inside the encoder between recv and send.
        let window = (PIPE_CAPACITY + 2) * READ_CHUNK_SIZE;
        let mut consumed = 0usize;
        while let Some(chunk) = stream.next().await {
            consumed += chunk.unwrap().len();
            tokio::task::yield_now().await;
            let ahead = produced.load(Ordering::SeqCst).saturating_sub(consumed);
            assert!(ahead <= window, "encoder ran {ahead} bytes ahead");
        }
        assert!(consumed > total);
    }

    #[tokio::test]
    async fn source_error_reaches_the_consumer() {
        let mut stream = streaming_form("f", "a.bin", FailingReader { served: false }).stream;

        let mut saw_error = false;
        while let Some(chunk) = stream.next().await {
            if let Err(e) = chunk {
                assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
                saw_error = true;
            }
        }
        assert!(saw_error, "producer failure was dropped silently");
    }

    #[tokio::test]
    async fn dropping_the_consumer_releases_the_source() {
        let dropped = Arc::new(AtomicBool::new(false));
        let source = TrackedReader {
            inner: std::io::Cursor::new(vec![0u8; 16 * 1024 * 1024]),
            produced: Arc::new(AtomicUsize::new(0)),
            dropped: Arc::clone(&dropped),
        };

        let stream = streaming_form("f", "a.bin", source).stream;
        drop(stream);

        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while !dropped.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("encoder kept the byte source alive after cancellation");
    }
}
