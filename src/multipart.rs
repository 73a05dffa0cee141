//! Streaming multipart/form-data request bodies.
//!
//! The file part is produced by a background task and consumed by the
//! HTTP body through a bounded channel, so a file is never held in memory
//! as a whole. When the channel is full the producer waits, which ties file
//! read speed to network send speed.

use std::io;

use futures::stream;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Bytes read from the source per chunk.
const CHUNK_SIZE: usize = 32 * 1024;

/// Chunks buffered between producer and HTTP body.
const PIPE_DEPTH: usize = 4;

const FILE_CONTENT_TYPE: &str = "application/octet-stream";

type Chunk = io::Result<Vec<u8>>;

/// Handle on the task writing a form body. Dropping it stops the task.
#[derive(Debug)]
pub struct Producer(JoinHandle<()>);

impl Producer {
    /// Returns true once the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A form upload ready to be attached to a request.
#[derive(Debug)]
pub struct StreamedForm {
    /// The form; its file part reads from the producer.
    pub form: Form,
    /// Keep alive until the request has completed.
    pub producer: Producer,
}

/// Stream a form with a `path` field followed by a `file` part read from `reader`.
///
/// A read error is handed to the body as its error, so the request fails
/// and no closing boundary is sent.
///
/// # Errors
///
/// Returns [`crate::DryccError::HttpError`] if the part cannot be built.
pub fn stream_form<R>(remote_path: &str, file_name: &str, reader: R) -> Result<StreamedForm>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (rx, producer) = spawn_producer(reader);

    let chunks = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    let file = Part::stream(Body::wrap_stream(chunks))
        .file_name(file_name.to_string())
        .mime_str(FILE_CONTENT_TYPE)?;

    let form = Form::new()
        .text("path", remote_path.to_string())
        .part("file", file);
    tracing::debug!(boundary = form.boundary(), "multipart form ready");

    Ok(StreamedForm { form, producer })
}

fn spawn_producer<R>(reader: R) -> (mpsc::Receiver<Chunk>, Producer)
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(PIPE_DEPTH);
    let handle = tokio::spawn(async move {
        if let Err(err) = copy_file(&tx, reader).await {
            tracing::debug!(error = %err, "multipart producer stopped");
            // Fails only if the body is already gone.
            let _ = tx.send(Err(err)).await;
        }
    });

    (rx, Producer(handle))
}

async fn copy_file<R>(tx: &mpsc::Sender<Chunk>, mut reader: R) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut copied = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        copied += n as u64;
        send(tx, buf[..n].to_vec()).await?;
    }

    tracing::debug!(bytes = copied, "multipart file part complete");
    Ok(())
}

async fn send(tx: &mpsc::Sender<Chunk>, chunk: Vec<u8>) -> io::Result<()> {
    tx.send(Ok(chunk))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "request body dropped"))
}
