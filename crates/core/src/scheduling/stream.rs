//! Single-consumer error streams

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use super::failure::JobFailure;

/// Receiving half of a job's or registry's error outlet.
///
/// Ends (yields `None`) once every producer is gone and the buffer is empty.
#[derive(Debug)]
pub struct ErrorStream {
    rx: mpsc::Receiver<JobFailure>,
}

impl ErrorStream {
    pub(crate) fn new(rx: mpsc::Receiver<JobFailure>) -> Self {
        Self { rx }
    }

    pub(crate) fn into_inner(self) -> mpsc::Receiver<JobFailure> {
        self.rx
    }

    /// Wait for the next failure.
    pub async fn recv(&mut self) -> Option<JobFailure> {
        self.rx.recv().await
    }

    /// Take a buffered failure without waiting.
    pub fn try_recv(&mut self) -> Result<JobFailure, TryRecvError> {
        self.rx.try_recv()
    }

    /// Number of failures currently buffered.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Stream for ErrorStream {
    type Item = JobFailure;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::scheduling::failure::FailureCause;

    #[tokio::test]
    async fn test_stream_yields_in_order_then_ends() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream = ErrorStream::new(rx);

        for n in 0..3 {
            tx.send(JobFailure::new("j", FailureCause::Work(format!("e{n}").into())))
                .await
                .unwrap();
        }
        drop(tx);

        assert_eq!(stream.len(), 3);
        let messages: Vec<String> = stream.map(|f| f.to_string()).collect().await;
        assert_eq!(messages, vec!["job j: e0", "job j: e1", "job j: e2"]);
    }

    #[tokio::test]
    async fn test_try_recv_reports_empty_and_disconnected() {
        let (tx, rx) = mpsc::channel::<JobFailure>(1);
        let mut stream = ErrorStream::new(rx);
        assert!(stream.is_empty());
        assert_eq!(stream.try_recv().unwrap_err(), TryRecvError::Empty);

        drop(tx);
        assert_eq!(stream.try_recv().unwrap_err(), TryRecvError::Disconnected);
    }
}
