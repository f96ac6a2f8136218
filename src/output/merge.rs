//! Fair merging of two fallible streams.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

/// Merges two independently paced sources into one stream.
///
/// Whichever source has an item ready is forwarded first; a pending source
/// never holds back the other one. The source polled first alternates on
/// every poll so a busy source cannot starve a slow one. A source that ends,
/// or yields an error, is dropped and the other keeps flowing until it is
/// exhausted too.
#[derive(Debug)]
pub struct StreamMerger<A, B> {
    first: Option<A>,
    second: Option<B>,
    second_goes_first: bool,
}

impl<A, B> StreamMerger<A, B> {
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self {
            first: Some(first),
            second: Some(second),
            second_goes_first: false,
        }
    }

    /// Whether both sources have ended.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.first.is_none() && self.second.is_none()
    }
}

fn poll_source<S, T, E>(slot: &mut Option<S>, cx: &mut Context<'_>, label: &str) -> Poll<Option<T>>
where
    S: Stream<Item = Result<T, E>> + Unpin,
    E: fmt::Display,
{
    let Some(source) = slot.as_mut() else {
        return Poll::Ready(None);
    };
    match Pin::new(source).poll_next(cx) {
        Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(item)),
        Poll::Ready(Some(Err(e))) => {
            tracing::warn!(source = label, error = %e, "Output source failed, dropping it");
            *slot = None;
            Poll::Ready(None)
        }
        Poll::Ready(None) => {
            tracing::debug!(source = label, "Output source exhausted");
            *slot = None;
            Poll::Ready(None)
        }
        Poll::Pending => Poll::Pending,
    }
}

impl<A, B, T, E> Stream for StreamMerger<A, B>
where
    A: Stream<Item = Result<T, E>> + Unpin,
    B: Stream<Item = Result<T, E>> + Unpin,
    E: fmt::Display,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        let second_first = this.second_goes_first;
        this.second_goes_first = !second_first;

        for turn in 0..2 {
            let poll_second = (turn == 0) == second_first;
            let polled = if poll_second {
                poll_source(&mut this.second, cx, "second")
            } else {
                poll_source(&mut this.first, cx, "first")
            };
            if let Poll::Ready(Some(item)) = polled {
                return Poll::Ready(Some(item));
            }
        }

        if this.is_exhausted() {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.is_exhausted() {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}
