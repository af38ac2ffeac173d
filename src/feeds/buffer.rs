//! Bounded FIFO sample buffer and its read-only handle.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fixed-capacity, insertion-ordered sample buffer (oldest first).
///
/// Invariant: `len() <= capacity()`. Pushing onto a full buffer drops the
/// oldest sample.
#[derive(Debug, Clone)]
pub struct FeedBuffer<S> {
    samples: VecDeque<S>,
    capacity: usize,
}

impl<S> FeedBuffer<S> {
    /// Create an empty buffer. A zero capacity is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a buffer from existing samples, keeping only the newest `capacity`.
    pub fn from_samples(capacity: usize, samples: impl IntoIterator<Item = S>) -> Self {
        let mut buffer = Self::new(capacity);
        for sample in samples {
            buffer.push(sample);
        }
        buffer
    }

    /// Append one sample, evicting from the front when over capacity.
    pub fn push(&mut self, sample: S) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn latest(&self) -> Option<&S> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&S> {
        self.samples.front()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &S> + ExactSizeIterator {
        self.samples.iter()
    }
}

impl<S: Clone> FeedBuffer<S> {
    /// Ordered copy of the current contents.
    pub fn to_vec(&self) -> Vec<S> {
        self.samples.iter().cloned().collect()
    }
}

// ============================================================================
// Read-only handle
// ============================================================================

/// Shared read access to a generator's buffer.
///
/// The generator task is the only writer; readers (aggregator, presentation)
/// take a short read lock and copy out what they need.
#[derive(Debug)]
pub struct FeedReader<S> {
    inner: Arc<RwLock<FeedBuffer<S>>>,
}

impl<S> Clone for FeedReader<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Clone> FeedReader<S> {
    pub(crate) fn new(inner: Arc<RwLock<FeedBuffer<S>>>) -> Self {
        Self { inner }
    }

    /// Ordered copy of the buffer (oldest first).
    pub async fn snapshot(&self) -> Vec<S> {
        self.inner.read().await.to_vec()
    }

    pub async fn latest(&self) -> Option<S> {
        self.inner.read().await.latest().cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn capacity(&self) -> usize {
        self.inner.read().await.capacity()
    }
}
