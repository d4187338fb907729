//! Per-stream FIFO of compressed frames awaiting muxing.

use std::collections::VecDeque;

use wm_common::BufferedFrame;

/// FIFO of buffered frames for one stream.
///
/// Filled by the stream's refill step, drained by the scheduler. Both run
/// on the session thread.
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<BufferedFrame>,
    /// Total payload bytes currently queued.
    bytes: usize,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: BufferedFrame) {
        self.bytes += frame.len();
        self.frames.push_back(frame);
    }

    pub fn peek(&self) -> Option<&BufferedFrame> {
        self.frames.front()
    }

    pub fn pop(&mut self) -> Option<BufferedFrame> {
        let frame = self.frames.pop_front()?;
        self.bytes -= frame.len();
        Some(frame)
    }

    /// Timestamp of the frame at the head of the queue.
    pub fn head_timestamp(&self) -> Option<u64> {
        self.peek().map(|f| f.timestamp_ms)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn queued_bytes(&self) -> usize {
        self.bytes
    }

    /// Drop every queued frame and its payload.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.bytes = 0;
    }
}

impl Extend<BufferedFrame> for FrameQueue {
    fn extend<I: IntoIterator<Item = BufferedFrame>>(&mut self, iter: I) {
        for frame in iter {
            self.push(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ts: u64, size: usize) -> BufferedFrame {
        BufferedFrame::audio(vec![0; size], ts, ts)
    }

    #[test]
    fn fifo_order() {
        let mut queue = FrameQueue::new();
        queue.push(frame(0, 1));
        queue.push(frame(20, 1));
        queue.push(frame(40, 1));

        assert_eq!(queue.head_timestamp(), Some(0));
        assert_eq!(queue.pop().unwrap().timestamp_ms, 0);
        assert_eq!(queue.pop().unwrap().timestamp_ms, 20);
        assert_eq!(queue.head_timestamp(), Some(40));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn empty_queue() {
        let mut queue = FrameQueue::new();
        assert!(queue.is_empty());
        assert!(queue.peek().is_none());
        assert!(queue.pop().is_none());
        assert_eq!(queue.head_timestamp(), None);
    }

    #[test]
    fn byte_accounting() {
        let mut queue = FrameQueue::new();
        queue.extend([frame(0, 100), frame(10, 50)]);
        assert_eq!(queue.queued_bytes(), 150);
        queue.pop();
        assert_eq!(queue.queued_bytes(), 50);
        queue.clear();
        assert_eq!(queue.queued_bytes(), 0);
        assert!(queue.is_empty());
    }
}
