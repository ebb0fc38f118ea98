//! Frame scheduling.
//!
//! Animation code never touches a clock directly. It asks an injected
//! [`FrameScheduler`] to call it back on the next frame and keeps the
//! returned [`FrameHandle`] so the request can be cancelled.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Callback invoked with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Cancellation handle for a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(u64);

/// "Request next frame" capability.
///
/// Requests are one-shot: a callback that wants another frame schedules
/// itself again.
pub trait FrameScheduler {
    fn schedule(&self, callback: FrameCallback) -> FrameHandle;

    /// Drop a pending request. Unknown or already-fired handles are ignored.
    fn cancel(&self, handle: FrameHandle);
}

#[derive(Default)]
struct FrameQueue {
    next_id: u64,
    now_ms: f64,
    frames: u64,
    pending: BTreeMap<u64, FrameCallback>,
}

/// Frame queue stepped explicitly by its owner.
///
/// Tests step it like a fake clock; the CLI steps it from a tokio interval.
/// Clones share the same queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<FrameQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp of the most recent frame.
    pub fn now(&self) -> f64 {
        self.queue.borrow().now_ms
    }

    /// Number of frames stepped so far.
    pub fn frames_run(&self) -> u64 {
        self.queue.borrow().frames
    }

    /// Callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.borrow().pending.is_empty()
    }

    /// Move the clock forward by `dt_ms` and run one frame.
    ///
    /// Only callbacks requested before this frame run; anything they
    /// schedule waits for the next one. Returns the number of callbacks run.
    pub fn advance(&self, dt_ms: f64) -> usize {
        let (now, due) = {
            let mut queue = self.queue.borrow_mut();
            queue.now_ms += dt_ms.max(0.0);
            queue.frames += 1;
            (queue.now_ms, std::mem::take(&mut queue.pending))
        };

        let count = due.len();
        for (_, callback) in due {
            callback(now);
        }
        count
    }

    /// Step frames until nothing is pending or `max_frames` have run.
    /// Returns the number of frames stepped.
    pub fn run_until_idle(&self, dt_ms: f64, max_frames: usize) -> usize {
        let mut frames = 0;
        while !self.is_idle() && frames < max_frames {
            self.advance(dt_ms);
            frames += 1;
        }
        frames
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule(&self, callback: FrameCallback) -> FrameHandle {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        queue.pending.insert(id, callback);
        FrameHandle(id)
    }

    fn cancel(&self, handle: FrameHandle) {
        self.queue.borrow_mut().pending.remove(&handle.0);
    }
}
