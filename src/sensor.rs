// sensor.rs — 设备姿态数据源
//
// MotionSource 由控制器持有，显式 start / stop。采样通过 poll 在持有朝向状态的线程上拉取，
// 在其他线程采样的数据源必须经通道把样本交过来。

use crate::error::SensorError;
use crate::motion::MotionSample;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Default sampling period for device motion.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(15);

pub type MotionEvent = Result<MotionSample, SensorError>;

pub trait MotionSource {
    /// Whether the hardware (or simulation) can deliver samples at all.
    fn is_available(&self) -> bool;

    /// Begin sampling every `interval`.
    fn start(&mut self, interval: Duration) -> Result<(), SensorError>;

    /// Stop sampling. Calling this while inactive does nothing.
    fn stop(&mut self);

    fn is_active(&self) -> bool;

    /// Next pending sample or error, without blocking.
    fn poll(&mut self) -> Option<MotionEvent>;
}

/// Source for platforms without device motion.
#[derive(Debug, Default)]
pub struct NullMotionSource;

impl MotionSource for NullMotionSource {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&mut self, _interval: Duration) -> Result<(), SensorError> {
        Err(SensorError::Unavailable)
    }

    fn stop(&mut self) {}

    fn is_active(&self) -> bool {
        false
    }

    fn poll(&mut self) -> Option<MotionEvent> {
        None
    }
}

#[derive(Debug)]
struct ScriptedInner {
    available: bool,
    active: bool,
    interval: Option<Duration>,
    starts: usize,
    stops: usize,
    queue: VecDeque<MotionEvent>,
}

/// Deterministic source fed by hand.
///
/// Clones share the same queue, so a test can keep one handle while the
/// controller owns another.
#[derive(Debug, Clone)]
pub struct ScriptedMotionSource {
    inner: Rc<RefCell<ScriptedInner>>,
}

impl Default for ScriptedMotionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedMotionSource {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ScriptedInner {
                available: true,
                active: false,
                interval: None,
                starts: 0,
                stops: 0,
                queue: VecDeque::new(),
            })),
        }
    }

    pub fn unavailable() -> Self {
        let source = Self::new();
        source.inner.borrow_mut().available = false;
        source
    }

    pub fn push(&self, sample: MotionSample) {
        self.inner.borrow_mut().queue.push_back(Ok(sample));
    }

    pub fn push_error(&self, error: SensorError) {
        self.inner.borrow_mut().queue.push_back(Err(error));
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Interval passed to the most recent successful `start`.
    pub fn interval(&self) -> Option<Duration> {
        self.inner.borrow().interval
    }

    pub fn start_count(&self) -> usize {
        self.inner.borrow().starts
    }

    /// Number of `stop` calls that actually stopped an active source.
    pub fn stop_count(&self) -> usize {
        self.inner.borrow().stops
    }
}

impl MotionSource for ScriptedMotionSource {
    fn is_available(&self) -> bool {
        self.inner.borrow().available
    }

    fn start(&mut self, interval: Duration) -> Result<(), SensorError> {
        let mut inner = self.inner.borrow_mut();
        if !inner.available {
            return Err(SensorError::Unavailable);
        }
        inner.active = true;
        inner.interval = Some(interval);
        inner.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if inner.active {
            inner.active = false;
            inner.stops += 1;
        }
    }

    fn is_active(&self) -> bool {
        self.inner.borrow().active
    }

    fn poll(&mut self) -> Option<MotionEvent> {
        let mut inner = self.inner.borrow_mut();
        if !inner.active {
            return None;
        }
        inner.queue.pop_front()
    }
}
