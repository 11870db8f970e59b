// simulated.rs — 桌面端没有陀螺仪，用后台线程模拟设备姿态
//
// 采样线程通过 mpsc 通道把数据交给主循环，主循环在每次事件循环里 poll，
// 朝向状态始终只在主线程上修改。

use panorama_motion::sensor::{MotionEvent, MotionSource};
use panorama_motion::{ConfigError, MotionSample, ScreenOrientation, SensorError};
use glam::Quat;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Produces the n-th event given the time since sampling started; `None` ends the stream.
type Generator = Arc<dyn Fn(Duration, usize) -> Option<MotionEvent> + Send + Sync>;

struct Worker {
    stop: Arc<AtomicBool>,
    rx: Receiver<MotionEvent>,
}

pub struct ThreadedMotionSource {
    name: &'static str,
    available: bool,
    generator: Generator,
    worker: Option<Worker>,
}

impl ThreadedMotionSource {
    fn new(name: &'static str, available: bool, generator: Generator) -> Self {
        Self {
            name,
            available,
            generator,
            worker: None,
        }
    }

    /// A device held upright that slowly turns around and nods up and down.
    pub fn sweep() -> Self {
        Self::new(
            "sweep",
            true,
            Arc::new(|elapsed: Duration, _: usize| -> Option<MotionEvent> {
                let t = elapsed.as_secs_f32();
                let heading = 0.3 * t;
                let tilt = 0.6 * (0.25 * t).sin();
                let attitude = Quat::from_rotation_z(heading) * Quat::from_rotation_x(FRAC_PI_2 + tilt);
                Some(Ok(MotionSample::from_attitude(attitude, ScreenOrientation::Portrait)))
            }),
        )
    }

    /// Plays back recorded samples once, then reports [`SensorError::Exhausted`].
    pub fn replay(samples: Vec<MotionSample>) -> Self {
        let available = !samples.is_empty();
        let samples = Arc::new(samples);
        Self::new(
            "replay",
            available,
            Arc::new(move |_: Duration, index: usize| -> Option<MotionEvent> {
                if index < samples.len() {
                    Some(Ok(samples[index]))
                } else if index == samples.len() {
                    Some(Err(SensorError::Exhausted))
                } else {
                    None
                }
            }),
        )
    }
}

impl MotionSource for ThreadedMotionSource {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&mut self, interval: Duration) -> Result<(), SensorError> {
        if !self.available {
            return Err(SensorError::Unavailable);
        }
        if self.worker.is_some() {
            return Ok(());
        }

        let (tx, rx) = channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let generator = self.generator.clone();
        let name = self.name;

        thread::spawn(move || {
            let started = Instant::now();
            let mut index = 0;
            while !flag.load(Ordering::Relaxed) {
                let Some(event) = generator(started.elapsed(), index) else {
                    break;
                };
                let last = event.is_err();
                // 接收端已丢弃 = 已停止
                if tx.send(event).is_err() || last {
                    break;
                }
                index += 1;
                thread::sleep(interval);
            }
            log::debug!("{name} motion thread finished after {index} samples");
        });

        log::info!("{} motion source started", self.name);
        self.worker = Some(Worker { stop, rx });
        Ok(())
    }

    fn stop(&mut self) {
        // 不 join：采样线程最多再睡一个周期就会退出
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Relaxed);
            log::info!("{} motion source stopped", self.name);
        }
    }

    fn is_active(&self) -> bool {
        self.worker.is_some()
    }

    fn poll(&mut self) -> Option<MotionEvent> {
        let worker = self.worker.as_ref()?;
        match worker.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SensorError::Disconnected)),
        }
    }
}

impl Drop for ThreadedMotionSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One recorded reading in a replay file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSample {
    /// [x, y, z, w]
    pub attitude: [f32; 4],
    #[serde(default)]
    pub screen_orientation: ScreenOrientation,
}

impl From<&RecordedSample> for MotionSample {
    fn from(r: &RecordedSample) -> Self {
        MotionSample::from_attitude(Quat::from_array(r.attitude).normalize(), r.screen_orientation)
    }
}

pub fn load_replay(path: &Path) -> Result<Vec<MotionSample>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let recorded: Vec<RecordedSample> = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(recorded.iter().map(MotionSample::from).collect())
}
