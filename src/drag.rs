// drag.rs — 鼠标 / 触摸拖动 → GestureEvent
//
// 位移以逻辑点为单位（物理像素 / 缩放因子），松手速度取最近 100ms 的平均值。

use glam::Vec2;
use panorama_motion::GestureEvent;
use std::collections::VecDeque;

const VELOCITY_WINDOW: f64 = 0.1;

#[derive(Debug, Default)]
pub struct DragTracker {
    origin: Option<Vec2>,
    scale_factor: f32,
    /// (seconds, cumulative translation)
    history: VecDeque<(f64, Vec2)>,
    /// Touch id that owns the drag; `None` for the mouse.
    finger: Option<u64>,
}

impl DragTracker {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            scale_factor: scale_factor as f32,
            ..Self::default()
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor as f32;
    }

    pub fn finger(&self) -> Option<u64> {
        self.finger
    }

    pub fn owns_finger(&self, id: u64) -> bool {
        self.origin.is_some() && self.finger == Some(id)
    }

    fn to_points(&self, physical: Vec2) -> Vec2 {
        if self.scale_factor > 0.0 {
            physical / self.scale_factor
        } else {
            physical
        }
    }

    pub fn press(&mut self, position: Vec2, finger: Option<u64>, now: f64) -> Option<GestureEvent> {
        if self.origin.is_some() {
            return None;
        }
        self.origin = Some(self.to_points(position));
        self.finger = finger;
        self.history.clear();
        self.history.push_back((now, Vec2::ZERO));
        Some(GestureEvent::Began)
    }

    pub fn moved(&mut self, position: Vec2, now: f64) -> Option<GestureEvent> {
        let origin = self.origin?;
        let translation = self.to_points(position) - origin;
        self.history.push_back((now, translation));
        self.prune(now);
        Some(GestureEvent::Changed { translation })
    }

    pub fn release(&mut self, now: f64) -> Option<GestureEvent> {
        self.origin.take()?;
        self.finger = None;
        self.prune(now);
        let velocity = self.velocity();
        self.history.clear();
        Some(GestureEvent::Ended {
            velocity,
            timestamp: now,
        })
    }

    fn prune(&mut self, now: f64) {
        while self
            .history
            .front()
            .is_some_and(|(t, _)| now - *t > VELOCITY_WINDOW)
        {
            self.history.pop_front();
        }
    }

    fn velocity(&self) -> Vec2 {
        match (self.history.front(), self.history.back()) {
            (Some(&(t0, p0)), Some(&(t1, p1))) if t1 > t0 => (p1 - p0) / (t1 - t0) as f32,
            _ => Vec2::ZERO,
        }
    }
}
