// report.rs — 朝向变化上报（指南针 / 移动回调）
//
// 每次状态变化都生成一个 MovementReport。指南针总会收到；
// 仅由视口尺寸变化触发的上报不调用移动回调。

use crate::math;
use crate::orientation::OrientationState;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementReport {
    /// Negated camera yaw, radians.
    pub rotation_angle: f32,
    /// Horizontal field of view, radians.
    pub field_of_view: f32,
}

/// What triggered a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportCause {
    Gesture,
    Motion,
    Deceleration,
    Reset,
    ProjectionChange,
    Resize,
}

impl ReportCause {
    fn notifies_handler(self) -> bool {
        self != ReportCause::Resize
    }
}

pub trait CompassListener {
    fn on_movement(&mut self, rotation_angle: f32, field_of_view: f32);
}

impl<T: CompassListener> CompassListener for Rc<RefCell<T>> {
    fn on_movement(&mut self, rotation_angle: f32, field_of_view: f32) {
        self.borrow_mut().on_movement(rotation_angle, field_of_view);
    }
}

pub type MovementHandler = Box<dyn FnMut(MovementReport)>;

pub struct MovementReporter {
    vertical_fov_deg: f32,
    viewport: (u32, u32),
    compass: Option<Box<dyn CompassListener>>,
    handler: Option<MovementHandler>,
    last: Option<MovementReport>,
    reports: u64,
}

impl MovementReporter {
    pub fn new(vertical_fov_deg: f32) -> Self {
        Self {
            vertical_fov_deg,
            viewport: (1, 1),
            compass: None,
            handler: None,
            last: None,
            reports: 0,
        }
    }

    pub fn set_compass(&mut self, compass: Option<Box<dyn CompassListener>>) {
        self.compass = compass;
    }

    pub fn set_handler(&mut self, handler: Option<MovementHandler>) {
        self.handler = handler;
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn set_vertical_fov(&mut self, degrees: f32) {
        self.vertical_fov_deg = degrees;
    }

    pub fn vertical_fov(&self) -> f32 {
        self.vertical_fov_deg
    }

    /// Horizontal field of view for the current viewport, radians.
    pub fn field_of_view(&self) -> f32 {
        let (w, h) = self.viewport;
        math::horizontal_fov(self.vertical_fov_deg.to_radians(), w as f32, h as f32)
    }

    pub fn last(&self) -> Option<MovementReport> {
        self.last
    }

    /// Number of reports emitted so far.
    pub fn reports(&self) -> u64 {
        self.reports
    }

    pub fn report(&mut self, state: &OrientationState, cause: ReportCause) -> MovementReport {
        let report = MovementReport {
            rotation_angle: state.rotation_angle(),
            field_of_view: self.field_of_view(),
        };

        if let Some(compass) = self.compass.as_mut() {
            compass.on_movement(report.rotation_angle, report.field_of_view);
        }
        if cause.notifies_handler() {
            if let Some(handler) = self.handler.as_mut() {
                handler(report);
            }
        }

        self.last = Some(report);
        self.reports += 1;
        report
    }
}
