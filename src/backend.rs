// backend.rs — 渲染后端接口
//
// 控制器只通过这几个方法驱动场景：设置相机朝向、设置几何体与贴图、读取视口大小。

use crate::orientation::CameraOrientation;
use crate::panorama::ProjectionMode;
use image::RgbaImage;

pub trait RenderBackend {
    fn set_camera_orientation(&mut self, orientation: CameraOrientation);

    /// Rebuilds the surface for `projection` and binds `image` as its material.
    fn set_geometry_and_material(&mut self, projection: ProjectionMode, image: &RgbaImage);

    /// Viewport size in pixels.
    fn viewport(&self) -> (u32, u32);
}
