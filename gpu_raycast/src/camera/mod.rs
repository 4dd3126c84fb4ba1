//! Camera and per frame view state

use nalgebra::Matrix4;

mod perspective_camera;

pub use perspective_camera::PerspectiveCamera;

/// View dependent inputs of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    /// Model view matrix
    pub world_to_view: Matrix4<f32>,
    /// Frame rate the step controller aims for
    pub desired_framerate: f32,
}

impl FrameView {
    pub fn new(world_to_view: Matrix4<f32>, desired_framerate: f32) -> FrameView {
        FrameView {
            world_to_view,
            desired_framerate,
        }
    }

    pub fn from_camera(camera: &PerspectiveCamera, desired_framerate: f32) -> FrameView {
        FrameView::new(camera.world_to_view(), desired_framerate)
    }
}

/// Switches the desired frame rate between still and interactive rendering.
///
/// While the user drags the camera, frames are expected at the interactive
/// rate, otherwise at the still rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub still_framerate: f32,
    pub interactive_framerate: f32,
    active: bool,
}

impl Interaction {
    pub fn new(still_framerate: f32, interactive_framerate: f32) -> Interaction {
        Interaction {
            still_framerate,
            interactive_framerate,
            active: false,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn end(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn desired_framerate(&self) -> f32 {
        if self.active {
            self.interactive_framerate
        } else {
            self.still_framerate
        }
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::new(5.0, 15.0)
    }
}
