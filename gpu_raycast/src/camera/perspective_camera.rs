use nalgebra::{vector, Isometry3, Matrix4, Point3, Rotation3, Vector2, Vector3};

use crate::common::Ray;

/// Pinhole camera used to place the view for the GPU mapper and to
/// generate rays for the CPU preview.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Position of the camera in world coordinates
    position: Point3<f32>,
    /// Up direction from the camera's perspective
    up: Vector3<f32>,
    /// Right direction from the camera's perspective
    right: Vector3<f32>,
    /// Unit viewing direction
    direction: Vector3<f32>,
    /// Aspect ratio of image plane
    aspect: f32,
    /// Vertical Field of View in degrees
    fov_y: f32,
    /// Size of image plane, calculated from fov_y
    img_plane_size: Vector2<f32>,
    /// Direction of ray passing through the upper left corner
    dir_00: Vector3<f32>,
    /// Offset across the whole image plane horizontally
    du: Vector3<f32>,
    /// Offset across the whole image plane vertically, points down
    dv: Vector3<f32>,
}

impl PerspectiveCamera {
    /// Construct new camera
    ///
    /// # Arguments
    ///
    /// * `position` - Position of the camera in world coordinates
    /// * `direction` - Looking direction of the camera
    ///
    /// # Notes
    ///
    /// The up direction is assumed to be the positive y axis.
    /// Default fov is 60 degrees, default aspect ratio is 1.
    pub fn new(position: Point3<f32>, direction: Vector3<f32>) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera {
            position,
            up: Vector3::y(),
            right: Vector3::x(),
            direction: direction.normalize(),
            aspect: 1.0,
            fov_y: 60.0,
            img_plane_size: vector![0.0, 0.0],
            dir_00: Vector3::zeros(),
            du: Vector3::zeros(),
            dv: Vector3::zeros(),
        };
        camera.recalc_plane_size();
        camera.recalc_plane();
        camera
    }

    /// Camera at `position` looking at `target`
    pub fn look_at(position: Point3<f32>, target: Point3<f32>) -> PerspectiveCamera {
        PerspectiveCamera::new(position, target - position)
    }

    /// Changes aspect ratio to match `(width, height)` resolution
    pub fn change_aspect_from_resolution(&mut self, width: usize, height: usize) {
        self.change_aspect(width as f32 / height as f32);
    }

    /// Change vertical FoV of camera, in degrees
    pub fn change_fov(&mut self, vertical_fov_deg: f32) {
        self.fov_y = vertical_fov_deg.clamp(1.0, 179.0);
        self.recalc_plane_size();
        self.recalc_dudv();
    }

    pub fn change_aspect(&mut self, aspect_ratio: f32) {
        self.aspect = aspect_ratio;
        self.recalc_plane_size();
        self.recalc_dudv();
    }

    /// Apply rotation matrix to the camera.
    /// This changes both position and direction.
    pub fn change_pos_matrix(&mut self, matrix: Rotation3<f32>) {
        self.position = matrix * self.position;
        self.direction = matrix * self.direction;
        self.recalc_plane();
    }

    fn recalc_plane(&mut self) {
        self.direction = self.direction.normalize();
        let up = Vector3::y();
        // looking straight up or down, pick another reference
        let reference = if self.direction.cross(&up).norm() < 1e-6 {
            Vector3::z()
        } else {
            up
        };
        self.right = self.direction.cross(&reference).normalize();
        self.up = self.right.cross(&self.direction);
        self.recalc_dudv();
    }

    fn recalc_plane_size(&mut self) {
        let height = 2.0 * f32::tan(f32::to_radians(0.5 * self.fov_y));
        self.img_plane_size = vector![height * self.aspect, height];
    }

    fn recalc_dudv(&mut self) {
        self.du = self.img_plane_size.x * self.right;
        self.dv = -self.img_plane_size.y * self.up; // Notice '-' sign
        self.dir_00 = self.direction - 0.5 * self.du - 0.5 * self.dv;
    }

    /// Ray from the camera through `pixel_coord`.
    ///
    /// Coordinates are in `<0;1>x<0;1>`, \[0,0\] being the upper left corner.
    pub fn get_ray(&self, pixel_coord: (f32, f32)) -> Ray {
        let dir = self.dir_00 + self.du * pixel_coord.0 + self.dv * pixel_coord.1;
        Ray::new(self.position, dir.normalize())
    }

    /// Model view matrix, maps world coordinates to camera coordinates
    pub fn world_to_view(&self) -> Matrix4<f32> {
        let target = self.position + self.direction;
        Isometry3::look_at_rh(&self.position, &target, &self.up).to_homogeneous()
    }

    /// Inverse of [`world_to_view`](PerspectiveCamera::world_to_view)
    pub fn view_to_world(&self) -> Matrix4<f32> {
        let target = self.position + self.direction;
        Isometry3::look_at_rh(&self.position, &target, &self.up)
            .inverse()
            .to_homogeneous()
    }

    pub fn get_pos(&self) -> Point3<f32> {
        self.position
    }
}
