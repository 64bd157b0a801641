use nalgebra::{Matrix4, Point2, Point3, Vector3, Vector4};

//=================================
// Transform Matrix Factory
//=================================

/// Builds the handful of matrices the viewer needs.
///
/// All matrices use the column-vector convention (`clip = P * V * M * p`)
/// and a right-handed world where the camera looks down -Z.
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Rotation around the Y (up) axis.
    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        let (s, c) = angle_rad.sin_cos();
        Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
           -s,   0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn translation(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, offset.x,
            0.0, 1.0, 0.0, offset.y,
            0.0, 0.0, 1.0, offset.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Component-wise scale. Zero and negative factors are passed through.
    pub fn scaling_nonuniform(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            scale.x, 0.0,     0.0,     0.0,
            0.0,     scale.y, 0.0,     0.0,
            0.0,     0.0,     scale.z, 0.0,
            0.0,     0.0,     0.0,     1.0,
        )
    }

    /// Look-at view matrix mapping world space into camera space.
    pub fn look_at(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        let back = (eye - target).normalize();
        let side = up.cross(&back).normalize();
        let cam_up = back.cross(&side);

        Matrix4::new(
            side.x,   side.y,   side.z,   -side.dot(&eye.coords),
            cam_up.x, cam_up.y, cam_up.z, -cam_up.dot(&eye.coords),
            back.x,   back.y,   back.z,   -back.dot(&eye.coords),
            0.0,      0.0,      0.0,      1.0,
        )
    }

    /// OpenGL-style perspective projection mapping the view frustum to NDC [-1, 1]^3.
    ///
    /// The aspect ratio is used as given; callers own its validity.
    pub fn perspective(fov_y_rad: f32, aspect_ratio: f32, near: f32, far: f32) -> Matrix4<f32> {
        let f = 1.0 / (fov_y_rad * 0.5).tan();
        let range_inv = 1.0 / (near - far);

        Matrix4::new(
            f / aspect_ratio, 0.0, 0.0,                     0.0,
            0.0,              f,   0.0,                     0.0,
            0.0,              0.0, (far + near) * range_inv, 2.0 * far * near * range_inv,
            0.0,              0.0, -1.0,                    0.0,
        )
    }
}

/// Clip space -> NDC. Returns `None` for points on the w = 0 plane.
#[inline]
pub fn perspective_divide(clip: &Vector4<f32>) -> Option<Point3<f32>> {
    if clip.w.abs() <= 1e-6 {
        return None;
    }
    let inv_w = 1.0 / clip.w;
    Some(Point3::new(clip.x * inv_w, clip.y * inv_w, clip.z * inv_w))
}

/// Viewport transform. NDC +Y is up, screen +Y is down.
#[inline]
pub fn ndc_to_screen(ndc: &Point3<f32>, width: f32, height: f32) -> Point2<f32> {
    Point2::new(
        (ndc.x + 1.0) * 0.5 * width,
        (1.0 - ndc.y) * 0.5 * height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    fn assert_close(a: &Matrix4<f32>, b: &Matrix4<f32>) {
        assert!((a - b).amax() < 1e-5, "\n{a}\n!=\n{b}");
    }

    #[test]
    fn rotation_y_matches_axis_angle() {
        for angle in [0.0, 0.3, FRAC_PI_4, -2.0] {
            let expected = Matrix4::new_rotation(Vector3::y() * angle);
            assert_close(&TransformFactory::rotation_y(angle), &expected);
        }
    }

    #[test]
    fn translation_and_scale_match_nalgebra() {
        let t = Vector3::new(1.0, -2.0, 0.5);
        let s = Vector3::new(2.0, 0.0, -1.0);
        assert_close(&TransformFactory::translation(&t), &Matrix4::new_translation(&t));
        assert_close(
            &TransformFactory::scaling_nonuniform(&s),
            &Matrix4::new_nonuniform_scaling(&s),
        );
    }

    #[test]
    fn look_at_matches_right_handed_view() {
        let eye = Point3::new(1.0, 2.0, 3.0);
        let target = Point3::new(0.0, 0.5, -1.0);
        let up = Vector3::y();
        assert_close(
            &TransformFactory::look_at(&eye, &target, &up),
            &Matrix4::look_at_rh(&eye, &target, &up),
        );
    }

    #[test]
    fn perspective_matches_opengl_projection() {
        let aspect = 16.0 / 9.0;
        let fov = 45.0_f32.to_radians();
        assert_close(
            &TransformFactory::perspective(fov, aspect, 0.01, 100.0),
            &Matrix4::new_perspective(aspect, fov, 0.01, 100.0),
        );
    }

    #[test]
    fn perspective_divide_rejects_zero_w() {
        assert!(perspective_divide(&Vector4::new(1.0, 1.0, 1.0, 0.0)).is_none());
        let p = perspective_divide(&Vector4::new(2.0, 4.0, -2.0, 2.0)).unwrap();
        assert_eq!(p, Point3::new(1.0, 2.0, -1.0));
    }

    #[test]
    fn ndc_corners_map_to_screen_corners() {
        let top_left = ndc_to_screen(&Point3::new(-1.0, 1.0, 0.0), 800.0, 600.0);
        let bottom_right = ndc_to_screen(&Point3::new(1.0, -1.0, 0.0), 800.0, 600.0);
        assert_eq!(top_left, Point2::new(0.0, 0.0));
        assert_eq!(bottom_right, Point2::new(800.0, 600.0));
    }
}
