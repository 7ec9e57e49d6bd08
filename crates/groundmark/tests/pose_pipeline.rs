use approx::assert_relative_eq;
use groundmark::board::VertexId;
use groundmark::pose::{estimate_pose, IdentifiedCorner};
use groundmark::{CameraModel, LocalizeError, MarkerColor, PoseFilters, PoseParams};
use nalgebra::{Point2, Rotation2, Vector2};

fn camera() -> CameraModel {
    CameraModel {
        focal_length: 0.0067,
        pixel_size: 0.000_007_5,
        center: Point2::new(300, 200),
    }
}

/// Pixel at which `world` appears for a camera at `position`, `height`, `yaw`.
fn project(cam: &CameraModel, world: Point2<f64>, position: Point2<f64>, yaw: f64, height: f64) -> Point2<i32> {
    let sensor: Vector2<f64> =
        Rotation2::new(-yaw) * (position - world) * (cam.focal_length / height);
    Point2::new(
        (cam.center.x as f64 - sensor.x / cam.pixel_size).round() as i32,
        (cam.center.y as f64 + sensor.y / cam.pixel_size).round() as i32,
    )
}

/// Four corners of a 0.2 m square centered on the origin.
fn square_view(position: Point2<f64>, yaw: f64, height: f64) -> Vec<IdentifiedCorner> {
    let cam = camera();
    [
        (MarkerColor::Blue, 1, (-0.1, 0.1)),
        (MarkerColor::Blue, 5, (-0.1, -0.1)),
        (MarkerColor::Black, 2, (0.1, 0.1)),
        (MarkerColor::Black, 6, (0.1, -0.1)),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (color, id, (x, y)))| {
        let world = Point2::new(x, y);
        IdentifiedCorner {
            color,
            index: i % 2,
            id: VertexId::new(id).unwrap(),
            pixel: project(&cam, world, position, yaw, height),
            world,
        }
    })
    .collect()
}

#[test]
fn camera_above_the_centroid() {
    let corners = square_view(Point2::origin(), 0.3, 1.0);
    let est = estimate_pose(&corners, &camera(), &PoseParams::default(), 20.0, None).unwrap();
    let pose = est.pose;
    assert!((pose.yaw - 0.3).abs() < 1f64.to_radians(), "yaw {}", pose.yaw_degrees());
    assert!(pose.x.abs() < 0.05 && pose.y.abs() < 0.05, "{pose:?}");
    assert_relative_eq!(pose.height, 1.0, epsilon = 0.01);
    assert_eq!(est.pose, est.unfiltered);
}

#[test]
fn offset_and_turned_camera() {
    let corners = square_view(Point2::new(0.05, -0.02), -2.0, 1.5);
    let mut filters = PoseFilters::default();
    let est = estimate_pose(
        &corners,
        &camera(),
        &PoseParams::default(),
        20.0,
        Some(&mut filters),
    )
    .unwrap();
    let pose = est.pose;
    assert!((pose.yaw + 2.0).abs() < 1f64.to_radians(), "yaw {}", pose.yaw_degrees());
    assert!((pose.x - 0.05).abs() < 0.01 && (pose.y + 0.02).abs() < 0.01, "{pose:?}");
    assert_relative_eq!(pose.height, 1.5, epsilon = 0.02);
    // first sample passes every filter unchanged
    assert_eq!(pose, est.unfiltered);
    assert_eq!(filters.height.last(), Some(pose.height));
}

#[test]
fn filters_hold_a_sudden_jump() {
    let mut filters = PoseFilters::default();
    let params = PoseParams::default();
    let first = estimate_pose(
        &square_view(Point2::origin(), 0.3, 1.0),
        &camera(),
        &params,
        20.0,
        Some(&mut filters),
    )
    .unwrap()
    .pose;
    let second = estimate_pose(
        &square_view(Point2::origin(), 0.3 + 1.0, 1.0),
        &camera(),
        &params,
        20.0,
        Some(&mut filters),
    )
    .unwrap();
    assert_eq!(second.pose.yaw, first.yaw);
    assert!((second.unfiltered.yaw - 1.3).abs() < 1f64.to_radians());
    assert_eq!(filters.yaw.blocked(), 1);
}

#[test]
fn single_color_view_has_no_yaw() {
    let corners: Vec<_> = square_view(Point2::origin(), 0.0, 1.0)
        .into_iter()
        .filter(|c| c.color == MarkerColor::Blue)
        .collect();
    let err = estimate_pose(&corners, &camera(), &PoseParams::default(), 20.0, None).unwrap_err();
    assert_eq!(err, LocalizeError::NoYawSamples);
}

#[test]
fn close_corners_give_no_height() {
    let corners = square_view(Point2::origin(), 0.0, 1.0);
    let err = estimate_pose(&corners, &camera(), &PoseParams::default(), 1000.0, None).unwrap_err();
    assert_eq!(err, LocalizeError::NoHeightSamples);
}
