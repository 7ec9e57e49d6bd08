//! Whole-pipeline runs on rendered board frames: segmentation, corner
//! extraction, identification and pose estimation.

use groundmark::board::{color_ids, BoardLayout};
use groundmark::core::FrameView;
use groundmark::{
    DeviceProfile, FrameReport, Localizer, LocalizerConfig, MarkerColor, Pose,
};
use nalgebra::{Point2, Rotation2, Vector2};

const W: usize = 1185;
const H: usize = 667;
const DEVICE: u8 = 11;
/// Screen center of the device profile, used as optical center.
const CENTER: (f64, f64) = (592.0, 333.0);
const FOCAL: f64 = 0.0067;
const PIXEL: f64 = 0.000_007_5;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn localizer() -> Localizer {
    let mut cfg = LocalizerConfig::default();
    cfg.devices
        .insert(DEVICE, DeviceProfile::new(W as u32, H as u32, 0, 0).unwrap());
    Localizer::new(cfg).unwrap()
}

fn paint(color: MarkerColor) -> [u8; 3] {
    match color {
        MarkerColor::Blue => [20, 20, 200],
        MarkerColor::Black => [20, 20, 20],
        MarkerColor::Red => [200, 20, 20],
        MarkerColor::Green => [20, 200, 20],
        MarkerColor::Yellow => [220, 220, 20],
    }
}

/// Camera looking straight down from `position` with heading `yaw`, seeing
/// `scale` pixels per meter of ground.
#[derive(Clone, Copy)]
struct View {
    position: Point2<f64>,
    yaw: f64,
    scale: f64,
}

impl View {
    fn height(&self) -> f64 {
        FOCAL / (PIXEL * self.scale)
    }

    fn to_ground(&self, x: usize, y: usize) -> Point2<f64> {
        let screen = Vector2::new(x as f64 - CENTER.0, CENTER.1 - y as f64) / self.scale;
        self.position + Rotation2::new(self.yaw) * screen
    }

    fn to_pixel(&self, world: Point2<f64>) -> Point2<f64> {
        let v = Rotation2::new(-self.yaw) * (world - self.position) * self.scale;
        Point2::new(CENTER.0 + v.x, CENTER.1 - v.y)
    }

    /// White ground with the four solid colored squares of the default board.
    fn render(&self) -> Vec<u8> {
        let layout = BoardLayout::default();
        let squares: Vec<(MarkerColor, Point2<f64>, Point2<f64>)> = [
            MarkerColor::Blue,
            MarkerColor::Black,
            MarkerColor::Red,
            MarkerColor::Green,
        ]
        .into_iter()
        .map(|color| {
            let pts = color_ids(color).map(|id| layout.world(id));
            let lo = pts.iter().fold(pts[0], |a, p| Point2::new(a.x.min(p.x), a.y.min(p.y)));
            let hi = pts.iter().fold(pts[0], |a, p| Point2::new(a.x.max(p.x), a.y.max(p.y)));
            (color, lo, hi)
        })
        .collect();

        let mut data = vec![255u8; W * H * 3];
        for y in 0..H {
            for x in 0..W {
                let g = self.to_ground(x, y);
                if let Some((color, _, _)) = squares
                    .iter()
                    .find(|(_, lo, hi)| g.x >= lo.x && g.x <= hi.x && g.y >= lo.y && g.y <= hi.y)
                {
                    let i = (y * W + x) * 3;
                    data[i..i + 3].copy_from_slice(&paint(*color));
                }
            }
        }
        data
    }
}

/// Every resolved corner must sit on the projection of its vertex.
fn check_identification(report: &FrameReport, view: &View) -> usize {
    let layout = BoardLayout::default();
    let ids = report.identification.as_ref().expect("identification");
    let mut resolved = 0;
    for (color, index, id) in ids.resolved() {
        assert_eq!(id.color(), color);
        let found = report.corners.get(color)[index].position;
        let expected = view.to_pixel(layout.world(id));
        let dx = found.x as f64 - expected.x;
        let dy = found.y as f64 - expected.y;
        assert!(
            dx.hypot(dy) < 4.0,
            "vertex {id} found at {found:?}, expected near {expected:?}"
        );
        resolved += 1;
    }
    resolved
}

fn check_pose(pose: &Pose, view: &View) {
    assert!(
        (pose.yaw - view.yaw).abs() < 1f64.to_radians(),
        "yaw {} deg",
        pose.yaw_degrees()
    );
    assert!(
        (pose.height - view.height()).abs() < 0.02 * view.height(),
        "height {} expected {}",
        pose.height,
        view.height()
    );
    assert!(
        (pose.x - view.position.x).abs() < 0.03 && (pose.y - view.position.y).abs() < 0.03,
        "position ({}, {}) expected {:?}",
        pose.x,
        pose.y,
        view.position
    );
}

#[test]
fn centered_board_gives_the_camera_pose() {
    init();
    let view = View {
        position: Point2::origin(),
        yaw: 0.0,
        scale: 250.0,
    };
    let data = view.render();
    let frame = FrameView::rgb(W, H, &data).unwrap();
    let mut loc = localizer();

    let report = loc.localize_with_report(&frame, DEVICE);
    assert_eq!(report.error, None);
    for color in MarkerColor::ALL {
        let expected = if color.is_yellow() { 0 } else { 4 };
        assert_eq!(report.corners.get(color).len(), expected, "{color}");
    }
    assert_eq!(check_identification(&report, &view), 16);
    check_pose(&report.pose.unwrap(), &view);
}

#[test]
fn turned_and_offset_camera() {
    init();
    let view = View {
        position: Point2::new(0.1, -0.05),
        yaw: 0.5,
        scale: 180.0,
    };
    let data = view.render();
    let frame = FrameView::rgb(W, H, &data).unwrap();
    let mut loc = localizer();

    let report = loc.localize_with_report(&frame, DEVICE);
    assert_eq!(report.error, None);
    assert!(check_identification(&report, &view) >= 12);
    let pose = report.pose.unwrap();
    check_pose(&pose, &view);
    assert_eq!(loc.localize_flat(&frame, DEVICE), pose.to_array());
}

#[test]
fn height_jump_is_held_until_filters_reset() {
    let near = View {
        position: Point2::origin(),
        yaw: 0.0,
        scale: 250.0,
    };
    let far = View {
        position: Point2::new(0.1, -0.05),
        yaw: 0.5,
        scale: 180.0,
    };
    let near_data = near.render();
    let far_data = far.render();
    let near_frame = FrameView::rgb(W, H, &near_data).unwrap();
    let far_frame = FrameView::rgb(W, H, &far_data).unwrap();
    let mut loc = localizer();

    let first = loc.localize(&near_frame, DEVICE).unwrap();
    let held = loc.localize_with_report(&far_frame, DEVICE);
    assert_eq!(held.pose.map(|p| p.height), Some(first.height));
    let raw = held.unfiltered.unwrap();
    assert!((raw.height - far.height()).abs() < 0.02 * far.height());
    assert_eq!(loc.filters().height.blocked(), 1);

    loc.reset_filters();
    assert_eq!(loc.filters().height.last(), None);
    let pose = loc.localize(&far_frame, DEVICE).unwrap();
    check_pose(&pose, &far);
}
