use groundmark::{Localizer, LocalizerConfig, ModeSettings, VisualizationMode};

#[cfg(feature = "tracing")]
use groundmark::core::init_tracing;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    init_tracing(log::LevelFilter::Info, false);

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: localize_frame <image_path> [device_id]");
        return Ok(());
    };
    let device: u8 = match std::env::args().nth(2) {
        Some(id) => id.parse()?,
        None => 2,
    };

    let img = image::open(&path)?;
    let mut localizer = Localizer::new(LocalizerConfig::default())?;
    localizer.set_mode(ModeSettings {
        visualization: VisualizationMode::Rgb,
        show_contours: true,
        ..ModeSettings::default()
    });

    let report = localizer.localize_image(&img, device);
    for color in groundmark::MarkerColor::ALL {
        println!("{color}: {} corners", report.corners.get(color).len());
    }
    match (report.pose, report.error) {
        (Some(pose), _) => println!(
            "pose: x={:.3} y={:.3} height={:.3} yaw={:.1} deg",
            pose.x,
            pose.y,
            pose.height,
            pose.yaw_degrees()
        ),
        (None, err) => println!("no pose: {}", err.unwrap_or_default()),
    }

    if let Some(vis) = localizer.visualization() {
        vis.save("localize_frame_debug.png")?;
        println!("wrote localize_frame_debug.png");
    }
    Ok(())
}
