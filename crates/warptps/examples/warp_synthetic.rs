use std::time::Instant;

use argh::FromArgs;
use warptps::{
    morph_sequence, Image, ImageSize, ModelCache, Point2d, TpsTransform, TransformConfig,
};

/// Warps a synthetic checkerboard through a thin-plate spline
#[derive(Debug, FromArgs)]
struct Args {
    /// image width in pixels
    #[argh(option, default = "640")]
    width: usize,

    /// image height in pixels
    #[argh(option, default = "480")]
    height: usize,

    /// checkerboard cell size in pixels
    #[argh(option, short = 'c', default = "32")]
    cell: usize,

    /// optional JSON file with a transform configuration
    #[argh(option)]
    config: Option<String>,

    /// number of in-between frames for the morph demo
    #[argh(option, short = 'n', default = "4")]
    frames: usize,
}

fn checkerboard(size: ImageSize, cell: usize) -> Result<Image<u8, 3>, Box<dyn std::error::Error>> {
    let cell = cell.max(1);
    let mut data = Vec::with_capacity(size.area() * 3);
    for y in 0..size.height {
        for x in 0..size.width {
            let v = if (x / cell + y / cell) % 2 == 0 { 230 } else { 25 };
            data.extend_from_slice(&[v, v / 2, 255 - v]);
        }
    }
    Ok(Image::new(size, data)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => TransformConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => TransformConfig::default(),
    };

    log::info!("{}", warptps::version());

    let size = ImageSize {
        width: args.width,
        height: args.height,
    };
    let image = checkerboard(size, args.cell)?;

    let (w, h) = (args.width as f64, args.height as f64);
    let mut transform = TpsTransform::new(config.clone());
    transform.add_landmark([0.0, 0.0], [0.0, 0.0]);
    transform.add_landmark([w - 1.0, 0.0], [w - 1.0, 0.0]);
    transform.add_landmark([0.0, h - 1.0], [0.0, h - 1.0]);
    transform.add_landmark([w - 1.0, h - 1.0], [w - 1.0, h - 1.0]);
    transform.add_landmark([0.5 * w, 0.5 * h], [0.55 * w, 0.45 * h]);
    transform.add_landmark([0.25 * w, 0.5 * h], [0.2 * w, 0.55 * h]);

    let mut cache = ModelCache::default();
    for percent in [0.25, 0.5, 1.0] {
        let now = Instant::now();
        let model = cache.get_or_fit(transform.landmarks(), config.regularization)?;
        let params = config.warp_params().with_percent(percent);
        let warped = model.warp(&image, &params)?;
        log::info!(
            "percent {percent}: warped {}x{} in {:?}",
            warped.width(),
            warped.height(),
            now.elapsed()
        );

        let centre = model.evaluate(Point2d::new(0.5 * w, 0.5 * h), percent)?;
        log::info!("centre maps to ({:.2}, {:.2})", centre.x, centre.y);
    }

    let sources = transform.landmarks().source_points();
    let destinations = transform.landmarks().destination_points();
    let now = Instant::now();
    let frames = morph_sequence(&image, &image, &sources, &destinations, args.frames, &config)?;
    log::info!("morphed {} frames in {:?}", frames.len(), now.elapsed());

    Ok(())
}
