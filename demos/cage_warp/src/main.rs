use argh::FromArgs;
use glam::DVec2;
use std::path::PathBuf;

use cagewarp::{
    image::{Image, ImageSize},
    imgproc::{
        cage::{cage_warp, CageConfig, CageTransformParams},
        interpolation::InterpolationMode,
        parallel::ExecutionStrategy,
    },
};

#[derive(FromArgs)]
/// Deform an image with a cage and save the result
struct Args {
    /// path to an input image, a checkerboard is generated when omitted
    #[argh(option, short = 'i')]
    image_path: Option<PathBuf>,

    /// path to a JSON cage: {"vertices": [[x, y], ...], "deformed": [[x, y], ...]}
    #[argh(option, short = 'c')]
    cage_path: Option<PathBuf>,

    /// path of the output image
    #[argh(option, short = 'o', default = "PathBuf::from(\"cage_warp.png\")")]
    output_path: PathBuf,

    /// fill the inside of the source cage with a plain color first
    #[argh(switch)]
    plain_fill: bool,

    /// use nearest neighbor sampling instead of bilinear
    #[argh(switch)]
    nearest: bool,

    /// number of threads, the global pool when omitted
    #[argh(option)]
    threads: Option<usize>,
}

fn checkerboard(size: ImageSize, cell: usize) -> Result<Image<f32, 3>, Box<dyn std::error::Error>> {
    Ok(Image::from_fn(size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            [0.9, 0.9, 0.9]
        } else {
            [0.1, 0.3, 0.6]
        }
    })?)
}

fn read_image(path: &PathBuf) -> Result<Image<f32, 3>, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let size = ImageSize {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
    };
    let image = Image::<u8, 3>::new(size, rgb.into_raw())?;
    Ok(image.cast_and_scale::<f32>(1.0 / 255.0)?)
}

fn write_image(path: &PathBuf, image: &Image<f32, 3>) -> Result<(), Box<dyn std::error::Error>> {
    let data = image
        .as_slice()
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect::<Vec<_>>();
    let buf = image::RgbImage::from_raw(image.width() as u32, image.height() as u32, data)
        .ok_or("image buffer does not match its size")?;
    buf.save(path)?;
    Ok(())
}

/// A square cage in the middle of the image with its lower right corner pulled outwards.
fn default_cage(size: ImageSize) -> Result<CageConfig, Box<dyn std::error::Error>> {
    let (w, h) = (size.width as f64, size.height as f64);
    let mut cage = CageConfig::new(vec![
        DVec2::new(0.25 * w, 0.25 * h),
        DVec2::new(0.75 * w, 0.25 * h),
        DVec2::new(0.75 * w, 0.75 * h),
        DVec2::new(0.25 * w, 0.75 * h),
    ])?;
    cage.move_deformed_vertex(2, DVec2::new(0.9 * w, 0.85 * h))?;
    Ok(cage)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    let image = match &args.image_path {
        Some(path) => read_image(path)?,
        None => checkerboard([512, 384].into(), 32)?,
    };
    log::info!("input image: {}", image.size());

    let cage = match &args.cage_path {
        Some(path) => serde_json::from_str::<CageConfig>(&std::fs::read_to_string(path)?)?,
        None => default_cage(image.size())?,
    };
    log::info!(
        "cage with {} vertices, bounding box {}",
        cage.num_vertices(),
        cage.bounding_box()
    );

    let params = CageTransformParams {
        fill_plain_color: args.plain_fill,
        strategy: args
            .threads
            .map_or(ExecutionStrategy::default(), ExecutionStrategy::Fixed),
        ..Default::default()
    };
    let interpolation = if args.nearest {
        InterpolationMode::Nearest
    } else {
        InterpolationMode::Bilinear
    };

    let start = std::time::Instant::now();
    let warped = cage_warp(&image, &cage, &params, interpolation)?;
    log::info!("warped in {:?}", start.elapsed());

    write_image(&args.output_path, &warped)?;
    log::info!("saved {}", args.output_path.display());

    Ok(())
}
