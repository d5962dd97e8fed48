use std::path::PathBuf;
use std::time::Instant;

use cgmath::InnerSpace;
use clap::Parser;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use fountain_gi::{Float, Options, Point3f, Ray, Spectrum, Vec3f};
use fountain_gi::gi::make_gi_engine;
use fountain_gi::imageio::write_png;
use fountain_gi::photon::PhotonMapRegistry;
use fountain_gi::sampler::SampleContext;
use fountain_gi::sampler::qmc::mix_bits;
use fountain_gi::sampler::random::RandomSampler;
use fountain_gi::scene::{CornellBox, Scene};

/// Render the Cornell box with a global illumination engine.
#[derive(Parser, Debug)]
#[command(name = "render")]
struct Args {
    #[arg(short = 'W', long, default_value_t = 256)]
    width: usize,

    #[arg(short = 'H', long, default_value_t = 256)]
    height: usize,

    /// Camera rays per pixel
    #[arg(short, long, default_value_t = 4)]
    spp: usize,

    #[arg(short, long, default_value = "cornell.png")]
    output: PathBuf,

    /// Worker threads, defaults to one per core
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Render option, e.g. `--set gi.engine=irr-cache`. May be repeated.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

/// Pinhole camera in front of the open side of the box, looking along `+y` with `+z` up.
struct Camera {
    eye: Point3f,
    tan_half_fov: Float,
    aspect: Float,
}

impl Camera {
    fn new(width: usize, height: usize) -> Self {
        Self {
            eye: Point3f::new(0.0, -3.5, 0.0),
            tan_half_fov: Float::tan(0.5 * 36.0_f32.to_radians()),
            aspect: width as Float / height as Float,
        }
    }

    /// `(u, v)` in `[0, 1)²`, `v` running down the image.
    fn generate_ray(&self, u: Float, v: Float) -> Ray {
        let x = (2.0 * u - 1.0) * self.tan_half_fov * self.aspect;
        let z = (1.0 - 2.0 * v) * self.tan_half_fov;
        Ray::new(self.eye, Vec3f::new(x, 1.0, z).normalize())
    }
}

fn render(cornell: &CornellBox, scene: &dyn Scene, args: &Args) -> Vec<Spectrum> {
    let (w, h) = (args.width, args.height);
    let spp = args.spp.max(1);
    let camera = Camera::new(w, h);

    (0..h).into_par_iter()
        .flat_map_iter(|y| (0..w).map(move |x| (x, y)))
        .map(|(x, y)| {
            let pixel = (y * w + x) as u64;
            let mut jitter = RandomSampler::new_with_seed(pixel);
            let sum: Spectrum = (0..spp)
                .map(|s| {
                    let offset = jitter.get_2d();
                    let ray = camera.generate_ray(
                        (x as Float + offset.x) / w as Float,
                        (y as Float + offset.y) / h as Float,
                    );
                    let samples = SampleContext::new(mix_bits(pixel * spp as u64 + s as u64));
                    cornell.trace_primary(ray, samples)
                        .map_or_else(Spectrum::black, |state| scene.evaluate_radiance(&state))
                })
                .sum();
            let l = sum / spp as Float;
            if l.has_nans() {
                tracing::warn!("NaN radiance value for pixel {:?}", (x, y));
            }
            l
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut options = Options::new();
    for assignment in &args.set {
        options.parse_assignment(assignment)?;
    }
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(threads).build_global()?;
    }

    let cornell = CornellBox::new();
    let registry = PhotonMapRegistry::new();

    let start = Instant::now();
    let engine = make_gi_engine(&options, &cornell, &registry)?;
    tracing::info!("Prepared GI in {} ms", start.elapsed().as_millis());

    let max_diffuse_depth: i32 = options.get_or("depths.diffuse", 1)?;
    let gi_scene;
    let scene: &dyn Scene = match &engine {
        Some(engine) => {
            gi_scene = cornell.with_gi(engine.as_ref(), max_diffuse_depth.max(0) as u32);
            &gi_scene
        }
        None => &cornell,
    };

    let start = Instant::now();
    let pixels = render(&cornell, scene, &args);
    tracing::info!("Rendered {}x{} in {} ms", args.width, args.height, start.elapsed().as_millis());
    if let Some(engine) = &engine {
        engine.report_stats();
    }

    write_png(&args.output, &pixels, (args.width, args.height))?;
    tracing::info!("Wrote {}", args.output.display());
    Ok(())
}
