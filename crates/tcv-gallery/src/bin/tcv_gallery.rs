use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use image::RgbImage;
use serde::Serialize;
use tensorcv::{
    gaussian_blur, warp_perspective, BorderMode, GaussianBlurConfig, InterpMode, Mat3,
    RayonDispatcher, TensorRef, TensorRefMut, TensorView, TensorViewMut, WarpConfig,
};

#[derive(Parser, Debug)]
#[command(name = "tcv_gallery")]
#[command(about = "Run tensorcv transform kernels on external images")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "blur")]
    Blur(BlurArgs),
    #[command(name = "warp")]
    Warp(WarpArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, required = true)]
    output: PathBuf,
    #[arg(long)]
    meta: Option<PathBuf>,
    #[arg(long, default_value = "reflect101")]
    border: String,
    #[arg(long, default_value_t = 0.0)]
    border_value: f32,
}

#[derive(Args, Debug, Clone)]
struct BlurArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = 5)]
    ksize: usize,
    #[arg(long, default_value_t = 0.0)]
    sigma: f64,
}

#[derive(Args, Debug, Clone)]
struct WarpArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = 0.0)]
    angle: f64,
    #[arg(long, default_value_t = 1.0)]
    scale: f64,
    #[arg(long, default_value = "linear")]
    interp: String,
}

#[derive(Debug, Clone, Serialize)]
struct RunMeta {
    case: String,
    width: usize,
    height: usize,
    channels: usize,
    elapsed_ms: f64,
}

fn parse_border(name: &str) -> Result<BorderMode> {
    Ok(match name {
        "constant" => BorderMode::Constant,
        "replicate" => BorderMode::Replicate,
        "reflect" => BorderMode::Reflect,
        "reflect101" => BorderMode::Reflect101,
        "wrap" => BorderMode::Wrap,
        "transparent" => BorderMode::Transparent,
        other => bail!("unknown border mode: {other}"),
    })
}

fn parse_interp(name: &str) -> Result<InterpMode> {
    Ok(match name {
        "nearest" => InterpMode::Nearest,
        "linear" => InterpMode::Linear,
        other => bail!("unknown interpolation mode: {other}"),
    })
}

fn load_rgb(path: &PathBuf) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to read {}", path.display()))?
        .to_rgb8();
    Ok(img)
}

fn write_meta(path: &Option<PathBuf>, meta: &RunMeta) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let payload = serde_json::to_string_pretty(meta).context("serialize run metadata")?;
    fs::write(path, payload).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn run_blur(args: &BlurArgs) -> Result<RunMeta> {
    let img = load_rgb(&args.common.input)?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    let raw = img.into_raw();

    let src = TensorView::from_slice(1, h, w, 3, &raw).context("build source view")?;
    let mut out = vec![0u8; raw.len()];
    let mut dst = TensorRefMut::U8(
        TensorViewMut::from_slice_mut(1, h, w, 3, &mut out).context("build destination view")?,
    );

    let cfg = GaussianBlurConfig {
        kernel_height: args.ksize,
        kernel_width: args.ksize,
        sigma_x: args.sigma,
        sigma_y: args.sigma,
        border_mode: parse_border(&args.common.border)?,
        border_value: args.common.border_value,
    };

    let start = Instant::now();
    gaussian_blur(&TensorRef::U8(src), &mut dst, &cfg, &RayonDispatcher).context("blur")?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;

    let out_img = RgbImage::from_raw(w as u32, h as u32, out)
        .context("assemble output image")?;
    out_img
        .save(&args.common.output)
        .with_context(|| format!("failed to write {}", args.common.output.display()))?;

    Ok(RunMeta {
        case: "blur".to_string(),
        width: w,
        height: h,
        channels: 3,
        elapsed_ms,
    })
}

fn run_warp(args: &WarpArgs) -> Result<RunMeta> {
    let img = load_rgb(&args.common.input)?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    let raw = img.into_raw();

    let src = TensorView::from_slice(1, h, w, 3, &raw).context("build source view")?;
    let mut out = vec![0u8; raw.len()];
    let mut dst = TensorRefMut::U8(
        TensorViewMut::from_slice_mut(1, h, w, 3, &mut out).context("build destination view")?,
    );

    // The engine inverse-maps destination coordinates, so hand it the
    // inverse of the requested forward motion.
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let forward = Mat3::rotation_deg(args.angle, cx, cy).mul(&Mat3::from_rows([
        args.scale, 0.0, (1.0 - args.scale) * cx, //
        0.0, args.scale, (1.0 - args.scale) * cy, //
        0.0, 0.0, 1.0,
    ]));
    let Some(inverse) = forward.invert() else {
        bail!("requested transform is singular");
    };

    let cfg = WarpConfig {
        interp: parse_interp(&args.interp)?,
        border: parse_border(&args.common.border)?,
        border_value: args.common.border_value,
        ..WarpConfig::default()
    };

    let start = Instant::now();
    warp_perspective(&TensorRef::U8(src), &[inverse], &mut dst, &cfg, &RayonDispatcher)
        .context("warp")?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;

    let out_img = RgbImage::from_raw(w as u32, h as u32, out)
        .context("assemble output image")?;
    out_img
        .save(&args.common.output)
        .with_context(|| format!("failed to write {}", args.common.output.display()))?;

    Ok(RunMeta {
        case: "warp".to_string(),
        width: w,
        height: h,
        channels: 3,
        elapsed_ms,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (meta_path, meta) = match &cli.cmd {
        Command::Blur(args) => (args.common.meta.clone(), run_blur(args)?),
        Command::Warp(args) => (args.common.meta.clone(), run_warp(args)?),
    };
    write_meta(&meta_path, &meta)?;
    println!(
        "{}: {}x{}x{} in {:.2} ms",
        meta.case, meta.width, meta.height, meta.channels, meta.elapsed_ms
    );
    Ok(())
}
