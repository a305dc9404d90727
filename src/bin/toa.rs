use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use toa_convert::{convert_scene, EarthSunDistanceModel, ToaConfig, ToaRequest};

/// Convert high-resolution imagery from DNs to top-of-atmosphere radiance and reflectance
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert WorldView-2/3, QuickBird-2 and GeoEye-1 imagery to TOA radiance and reflectance",
    after_help = "Example:\n  toa -f DATA/21OCT27114157-M1BS-014586809010_01_P013.NTF \\\n      -i DATA/21OCT27114157-M1BS-014586809010_01_P013.IMD \\\n      -x DATA/21OCT27114157-M1BS-014586809010_01_P013.XML"
)]
struct Args {
    /// Input image (NITF/NTF or GeoTIFF)
    #[arg(short = 'f', long = "image")]
    image: PathBuf,

    /// IMD metadata file
    #[arg(short = 'i', long = "imd")]
    imd: PathBuf,

    /// XML metadata file
    #[arg(short = 'x', long = "xml")]
    xml: PathBuf,

    /// Use the corrected Earth-Sun distance formula instead of the reference one
    #[arg(long)]
    corrected_geometry: bool,

    /// Fail instead of deleting existing output files
    #[arg(long)]
    no_overwrite: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = ToaConfig {
        earth_sun_model: if args.corrected_geometry {
            EarthSunDistanceModel::Corrected
        } else {
            EarthSunDistanceModel::Reference
        },
        overwrite_existing: !args.no_overwrite,
        ..ToaConfig::default()
    };
    let request = ToaRequest {
        image: args.image.clone(),
        imd: args.imd.clone(),
        xml: args.xml.clone(),
    };

    let outputs = convert_scene(&request, &config)
        .with_context(|| format!("TOA conversion of {} failed", args.image.display()))?;

    println!("  TOA radiances:    {}", outputs.radiance_path.display());
    println!("  TOA reflectances: {}", outputs.reflectance_path.display());
    println!(
        "  {} band(s), {} pixels, Earth-Sun distance {:.6} AU, solar zenith {:.3} deg",
        outputs.summary.bands.len(),
        outputs.summary.total_pixels(),
        outputs.geometry.earth_sun_distance,
        outputs.geometry.solar_zenith_angle
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    log::info!("Beginning conversion to top-of-atmosphere reflectance");
    log::info!("  image: {}", args.image.display());
    log::info!("  IMD:   {}", args.imd.display());
    log::info!("  XML:   {}", args.xml.display());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("ERROR (fatal): {:#}", e);
            ExitCode::FAILURE
        }
    }
}
