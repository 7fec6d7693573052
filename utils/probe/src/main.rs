use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use config::{Config, ConfigType};
use misc::*;
use terrain::{Capsule, MemoryGeometrySource, QueryEngine, Standable};

/// Runs a single terrain query against a triangle dump
#[derive(Debug, StructOpt)]
#[structopt(rename_all = "kebab-case", global_settings = &[AppSettings::AllowNegativeNumbers])]
struct Args {
    /// Ron list of triangles
    #[structopt(long, parse(from_os_str))]
    triangles: PathBuf,

    /// Ron config file, defaults are used if not given
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Actor height
    #[structopt(long, default_value = "2.0")]
    height: f32,

    /// Actor radius
    #[structopt(long, default_value = "0.5")]
    radius: f32,

    #[structopt(subcommand)]
    query: Query,
}

#[derive(Debug, StructOpt)]
#[structopt(rename_all = "kebab-case")]
enum Query {
    /// Highest standable ground in a vertical range
    Standable {
        x: f32,
        y: f32,
        min_z: f32,
        max_z: f32,
    },

    /// Whether a single step is blocked
    Step {
        x0: f32,
        y0: f32,
        z0: f32,
        x1: f32,
        y1: f32,
        z1: f32,
    },

    Water {
        x: f32,
        y: f32,
        min_z: f32,
        max_z: f32,
    },

    /// Terrain unevenness around a point
    Gradient { x: f32, y: f32, z: f32, range: f32 },

    /// Whether an object or model is close to the body
    Model { x: f32, y: f32, z: f32, range: f32 },

    /// Whether two points can see each other
    Los {
        ax: f32,
        ay: f32,
        az: f32,
        bx: f32,
        by: f32,
        bz: f32,
    },
}

fn dont_log_time(_: &mut dyn io::Write) -> io::Result<()> {
    Ok(())
}

fn main() {
    let logger =
        match logging::LoggerBuilder::with_env().and_then(|builder| builder.init(dont_log_time)) {
            Err(e) => {
                eprintln!("failed to setup logging: {:?}", e);
                std::process::exit(1);
            }
            Ok(l) => l,
        };

    info!("initialized logging"; "level" => ?logger.level());

    let args = Args::from_args();
    if let Err(err) = run(args) {
        error!("probe failed: {}", err);
        eprintln!("error: {}", err);
        drop(logger);
        std::process::exit(1);
    }
}

fn run(args: Args) -> BoxedResult<()> {
    let config = match &args.config {
        Some(path) => config::load(ConfigType::File(path))?,
        None => Config::default(),
    };

    let source = MemoryGeometrySource::from_file(&args.triangles)?;
    info!("loaded triangle dump"; "path" => %args.triangles.display(), "triangles" => source.len());

    let engine = QueryEngine::new(Arc::new(source), &config);
    let capsule = Capsule::new(args.height, args.radius);

    match args.query {
        Query::Standable { x, y, min_z, max_z } => {
            match engine.find_standable(x, y, min_z, max_z, capsule)? {
                Standable::Ground { z, flags } => println!("ground at z={} {:?}", z, flags),
                Standable::NearCliff { z, flags } => {
                    println!("near a cliff at z={} {:?}", z, flags)
                }
                Standable::NotFound => println!("not standable"),
            }
        }
        Query::Step {
            x0,
            y0,
            z0,
            x1,
            y1,
            z1,
        } => {
            let blocked = engine.is_step_blocked(vec3(x0, y0, z0), vec3(x1, y1, z1), capsule)?;
            println!("blocked: {}", blocked);
        }
        Query::Water { x, y, min_z, max_z } => {
            println!("in water: {}", engine.is_in_water(x, y, min_z, max_z)?);
        }
        Query::Gradient { x, y, z, range } => {
            println!("gradient: {}", engine.gradient_score(vec3(x, y, z), range)?);
        }
        Query::Model { x, y, z, range } => {
            let close = engine.is_close_to_model(vec3(x, y, z), range)?;
            println!("close to model: {}", close);
        }
        Query::Los {
            ax,
            ay,
            az,
            bx,
            by,
            bz,
        } => {
            let visible = engine.line_of_sight(vec3(ax, ay, az), vec3(bx, by, bz))?;
            println!("line of sight: {}", visible);
        }
    }

    debug!("tiles loaded"; "count" => engine.cache().loaded_count());
    Ok(())
}
