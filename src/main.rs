use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use mapsolid::api::{OverpassResponse, fetch_features};
use mapsolid::config::{BaseShape, FileConfig, GenerationOptions, GroundLevel, LayerColors};
use mapsolid::generator::{MapFragments, MapGenerator, OsmMeshGenerator};
use mapsolid::geometry::ElevationGrid;
use mapsolid::mesh::stl::estimate_stl_size;
use mapsolid::mesh::{Mesh, remove_invalid, validate_mesh, write_stl};
use mapsolid::osm::{load_response, parse_features};

/// Generate watertight, 3D-printable map models from OpenStreetMap data
///
/// Examples:
///   # Model 500 m around a point, fetched from Overpass
///   mapsolid --lat 47.3769 --lon 8.5417 -r 500
///
///   # Offline, with terrain and a single merged STL
///   mapsolid --input zurich.json --elevation zurich-dem.json --merged
///
///   # Round coaster with flat 2D relief
///   mapsolid --lat 40.7484 --lon -73.9857 -r 300 --base-shape circular --flat
///
///   # Use a config file
///   mapsolid --config my-settings.toml
#[derive(Parser, Debug)]
#[command(name = "mapsolid")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches mapsolid.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Latitude of the model center (use with --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the model center (use with --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Half extent of the model in meters [default: 500]
    #[arg(short = 'r', long)]
    radius: Option<f64>,

    /// Read features from a saved Overpass JSON file instead of the network
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Save the fetched Overpass response for later offline runs
    #[arg(long, conflicts_with = "input")]
    save_osm: Option<PathBuf>,

    /// Elevation grid JSON file ({"size", "radius", "samples"})
    #[arg(short = 'e', long)]
    elevation: Option<PathBuf>,

    /// Ignore elevation data and build flat terrain
    #[arg(long)]
    no_elevation: bool,

    /// Detail level 1-150 [default: 100]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=150))]
    resolution: Option<u32>,

    /// Outline of the model [default: square]
    #[arg(long, value_enum)]
    base_shape: Option<BaseShape>,

    /// Foundation slab thickness in meters [default: 2]
    #[arg(long)]
    base_thickness: Option<f64>,

    /// Flat 2D relief instead of full building heights
    #[arg(long)]
    flat: bool,

    /// Elevation treated as zero: lowest, raw or a value in meters [default: lowest]
    #[arg(long, allow_hyphen_values = true)]
    ground_level: Option<GroundLevel>,

    /// Depth of carved water in meters [default: 2]
    #[arg(long)]
    water_depth: Option<f64>,

    /// Vertical offset added to every building in meters [default: 0]
    #[arg(long, allow_hyphen_values = true)]
    building_offset: Option<f64>,

    /// Solid road depth in meters, 0 for flat ribbons [default: 0]
    #[arg(long)]
    road_thickness: Option<f64>,

    /// Directory for the STL files [default: current directory]
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Also write all layers combined into model.stl
    #[arg(long)]
    merged: bool,

    /// Uniform factor applied on export, e.g. 0.001 for a 1:1000 print in meters [default: 1]
    #[arg(long)]
    scale: Option<f64>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = match args.config {
        Some(ref config_path) => {
            if !config_path.exists() {
                bail!("Config file not found: {:?}", config_path);
            }
            FileConfig::from_path(config_path)?
        }
        None => FileConfig::load().unwrap_or_default(),
    };

    let verbose = args.verbose || file_config.verbose;
    env_logger::Builder::from_default_env()
        .filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .init();

    let input = args.input.clone();
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| file_config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let merged = args.merged || file_config.merged.unwrap_or(false);
    let scale = args.scale.or(file_config.export_scale).unwrap_or(1.0);
    let overpass_config = file_config.overpass.clone().unwrap_or_default();

    println!("mapsolid - Printable Map Model Generator");
    println!("========================================");
    println!();

    let response = match input {
        Some(ref path) => {
            let spinner = create_spinner("Loading OpenStreetMap data...");
            let start = Instant::now();
            let response = load_response(path)
                .with_context(|| format!("Failed to load input file: {}", path.display()))?;
            spinner.finish_with_message(format!(
                "Loaded {} elements from {} [{:.1}s]",
                response.elements.len(),
                path.display(),
                start.elapsed().as_secs_f32()
            ));
            Some(response)
        }
        None => None,
    };

    let lat = args.lat.or(file_config.lat);
    let lon = args.lon.or(file_config.lon);
    let center = match (lat, lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => match response.as_ref().and_then(response_center) {
            Some(center) => {
                info!("Centering on input data at ({:.5}, {:.5})", center.0, center.1);
                center
            }
            None => bail!("Must provide --lat and --lon, or an --input file with nodes"),
        },
    };

    let options = build_options(&args, &file_config, center);
    if options.radius.is_nan() || options.radius <= 0.0 {
        bail!("Radius must be positive, got {}", options.radius);
    }

    debug!("{:#?}", options);
    debug!("Overpass mirrors: {}", overpass_config.urls.len());

    let response = match response {
        Some(response) => response,
        None => {
            let spinner = create_spinner("Fetching features from OpenStreetMap...");
            let start = Instant::now();
            let response = fetch_features(center, options.radius, &overpass_config)
                .context("Failed to fetch features from Overpass API")?;
            spinner.finish_with_message(format!(
                "Fetched {} elements [{:.1}s]",
                response.elements.len(),
                start.elapsed().as_secs_f32()
            ));
            if let Some(ref path) = args.save_osm {
                save_response(path, &response)?;
                info!("Saved Overpass response to {}", path.display());
            }
            response
        }
    };

    let features = parse_features(&response);
    println!("Parsed {} features", features.len());
    if features.is_empty() {
        warn!("No features in the selected area, the model will only contain terrain");
    }

    let elevation = match args.elevation {
        Some(ref path) if !args.no_elevation => Some(load_elevation(path, options.radius)?),
        _ => None,
    };

    let spinner = create_spinner("Generating mesh layers...");
    let start = Instant::now();
    let fragments = OsmMeshGenerator.generate(&features, elevation.as_ref(), &options);
    spinner.finish_with_message(format!(
        "Generated {} triangles [{:.1}s]",
        fragments.triangle_count(),
        start.elapsed().as_secs_f32()
    ));

    let spinner = create_spinner("Validating and writing STL files...");
    let start = Instant::now();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    let written = export_fragments(&fragments, &output_dir, scale, merged, &options.colors)?;
    spinner.finish_with_message(format!(
        "Wrote {} files [{:.1}s]",
        written.len(),
        start.elapsed().as_secs_f32()
    ));

    println!();
    println!("Done! Total time: {:.1}s", total_start.elapsed().as_secs_f32());
    println!();
    print_summary(&fragments, &written);

    Ok(())
}

/// Merge CLI flags over file settings over defaults
fn build_options(args: &Args, file: &FileConfig, center: (f64, f64)) -> GenerationOptions {
    let defaults = GenerationOptions::default();
    GenerationOptions {
        center,
        radius: args.radius.or(file.radius).unwrap_or(defaults.radius),
        base_shape: args.base_shape.or(file.base_shape).unwrap_or(defaults.base_shape),
        base_thickness: args
            .base_thickness
            .or(file.base_thickness)
            .unwrap_or(defaults.base_thickness),
        resolution: args
            .resolution
            .or(file.resolution)
            .unwrap_or(defaults.resolution)
            .clamp(1, 150),
        is_3d: !(args.flat || file.flat.unwrap_or(false)),
        ground_level: args
            .ground_level
            .or(file.ground_level)
            .unwrap_or(defaults.ground_level),
        elevation_enabled: !args.no_elevation && file.elevation.unwrap_or(true),
        water_depth: args.water_depth.or(file.water_depth).unwrap_or(defaults.water_depth),
        building_offset: args
            .building_offset
            .or(file.building_offset)
            .unwrap_or(defaults.building_offset),
        road_thickness: args
            .road_thickness
            .or(file.road_thickness)
            .unwrap_or(defaults.road_thickness),
        colors: file.colors.clone().unwrap_or_default(),
    }
}

/// Midpoint of the bounding box of all nodes in a response
fn response_center(response: &OverpassResponse) -> Option<(f64, f64)> {
    let coords = response.elements.iter().filter_map(|e| Some((e.lat?, e.lon?)));
    let (min_lat, max_lat, min_lon, max_lon) = coords.fold(
        (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
        |(a, b, c, d), (lat, lon)| (a.min(lat), b.max(lat), c.min(lon), d.max(lon)),
    );
    (min_lat <= max_lat).then(|| ((min_lat + max_lat) / 2.0, (min_lon + max_lon) / 2.0))
}

fn save_response(path: &Path, response: &OverpassResponse) -> Result<()> {
    let json = serde_json::to_string(response).context("Failed to encode Overpass response")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn load_elevation(path: &Path, radius: f64) -> Result<ElevationGrid> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read elevation file: {}", path.display()))?;
    let grid: ElevationGrid = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse elevation file: {}", path.display()))?;

    if (grid.radius() - radius).abs() > 1e-6 {
        warn!(
            "Elevation grid spans ±{} m but the model radius is {} m",
            grid.radius(),
            radius
        );
    }
    info!(
        "Loaded {}x{} elevation grid ({:.1}..{:.1} m)",
        grid.size(),
        grid.size(),
        grid.min_sample(),
        grid.max_sample()
    );
    Ok(grid)
}

/// Write one STL per non-empty layer, optionally the merged model, and a
/// colors.json manifest for multi-material slicing
fn export_fragments(
    fragments: &MapFragments,
    output_dir: &Path,
    scale: f64,
    merged: bool,
    colors: &LayerColors,
) -> Result<Vec<(PathBuf, usize)>> {
    let mut written = Vec::new();
    let mut manifest = BTreeMap::new();

    for (name, mesh) in fragments.layers() {
        if mesh.is_empty() {
            continue;
        }
        let file_name = format!("{name}.stl");
        let path = output_dir.join(&file_name);
        let triangles = export_mesh(&path, name, mesh.clone(), scale)?;
        manifest.insert(file_name, layer_color(name, colors).to_string());
        written.push((path, triangles));
    }

    if merged {
        let path = output_dir.join("model.stl");
        let triangles = export_mesh(&path, "model", fragments.merged(), scale)?;
        written.push((path, triangles));
    }

    let manifest_path = output_dir.join("colors.json");
    let json = serde_json::to_string_pretty(&manifest).context("Failed to encode color manifest")?;
    fs::write(&manifest_path, json)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    Ok(written)
}

fn export_mesh(path: &Path, name: &str, mesh: Mesh, scale: f64) -> Result<usize> {
    let report = validate_mesh(&mesh);
    if !report.is_valid() {
        warn!("{}: dropping unexportable triangles ({})", name, report.summary());
    } else if report.open_edges > 0 {
        debug!("{}: {}", name, report.summary());
    }

    let mesh = remove_invalid(mesh);
    write_stl(path, &mesh, scale).with_context(|| format!("Failed to write {} layer", name))?;
    Ok(mesh.len())
}

fn layer_color<'a>(name: &str, colors: &'a LayerColors) -> &'a str {
    match name {
        "water" => &colors.water,
        "buildings" => &colors.building,
        "roads" => &colors.road,
        _ => &colors.base,
    }
}

fn print_summary(fragments: &MapFragments, written: &[(PathBuf, usize)]) {
    let stats = &fragments.stats;

    println!("Model contents:");
    println!("  Buildings:  {} ({} parts)", stats.buildings, stats.building_parts);
    println!("  Roads:      {}", stats.roads);
    println!("  Water:      {} bodies, {} waterways", stats.water_bodies, stats.waterways);
    println!(
        "  Terrain:    {}",
        if stats.elevation_used { "elevation grid" } else { "flat" }
    );
    if stats.buildings_replaced_by_parts + stats.buildings_lod_skipped + stats.roads_lod_skipped > 0 {
        println!(
            "  Skipped:    {} buildings covered by parts, {} small buildings, {} narrow roads",
            stats.buildings_replaced_by_parts, stats.buildings_lod_skipped, stats.roads_lod_skipped
        );
    }
    println!();
    println!("Output:");
    for (path, triangles) in written {
        println!(
            "  {} ({} triangles, {:.1} KB)",
            path.display(),
            triangles,
            estimate_stl_size(*triangles) as f64 / 1024.0
        );
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
