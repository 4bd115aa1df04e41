use clap::{App, Arg, ArgMatches, SubCommand};
use icogen::{
    base_file_name, bundle_file_name, generate_with_config, per_size_file_name,
    CropRegion, IconConfig, IconDir, IconSizeSet, ResampleFilter,
};
use log::info;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

type CliResult = Result<(), Box<dyn Error>>;

//===========================================================================//

fn main() {
    env_logger::init();
    let matches = App::new("icotool")
        .version("0.1")
        .about("Generates and inspects ICO files")
        .subcommand(
            SubCommand::with_name("generate")
                .about("Generates ICO files from an image")
                .arg(
                    Arg::with_name("sizes")
                        .takes_value(true)
                        .value_name("SIZES")
                        .short("s")
                        .long("sizes")
                        .help("Sets icon sizes, e.g. 16,32,48"),
                )
                .arg(
                    Arg::with_name("crop")
                        .takes_value(true)
                        .value_name("X,Y,SIDE")
                        .long("crop")
                        .help("Sets the square crop (default: centered)"),
                )
                .arg(
                    Arg::with_name("filter")
                        .takes_value(true)
                        .value_name("NAME")
                        .long("filter")
                        .possible_values(&[
                            "nearest",
                            "bilinear",
                            "catmullrom",
                            "lanczos3",
                        ])
                        .help("Sets the resampling filter"),
                )
                .arg(
                    Arg::with_name("output")
                        .takes_value(true)
                        .value_name("DIR")
                        .short("o")
                        .long("output")
                        .help("Sets output directory"),
                )
                .arg(Arg::with_name("image").required(true)),
        )
        .subcommand(
            SubCommand::with_name("extract")
                .about("Extracts a PNG payload from an ICO file")
                .arg(
                    Arg::with_name("output")
                        .takes_value(true)
                        .value_name("PATH")
                        .short("o")
                        .long("output")
                        .help("Sets output path"),
                )
                .arg(Arg::with_name("ico").required(true))
                .arg(Arg::with_name("index").required(true)),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("Lists icons in an ICO file")
                .arg(Arg::with_name("ico").required(true)),
        )
        .get_matches();
    let result = if let Some(submatches) = matches.subcommand_matches("generate")
    {
        run_generate(submatches)
    } else if let Some(submatches) = matches.subcommand_matches("extract") {
        run_extract(submatches)
    } else if let Some(submatches) = matches.subcommand_matches("list") {
        run_list(submatches)
    } else {
        eprintln!("{}", matches.usage());
        Ok(())
    };
    if let Err(error) = result {
        eprintln!("icotool: {}", error);
        process::exit(1);
    }
}

//===========================================================================//

fn run_generate(matches: &ArgMatches) -> CliResult {
    let path = matches.value_of("image").unwrap_or_default();
    let bytes = fs::read(path)?;
    let mut config = IconConfig::default();
    if let Some(name) = matches.value_of("filter") {
        config = config.with_filter(name.parse::<ResampleFilter>()?);
    }
    let source = icogen::decode_with_config(&bytes, &config)?;
    println!(
        "Loaded {} ({}x{}, {})",
        path,
        source.width(),
        source.height(),
        format_bytes(bytes.len())
    );
    let crop = match matches.value_of("crop") {
        Some(text) => parse_crop(text)?,
        None => CropRegion::centered(source.width(), source.height()),
    };
    let sizes = match matches.value_of("sizes") {
        Some(text) => text.parse::<IconSizeSet>()?,
        None => IconSizeSet::default_selection(),
    };
    let icons = generate_with_config(&source, crop, &sizes, &config)?;

    let out_dir = PathBuf::from(matches.value_of("output").unwrap_or("."));
    fs::create_dir_all(&out_dir)?;
    let base_name = base_file_name(path);
    for icon in icons.per_size() {
        let out_path = out_dir.join(per_size_file_name(&base_name, icon.size()));
        icon.container().write_to(fs::File::create(&out_path)?)?;
        println!(
            "{:>5}x{:<5} {:>10}  {}",
            icon.size(),
            icon.size(),
            format_bytes(icon.container().len()),
            out_path.display()
        );
    }
    let out_path = out_dir.join(bundle_file_name(&base_name));
    icons.bundle().write_to(fs::File::create(&out_path)?)?;
    println!(
        "{:>11} {:>10}  {}",
        "bundle",
        format_bytes(icons.bundle().len()),
        out_path.display()
    );
    Ok(())
}

fn run_extract(matches: &ArgMatches) -> CliResult {
    let path = matches.value_of("ico").unwrap_or_default();
    let icon_dir = IconDir::read(fs::File::open(path)?)?;
    let index = matches.value_of("index").unwrap_or_default();
    let index = index.parse::<usize>()?;
    let entry = match icon_dir.entries().get(index) {
        Some(entry) => entry,
        None => {
            return Err(format!(
                "index {} out of range ({} entries)",
                index,
                icon_dir.entries().len()
            )
            .into())
        }
    };
    if !entry.is_png() {
        return Err(format!("entry {} is not a PNG payload", index).into());
    }
    let out_path = match matches.value_of("output") {
        Some(out) => PathBuf::from(out),
        None => PathBuf::from(format!("{}.{}.png", path, index)),
    };
    fs::write(&out_path, entry.data())?;
    info!("Wrote {} bytes to {}", entry.data().len(), out_path.display());
    Ok(())
}

fn run_list(matches: &ArgMatches) -> CliResult {
    let path = matches.value_of("ico").unwrap_or_default();
    let icon_dir = IconDir::read(fs::File::open(path)?)?;
    for (index, entry) in icon_dir.entries().iter().enumerate() {
        let kind = if entry.is_png() { "PNG" } else { "BMP" };
        println!(
            "{:5}: {}x{} {}, {} bpp, {}",
            index,
            entry.width(),
            entry.height(),
            kind,
            entry.bits_per_pixel(),
            format_bytes(entry.data().len())
        );
    }
    Ok(())
}

//===========================================================================//

fn parse_crop(text: &str) -> Result<CropRegion, Box<dyn Error>> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<u32>, _>>()?;
    match parts.as_slice() {
        &[x, y, side] => Ok(CropRegion::new(x, y, side)),
        _ => Err(format!("crop must be X,Y,SIDE (was {:?})", text).into()),
    }
}

const BYTE_UNITS: &[&str] = &["KB", "MB", "GB"];

fn format_bytes(len: usize) -> String {
    if len < 1024 {
        return format!("{} B", len);
    }
    let mut value = len as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < BYTE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    let precision = if value >= 10.0 { 1 } else { 2 };
    format!("{:.*} {}", precision, value, BYTE_UNITS[unit])
}

//===========================================================================//


//===========================================================================//
