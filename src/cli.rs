use std::env;
use std::path::PathBuf;

/// Parsed command-line options.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub weather: PathBuf,
    pub nsrdb: bool,
    pub config: Option<PathBuf>,
    pub library: Option<PathBuf>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<f64>,
    pub elevation: Option<f64>,
    pub out: Option<PathBuf>,
    pub dry_run: bool,
    pub verbose: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(&args)
}

fn parse_args_from(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();
    let mut weather = None;

    while i < args.len() {
        match args[i].as_str() {
            "--weather" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --weather (expected a CSV path)")?;
                if weather.replace(PathBuf::from(path)).is_some() {
                    return Err("--weather provided more than once".to_string());
                }
            }
            "--nsrdb" => opts.nsrdb = true,
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML path)")?;
                opts.config = Some(PathBuf::from(path));
            }
            "--library" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --library (expected a library path)")?;
                opts.library = Some(PathBuf::from(path));
            }
            "--out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --out (expected a file path)")?;
                opts.out = Some(PathBuf::from(path));
            }
            "--lat" => {
                i += 1;
                opts.lat = Some(args.number_at(i, "--lat")?);
            }
            "--lon" => {
                i += 1;
                opts.lon = Some(args.number_at(i, "--lon")?);
            }
            "--timezone" => {
                i += 1;
                opts.timezone = Some(args.number_at(i, "--timezone")?);
            }
            "--elevation" => {
                i += 1;
                opts.elevation = Some(args.number_at(i, "--elevation")?);
            }
            "--dry-run" => opts.dry_run = true,
            "--verbose" | "-v" => opts.verbose = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    opts.weather = weather.ok_or_else(|| "--weather is required".to_string())?;
    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
    fn number_at(&self, index: usize, flag: &str) -> Result<f64, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }

    fn number_at(&self, index: usize, flag: &str) -> Result<f64, String> {
        let raw = self.next_or_err(index, &format!("missing value for {flag} (expected a number)"))?;
        raw.parse()
            .map_err(|_| format!("{flag} value \"{raw}\" is not a valid number"))
    }
}

pub fn print_usage() {
    eprintln!("ssc-pvwatts: simulate PV generation for a weather table with SSC pvwattsv5");
    eprintln!();
    eprintln!("Usage: ssc-pvwatts --weather <csv> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --weather <path>      Weather table (DNI, DHI, Wind Speed, Temperature)");
    eprintln!("  --nsrdb               Input is an NSRDB download with site metadata lines");
    eprintln!("  --config <path>       Load engine, site and system settings from TOML");
    eprintln!("  --library <path>      SSC shared library (overrides config and SSC_LIBRARY)");
    eprintln!("  --lat <deg>           Site latitude");
    eprintln!("  --lon <deg>           Site longitude");
    eprintln!("  --timezone <hours>    Offset of the timestamps from UTC");
    eprintln!("  --elevation <m>       Site elevation");
    eprintln!("  --out <path>          Write the table with generation here (default: stdout)");
    eprintln!("  --dry-run             Print the engine inputs as JSON without running");
    eprintln!("  -v, --verbose         Debug logging (RUST_LOG takes precedence)");
    eprintln!("  -h, --help            Show this help message");
}
