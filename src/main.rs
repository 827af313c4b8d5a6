//! Command-line entry point: read a weather table, run it through SSC, write
//! the table back out with a `generation` column.

mod cli;

use std::fs::File;
use std::io;
use std::process;

use tracing::info;

use ssc_pvwatts::adapter::call_ssc_with_table;
use ssc_pvwatts::config::RunConfig;
use ssc_pvwatts::error::Result;
use ssc_pvwatts::io::{export_csv, read_nsrdb_csv, read_weather_csv, write_csv};
use ssc_pvwatts::params::simulation_inputs;
use ssc_pvwatts::site::Site;
use ssc_pvwatts::ssc::NativeSsc;
use ssc_pvwatts::ssc::native::resolve_library_path;
use ssc_pvwatts::telemetry::init_tracing;
use ssc_pvwatts::weather::WeatherTable;

use cli::CliOptions;

/// Site used for the run: the NSRDB header replaces the config file's site,
/// and each command-line flag replaces the matching field.
fn layer_site(config: Site, header: Option<Site>, opts: &CliOptions) -> Site {
    let site = header.unwrap_or(config);
    Site {
        lat: opts.lat.unwrap_or(site.lat),
        lon: opts.lon.unwrap_or(site.lon),
        timezone: opts.timezone.unwrap_or(site.timezone),
        elevation: opts.elevation.unwrap_or(site.elevation),
    }
}

/// Loads the configuration and the weather table, with the site layered by
/// [`layer_site`].
fn load_inputs(opts: &CliOptions) -> Result<(RunConfig, WeatherTable)> {
    let mut config = match &opts.config {
        Some(path) => RunConfig::from_toml_file(path)?,
        None => RunConfig::default(),
    };

    let file = File::open(&opts.weather)?;
    let (table, header) = if opts.nsrdb {
        let (table, site) = read_nsrdb_csv(file)?;
        (table, Some(site))
    } else {
        (read_weather_csv(file)?, None)
    };
    config.site = layer_site(config.site, header, opts);

    info!(
        path = %opts.weather.display(),
        rows = table.len(),
        lat = config.site.lat,
        lon = config.site.lon,
        "weather table loaded"
    );
    Ok((config, table))
}

fn run(opts: &CliOptions, config: &RunConfig, mut table: WeatherTable) -> Result<()> {
    if opts.dry_run {
        let inputs = simulation_inputs(&table, &config.site, &config.system)?;
        serde_json::to_writer_pretty(io::stdout().lock(), &inputs)?;
        println!();
        return Ok(());
    }

    let library = opts
        .library
        .as_deref()
        .or(config.engine.library_path.as_deref());
    let ssc = NativeSsc::load(&resolve_library_path(library))?;
    call_ssc_with_table(&ssc, &mut table, &config.site, &config.system)?;

    match &opts.out {
        Some(path) => {
            export_csv(&table, path)?;
            info!(path = %path.display(), "table written");
        }
        None => write_csv(&table, io::stdout().lock())?,
    }
    Ok(())
}

fn main() {
    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(2);
        }
    };
    init_tracing(opts.verbose);

    let (config, table) = match load_inputs(&opts) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if let Err(e) = run(&opts, &config, table) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_site() -> Site {
        Site {
            lat: 10.0,
            lon: -80.0,
            timezone: -5.0,
            elevation: 100.0,
        }
    }

    fn header_site() -> Site {
        Site {
            lat: 39.74,
            lon: -105.18,
            timezone: -7.0,
            elevation: 1829.0,
        }
    }

    #[test]
    fn config_site_used_without_header_or_flags() {
        let site = layer_site(config_site(), None, &CliOptions::default());
        assert_eq!(site, config_site());
    }

    #[test]
    fn nsrdb_header_replaces_config_site() {
        let site = layer_site(config_site(), Some(header_site()), &CliOptions::default());
        assert_eq!(site, header_site());
    }

    #[test]
    fn flags_override_header_field_by_field() {
        let opts = CliOptions {
            lat: Some(1.5),
            elevation: Some(5.0),
            ..CliOptions::default()
        };
        let site = layer_site(config_site(), Some(header_site()), &opts);
        assert_eq!(site.lat, 1.5);
        assert_eq!(site.lon, -105.18);
        assert_eq!(site.timezone, -7.0);
        assert_eq!(site.elevation, 5.0);
    }

    #[test]
    fn flags_override_config_site_without_header() {
        let opts = CliOptions {
            lon: Some(20.0),
            timezone: Some(2.0),
            ..CliOptions::default()
        };
        let site = layer_site(config_site(), None, &opts);
        assert_eq!(site.lat, 10.0);
        assert_eq!(site.lon, 20.0);
        assert_eq!(site.timezone, 2.0);
        assert_eq!(site.elevation, 100.0);
    }
}
