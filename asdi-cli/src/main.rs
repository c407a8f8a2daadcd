//! asdi: command-line decoder for ASDI feed captures and route strings.

use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use asdi_core::config::{self, Config};
use asdi_core::message::{decode_line, Message};
use asdi_core::nav::NavDatabase;
use asdi_core::route::{Resolution, RouteParser};
use asdi_core::types::{AsdiError, FEET_PER_METER, METERS_PER_NM, MS_PER_HOUR};
use asdi_core::GreatCircle;

#[derive(Parser)]
#[command(name = "asdi", version, about = "ASDI feed decoder and route resolver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode feed lines from a file ("-" for stdin) and print a message table
    Decode {
        /// Path to file containing raw feed lines (one per line)
        file: PathBuf,

        /// Year for feed timestamps (default: config, then current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month for feed timestamps (default: config, then current month)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// Print one JSON object per message instead of a table
        #[arg(short, long)]
        json: bool,

        /// Navigation data JSON (default: config navdata.path); when set, route
        /// fields are resolved
        #[arg(long, env = "ASDI_NAVDATA")]
        navdata: Option<PathBuf>,
    },

    /// Resolve a route description against navigation data
    Route {
        /// Route description, e.g. KBOS.MERIT.J584.SLT..KORD
        text: String,

        /// Navigation data JSON (default: config navdata.path)
        #[arg(long, env = "ASDI_NAVDATA")]
        navdata: Option<PathBuf>,

        /// Airport identifier prefix (default: config, then "K")
        #[arg(long)]
        airport_prefix: Option<String>,

        /// Print the resolution as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config();

    match cli.command {
        Commands::Decode {
            file,
            year,
            month,
            json,
            navdata,
        } => cmd_decode(&config, file, year, month, json, navdata),
        Commands::Route {
            text,
            navdata,
            airport_prefix,
            json,
        } => cmd_route(&config, &text, navdata, airport_prefix, json),
        Commands::Config { init } => cmd_config(&config, init),
    }
}

fn load_navdata(path: &Path) -> NavDatabase {
    NavDatabase::load(path).unwrap_or_else(|e| {
        eprintln!("Error loading navigation data {}: {e}", path.display());
        std::process::exit(1);
    })
}

fn navdata_path(config: &Config, flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| config.navdata.path.as_ref().map(PathBuf::from))
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

/// One decoded line plus its resolved route, if any.
struct Decoded {
    msg: Message,
    route: Option<Resolution>,
}

fn cmd_decode(
    config: &Config,
    file: PathBuf,
    year: Option<i32>,
    month: Option<u32>,
    json: bool,
    navdata: Option<PathBuf>,
) {
    let (default_year, default_month) = config.feed.year_month();
    let year = year.unwrap_or(default_year);
    let month = month.unwrap_or(default_month);

    let nav = navdata_path(config, navdata).map(|p| load_navdata(&p));
    let calc = GreatCircle;
    let parser = nav.as_ref().map(|nav| {
        RouteParser::new(nav, &calc).with_airport_prefix(config.route.airport_prefix.clone())
    });

    let reader: Box<dyn BufRead> = if file.to_str() == Some("-") {
        Box::new(io::stdin().lock())
    } else {
        let f = std::fs::File::open(&file).unwrap_or_else(|e| {
            eprintln!("Error opening {}: {e}", file.display());
            std::process::exit(1);
        });
        Box::new(io::BufReader::new(f))
    };

    let mut decoded = Vec::new();
    let mut total_lines = 0u64;
    let mut rejected: BTreeMap<String, u64> = BTreeMap::new();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        total_lines += 1;

        let msg = match decode_line(&line, year, month) {
            Ok(m) => m,
            Err(e) => {
                debug!(%e, line = line.as_str(), "rejected line");
                let key = match e {
                    AsdiError::UnknownMessageType(t) => format!("unknown type {t}"),
                    other => other.to_string(),
                };
                *rejected.entry(key).or_default() += 1;
                continue;
            }
        };

        let route = match (&parser, msg.route_text()) {
            (Some(parser), Some(text)) => match parser.resolve(text) {
                Ok(res) => Some(res),
                Err(e) => {
                    warn!(%e, sequence = msg.sequence, "route resolution failed");
                    None
                }
            },
            _ => None,
        };

        if json {
            let value = serde_json::json!({ "message": &msg, "route": &route });
            println!("{value}");
        }
        decoded.push(Decoded { msg, route });
    }

    if !json {
        print_summary(&decoded, total_lines, parser.is_some());
    }
    for (reason, count) in &rejected {
        eprintln!("Rejected {count}: {reason}");
    }
}

fn print_summary(decoded: &[Decoded], total_lines: u64, with_routes: bool) {
    println!();
    println!("Lines: {total_lines} read, {} decoded", decoded.len());
    println!();

    if decoded.is_empty() {
        return;
    }

    let mut header = vec![
        "Seq", "Time", "Fac", "Type", "Flight", "A/C", "Speed (kts)", "Alt (ft)", "Lat",
        "Lon",
    ];
    if with_routes {
        header.extend(["Fixes", "Skipped"]);
    }

    let mut table = Table::new();
    table.set_header(header);

    for d in decoded {
        let msg = &d.msg;
        let mut row = vec![
            Cell::new(format!("{:04X}", msg.sequence)),
            Cell::new(msg.timestamp.format("%d %H:%M:%S")),
            Cell::new(&msg.facility),
            Cell::new(msg.message_type()),
            Cell::new(
                msg.flight_id()
                    .map(|id| id.aircraft_id)
                    .unwrap_or("-".into()),
            ),
            Cell::new(msg.aircraft_type().unwrap_or("-".into())),
            Cell::new(
                msg.ground_speed()
                    .map(|s| format!("{:.0}", s * MS_PER_HOUR / METERS_PER_NM))
                    .unwrap_or("-".into()),
            ),
            Cell::new(
                msg.altitude()
                    .map(|a| format!("{:.0}", a * FEET_PER_METER))
                    .unwrap_or("-".into()),
            ),
        ];
        let (lat, lon) = match msg.position() {
            Some((lat, lon)) => (format!("{lat:.4}"), format!("{lon:.4}")),
            None => ("-".into(), "-".into()),
        };
        row.push(Cell::new(lat));
        row.push(Cell::new(lon));

        if with_routes {
            match &d.route {
                Some(res) => {
                    row.push(Cell::new(res.route.len()));
                    row.push(Cell::new(res.skipped.len()));
                }
                None => {
                    row.push(Cell::new("-"));
                    row.push(Cell::new("-"));
                }
            }
        }
        table.add_row(row);
    }

    println!("{table}");
}

// ---------------------------------------------------------------------------
// route
// ---------------------------------------------------------------------------

fn cmd_route(
    config: &Config,
    text: &str,
    navdata: Option<PathBuf>,
    airport_prefix: Option<String>,
    json: bool,
) {
    let Some(path) = navdata_path(config, navdata) else {
        eprintln!("Error: no navigation data (use --navdata or set navdata.path in config)");
        std::process::exit(1);
    };
    let nav = load_navdata(&path);
    let prefix = airport_prefix.unwrap_or_else(|| config.route.airport_prefix.clone());

    let res = RouteParser::new(&nav, &GreatCircle)
        .with_airport_prefix(prefix)
        .resolve(text)
        .unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(2);
        });

    if json {
        match serde_json::to_string_pretty(&res) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Fix", "Lat", "Lon"]);
    for (i, fix) in res.route.fixes().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(fix.name()),
            Cell::new(format!("{:.4}", fix.lat())),
            Cell::new(format!("{:.4}", fix.lon())),
        ]);
    }
    println!("{table}");

    if !res.skipped.is_empty() {
        println!();
        println!("Skipped elements:");
        for s in &res.skipped {
            println!("  [{}] {} ({:?})", s.index, s.element, s.reason);
        }
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config(config: &Config, init: bool) {
    let path = config::config_file();
    if init {
        if path.exists() {
            eprintln!("Config already exists: {}", path.display());
        } else {
            match config::save_config(&Config::default()) {
                Ok(p) => eprintln!("Wrote {}", p.display()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
    println!("# {}", path.display());
    print!("{config}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navdata_path_falls_back_to_config() {
        let mut config = Config::default();
        assert_eq!(navdata_path(&config, None), None);

        config.navdata.path = Some("/data/nav.json".into());
        assert_eq!(
            navdata_path(&config, None),
            Some(PathBuf::from("/data/nav.json"))
        );
        assert_eq!(
            navdata_path(&config, Some(PathBuf::from("local.json"))),
            Some(PathBuf::from("local.json"))
        );
    }
}
