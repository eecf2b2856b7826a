use std::env;
use std::fs;

use ardac_earthmaps::{
    AreaCategory, Client, ClientOptions, Crs, Dataset, FeatureMode, ZonalDataset,
    decode_encodings, timerange_params,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage:
  cargo run --example cli -- points <category>
  cargo run --example cli -- areas <category> [epsg]
  cargo run --example cli -- zonal <category> <dataset>
  cargo run --example cli -- encodings <describe-coverage.xml> [dataset.json]
  cargo run --example cli -- timerange <start> <end> [freq]

Set RUST_LOG=debug to see requests; skipped areas are logged at warn.";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() == 1 {
        eprintln!("{USAGE}");
        return;
    }

    if let Err(e) = run(&args[1..]) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> ardac_earthmaps::Result<()> {
    let arg = |i: usize| args.get(i).map(|s| s.as_str());

    match arg(0) {
        Some("points") | Some("areas") => {
            let category: AreaCategory = arg(1).unwrap_or("communities").parse()?;
            let mode = if arg(0) == Some("points") {
                FeatureMode::Point
            } else {
                let crs = match arg(2) {
                    Some(code) => Some(Crs::from_epsg(code.parse().map_err(|_| {
                        ardac_earthmaps::Error::InvalidRequest(format!("EPSG code must be an integer: {code}"))
                    })?)?),
                    None => None,
                };
                FeatureMode::Polygon { crs }
            };

            let client = Client::new(ClientOptions::default())?;
            for f in client.features(category, mode)? {
                match (f.latitude, f.longitude) {
                    (Some(lat), Some(lon)) => println!("{}\t{}\t{lat:.5}\t{lon:.5}", f.id, f.name),
                    _ => println!("{}\t{}\t{}", f.id, f.name, f.crs),
                }
            }
        }

        Some("zonal") => {
            let category: AreaCategory = arg(1).unwrap_or("fire_zones").parse()?;
            let dataset: ZonalDataset = arg(2).unwrap_or("flammability").parse()?;

            let client = Client::default_client()?;
            let areas = client.area_features(category, None)?;
            client.zonal_stats(&areas, dataset)?.write_csv(std::io::stdout())?;
        }

        Some("encodings") => {
            let path = arg(1).ok_or_else(|| {
                ardac_earthmaps::Error::InvalidRequest("missing DescribeCoverage file".into())
            })?;
            let encodings = decode_encodings(&fs::read_to_string(path)?)?;
            for (dim, table) in encodings.iter() {
                for (code, label) in table {
                    println!("{dim}\t{code}\t{label}");
                }
            }

            if let Some(dataset_path) = arg(2) {
                let dataset: Dataset = serde_json::from_str(&fs::read_to_string(dataset_path)?)?;
                let labeled = dataset.labeled(&encodings)?;
                for dim in labeled.dims() {
                    let values: Vec<String> = labeled
                        .coord(dim)
                        .unwrap_or_default()
                        .iter()
                        .map(|v| v.to_string())
                        .collect();
                    println!("{dim} = [{}]", values.join(", "));
                }
            }
        }

        Some("timerange") => {
            let (Some(start), Some(end)) = (arg(1), arg(2)) else {
                eprintln!("{USAGE}");
                std::process::exit(2);
            };
            let params = timerange_params(start, end, arg(3).unwrap_or("h"))?;
            println!("{}", serde_json::to_string_pretty(&params)?);
        }

        _ => {
            eprintln!("Unknown command. Use: points|areas|zonal|encodings|timerange");
            std::process::exit(2);
        }
    }

    Ok(())
}
