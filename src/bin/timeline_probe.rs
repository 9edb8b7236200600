use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use moment_timeline::api::bucket_label;
use moment_timeline::core::primitives::{format_timestamp, parse_timestamp};
use moment_timeline::core::{RawMomentPoint, TimeScale, aggregate_with_report, compute_window};
use serde::Serialize;

const USAGE: &str = "usage: timeline_probe --input <points.json> [--scale <hour|day|...|max>] \
     [--center <timestamp>] [--output <path>]";

#[derive(Debug)]
struct CliArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    scale: TimeScale,
    center: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeBucket {
    key: String,
    label: String,
    bucket_start: String,
    count: u64,
    star_count: u64,
    total_weight: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeReport {
    scale: TimeScale,
    center: String,
    window_start: String,
    window_end: String,
    total_points: usize,
    points_in_window: usize,
    dropped_points: usize,
    buckets: Vec<ProbeBucket>,
}

fn main() {
    let _ = moment_timeline::telemetry::init_default_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    let raw = fs::read_to_string(&args.input)
        .map_err(|err| format!("failed to read `{}`: {err}", args.input.display()))?;
    let points: Vec<RawMomentPoint> =
        serde_json::from_str(&raw).map_err(|err| format!("invalid json: {err}"))?;

    let window = compute_window(args.scale, args.center);
    let in_window: Vec<RawMomentPoint> = points
        .iter()
        .filter(|point| {
            point
                .parsed_timestamp()
                .is_none_or(|time| window.contains(time))
        })
        .cloned()
        .collect();
    let report = aggregate_with_report(&in_window, args.scale);

    let probe = ProbeReport {
        scale: args.scale,
        center: format_timestamp(args.center),
        window_start: format_timestamp(window.start()),
        window_end: format_timestamp(window.end()),
        total_points: points.len(),
        points_in_window: report.accepted_points,
        dropped_points: report.dropped_points,
        buckets: report
            .buckets
            .iter()
            .map(|bucket| ProbeBucket {
                key: bucket.key.clone(),
                label: bucket_label(args.scale, bucket.bucket_start),
                bucket_start: format_timestamp(bucket.bucket_start),
                count: bucket.count,
                star_count: bucket.star_count,
                total_weight: bucket.total_weight,
            })
            .collect(),
    };

    let payload = serde_json::to_string_pretty(&probe)
        .map_err(|err| format!("failed to serialize json: {err}"))?;
    match args.output {
        Some(path) => write_file(&path, &payload),
        None => {
            println!("{payload}");
            Ok(())
        }
    }
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);
    let mut input = None::<PathBuf>;
    let mut output = None::<PathBuf>;
    let mut scale = TimeScale::default();
    let mut center = Utc::now();

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--input" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --input".to_owned())?;
                input = Some(PathBuf::from(value));
            }
            "--output" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --output".to_owned())?;
                output = Some(PathBuf::from(value));
            }
            "--scale" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --scale".to_owned())?;
                scale = value.parse().map_err(|err| format!("{err}"))?;
            }
            "--center" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --center".to_owned())?;
                center = parse_timestamp(&value)
                    .ok_or_else(|| format!("invalid --center timestamp `{value}`"))?;
            }
            "--help" | "-h" => return Err(USAGE.to_owned()),
            _ => return Err(format!("unknown argument `{flag}`")),
        }
    }

    let input = input.ok_or_else(|| format!("missing --input\n{USAGE}"))?;
    Ok(CliArgs {
        input,
        output,
        scale,
        center,
    })
}

fn write_file(path: &Path, payload: &str) -> Result<(), String> {
    fs::write(path, payload).map_err(|err| format!("failed to write `{}`: {err}", path.display()))
}
