use chrono::Utc;
use httpmock::prelude::*;
use tempfile::TempDir;
use trip_etl::utils::validation::Validate;
use trip_etl::{HttpFetcher, LocalStorage, PipelineFile, PipelineState};

fn pipeline_toml(base_url: &str, root: &std::path::Path, marker: &std::path::Path, load: &str) -> String {
    format!(
        r#"
[pipeline]
name = "elt_pipeline_nyc_taxi"

[gate]
kind = "immediate"

[retry]
retries = 2
delay_seconds = 0

[ingest]
base_url = "{base_url}"
start_year = 2023
end_year = 2023
end_month = 1
throttle_ms = 0
local_root = "{root}"

[[stages]]
name = "download_taxi_data"
kind = "ingest"

[[stages]]
name = "load_raw_trips_data"
kind = "command"
program = "sh"
args = ["-c", "{load}"]

[[stages]]
name = "transform_trips_data"
kind = "command"
program = "sh"
args = ["-c", "echo transformed >> {marker}"]
"#,
        base_url = base_url,
        root = root.display(),
        load = load,
        marker = marker.display(),
    )
}

#[cfg(unix)]
#[tokio::test]
async fn test_pipeline_runs_stages_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let marker = temp_dir.path().join("marker.txt");
    let server = MockServer::start();
    let jan = server.mock(|when, then| {
        when.method(GET)
            .path("/trip-data/yellow_tripdata_2023-01.parquet");
        then.status(200).body("PAR1");
    });

    let load = format!(
        "test -f {}/dataset/trips/yellow_tripdata_2023-01.parquet && echo loaded >> {}",
        temp_dir.path().display(),
        marker.display()
    );
    let toml = pipeline_toml(&server.url("/trip-data"), temp_dir.path(), &marker, &load);
    let file = PipelineFile::from_toml_str(&toml).unwrap();
    file.validate().unwrap();

    let orchestrator = file
        .build(Some((LocalStorage::new(temp_dir.path()), HttpFetcher::new())))
        .unwrap();
    let outcome = orchestrator.run(Utc::now()).await;

    jan.assert();
    assert_eq!(outcome.state, PipelineState::Done);
    assert_eq!(
        std::fs::read_to_string(&marker).unwrap(),
        "loaded\ntransformed\n"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_stage_stops_pipeline_after_retries() {
    let temp_dir = TempDir::new().unwrap();
    let marker = temp_dir.path().join("marker.txt");
    let attempts = temp_dir.path().join("attempts.txt");
    let server = MockServer::start();

    let load = format!("echo attempt >> {}; exit 1", attempts.display());
    let toml = pipeline_toml(&server.url("/trip-data"), temp_dir.path(), &marker, &load);
    let file = PipelineFile::from_toml_str(&toml).unwrap();

    let orchestrator = file
        .build(Some((LocalStorage::new(temp_dir.path()), HttpFetcher::new())))
        .unwrap();
    let outcome = orchestrator.run(Utc::now()).await;

    assert_eq!(
        outcome.state,
        PipelineState::Failed {
            stage: "load_raw_trips_data".to_string()
        }
    );
    assert_eq!(outcome.stages.len(), 2);
    assert_eq!(outcome.stages[1].attempts, 3);
    assert_eq!(
        std::fs::read_to_string(&attempts).unwrap().lines().count(),
        3
    );
    assert!(!marker.exists());
    assert!(outcome.into_result().is_err());
}
