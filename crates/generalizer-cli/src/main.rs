//! `generalizer` - bake and evaluate zoom-level visibility of point datasets

mod cli;
mod logging;

use clap::Parser;
use cli::{Command, DatasetIo, Settings};
use generalizer_lib::utils::{WEB_MERCATOR_SCALES, scale_to_zoom_level};
use generalizer_lib::{
    CancellationToken, ClusteredVisualization, ConfigurationStore, Dataset, EvaluationContext,
    GeneralizeError, GridConfig, GridVisualization, PipelineConfig, ValueRef, clusterize_by_distance,
    visibility,
};
use std::path::Path;
use std::process::ExitCode;

/// Errors surfaced to the operator
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Generalize(#[from] GeneralizeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: GeneralizeError,
    },
}

fn main() -> ExitCode {
    logging::setup_logging();
    let settings = Settings::parse();

    match run(settings.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Cluster {
            io,
            base_distance,
            zoom_levels,
            attribute,
            method,
            output_attribute,
            isolated_always_visible,
            show_all_at_last,
        } => {
            let config = PipelineConfig {
                base_distance,
                zoom_levels,
                election_attribute: attribute,
                method: method.into(),
                output_attribute,
                isolated_features_always_visible: isolated_always_visible,
                show_all_at_last_zoom_level: show_all_at_last,
            };
            let pipeline = ClusteredVisualization::new(config)?;
            let mut dataset = read_dataset(&io.input)?;
            let offsets = pipeline.apply(&mut dataset, &CancellationToken::new())?;
            tracing::info!("Assigned visibility offsets to {} of {} features", offsets.len(), dataset.len());
            write_dataset(&dataset, &io)
        }

        Command::Clusterize {
            io,
            distance,
            id_attribute,
            size_attribute,
        } => {
            let mut dataset = read_dataset(&io.input)?;
            clusterize_by_distance(&mut dataset, distance, &id_attribute, &size_attribute)?;
            write_dataset(&dataset, &io)
        }

        Command::Grid {
            io,
            square_length,
            zoom_levels,
            output_attribute,
        } => {
            let grid = GridVisualization::new(GridConfig {
                square_length,
                zoom_levels,
                output_attribute,
                ..Default::default()
            })?;
            let mut dataset = read_dataset(&io.input)?;
            let offsets = grid.apply(&mut dataset, &CancellationToken::new())?;
            tracing::info!("Grid picked {} of {} features", offsets.len(), dataset.len());
            write_dataset(&dataset, &io)
        }

        Command::Visible {
            input,
            config,
            zoom,
            attribute,
            tag,
        } => {
            let dataset = read_dataset(&input)?;
            let json = std::fs::read_to_string(&config).map_err(|e| CliError::Read {
                path: config.display().to_string(),
                source: e.into(),
            })?;
            let store = ConfigurationStore::from_json(&json)?;

            let mut context = EvaluationContext::new(&dataset, &store, zoom);
            if let Some(tag) = tag {
                context = context.with_tag(tag);
            }
            tracing::info!("Evaluating '{}' at zoom {} with tag {:?}", dataset.name, zoom, context.tag());

            let min_zoom: ValueRef<f64> = "_zoom_min".into();
            let offset = ValueRef::property(attribute);
            let mut visible = 0usize;
            for feature in dataset.features() {
                match visibility::visible_by_offset(&mut context, feature, &min_zoom, &offset) {
                    Ok(true) => {
                        visible += 1;
                        println!("{}", feature.id);
                    }
                    Ok(false) => {}
                    Err(e) => tracing::warn!("Feature {} hidden: {}", feature.id, e),
                }
            }
            tracing::info!("{} of {} features visible", visible, dataset.len());
            Ok(())
        }

        Command::ZoomLevel { scale } => {
            match scale_to_zoom_level(&WEB_MERCATOR_SCALES, scale) {
                Some(level) => println!("{level}"),
                None => tracing::warn!("No scales to compare against"),
            }
            Ok(())
        }
    }
}

fn read_dataset(path: &Path) -> Result<Dataset, CliError> {
    let dataset = Dataset::load_from_file(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!("Loaded '{}' with {} features from {}", dataset.name, dataset.len(), path.display());
    Ok(dataset)
}

fn write_dataset(dataset: &Dataset, io: &DatasetIo) -> Result<(), CliError> {
    match &io.output {
        Some(path) => {
            dataset.save_to_file(path)?;
            tracing::info!("Wrote {} features to {}", dataset.len(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(dataset)?),
    }
    Ok(())
}
