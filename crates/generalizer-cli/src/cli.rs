use clap::{Parser, Subcommand, ValueEnum};
use generalizer_lib::{
    DEFAULT_CLUSTER_ID_ATTRIBUTE, DEFAULT_CLUSTER_SIZE_ATTRIBUTE, DEFAULT_VISIBILITY_ATTRIBUTE,
    GRID_OFFSET_ATTRIBUTE, SelectionMethod,
};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Webmap Generalizer - bake and evaluate zoom-level visibility of point datasets
pub struct Settings {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Cluster at halving distances and bake a visibility offset per feature
    Cluster {
        #[clap(flatten)]
        io: DatasetIo,

        /// Clustering distance at level 0, in dataset units
        #[clap(short, long, default_value = "1000.0")]
        base_distance: f64,

        /// Number of zoom levels to generate
        #[clap(short, long, default_value = "5")]
        zoom_levels: u32,

        /// Numeric attribute deciding which feature represents its cluster
        #[clap(short, long)]
        attribute: String,

        /// Whether the highest or lowest attribute value wins
        #[clap(short, long, value_enum, default_value = "max")]
        method: Method,

        /// Attribute receiving the visibility offset
        #[clap(long, default_value = DEFAULT_VISIBILITY_ATTRIBUTE)]
        output_attribute: String,

        /// Isolated features become visible at the level they first stand alone
        #[clap(long, default_value = "false")]
        isolated_always_visible: bool,

        /// Features never elected are shown at the last level instead of after it
        #[clap(long, default_value = "false")]
        show_all_at_last: bool,
    },

    /// Annotate every feature with its cluster id and size for one distance
    Clusterize {
        #[clap(flatten)]
        io: DatasetIo,

        /// Clustering distance in dataset units
        #[clap(short, long)]
        distance: f64,

        #[clap(long, default_value = DEFAULT_CLUSTER_ID_ATTRIBUTE)]
        id_attribute: String,

        #[clap(long, default_value = DEFAULT_CLUSTER_SIZE_ATTRIBUTE)]
        size_attribute: String,
    },

    /// Sample the dataset with halving grids and bake a grid offset per feature
    Grid {
        #[clap(flatten)]
        io: DatasetIo,

        /// Grid square side at level 0, in dataset units
        #[clap(short, long)]
        square_length: f64,

        /// Number of zoom levels to generate
        #[clap(short, long, default_value = "5")]
        zoom_levels: u32,

        /// Attribute receiving the grid offset
        #[clap(long, default_value = GRID_OFFSET_ATTRIBUTE)]
        output_attribute: String,
    },

    /// Print the ids of features visible at a zoom level from their baked offset
    Visible {
        /// Dataset JSON file (already processed by `cluster` or `grid`)
        #[clap(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Configuration payload JSON file (tags, properties, variables)
        #[clap(short, long, value_name = "FILE")]
        config: PathBuf,

        /// Current zoom level (1-based)
        #[clap(short, long)]
        zoom: u32,

        /// Offset attribute to read
        #[clap(short, long, default_value = DEFAULT_VISIBILITY_ATTRIBUTE)]
        attribute: String,

        /// Use this tag instead of identifying it from the dataset name or categories
        #[clap(short, long)]
        tag: Option<String>,
    },

    /// Print the Web Mercator zoom level closest to a map scale
    ZoomLevel {
        /// Map scale denominator (e.g. 25000 for 1:25000)
        scale: f64,
    },
}

/// Input and output dataset files shared by the batch commands
#[derive(clap::Args, Debug, Clone)]
pub struct DatasetIo {
    /// Dataset JSON file to read
    #[clap(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Where to write the annotated dataset (stdout if omitted)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Max,
    Min,
}

impl From<Method> for SelectionMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Max => SelectionMethod::Max,
            Method::Min => SelectionMethod::Min,
        }
    }
}
