pub mod annotation;
pub mod cli;
pub mod ctx;
pub mod dataset;
pub mod driver;
pub mod heatmap;
pub mod histogram;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod plot;
pub mod refseq;
pub mod schema;
