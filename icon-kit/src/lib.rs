//! Building blocks for the Fire TV / Android icon generators.
//!
//! Raster work (resize, composite, pixel sampling, inversion) happens in-process
//! with the `image` crate and tracing with `vtracer`. Only the SVG to Vector
//! Drawable conversion is delegated to an external program.

pub mod background;
pub mod cancel;
pub mod color;
pub mod converter;
pub mod error;
pub mod icon_set;
pub mod image_compositor;
pub mod image_vectorizer;
pub mod logging;
pub mod pipeline;
pub mod scale;
pub mod size;
pub mod tools;
pub mod vector_drawable;

pub use background::infer_background;
pub use cancel::CancelFlag;
pub use color::Color;
pub use converter::{ExternalConverter, VectorConverter};
pub use error::IconError;
pub use icon_set::{generate_icon_set, GeneratedIcon, IconSetOptions, BANNER, LAUNCHER};
pub use image_compositor::{compose, ComposeOptions, MAX_SIDE};
pub use image_vectorizer::{trace_to_svg, TraceOptions, TraceOutcome};
pub use pipeline::{run_vector_job, VectorJob, VectorReport};
pub use scale::ScalePercent;
pub use size::TargetSize;
pub use vector_drawable::{annotate, annotate_file, VectorDocument};
