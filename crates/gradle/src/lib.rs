//! Fetching dependency archives with Gradle and classifying them into
//! module managers.
//!
//! A fetch runs two builds of a generated project: a baseline that only
//! prepares the staging folder, then a target build that copies the
//! resolved runtime classpath into it. Archives present after the target
//! build but not after the baseline are offered to the managers in
//! classification order.

pub mod error;
pub mod fetcher;
pub mod project;
pub mod runner;
pub mod spec;

pub use error::FetchError;
pub use fetcher::{DependencyFetcher, FetchReport, FetchState};
pub use project::GradleProject;
pub use runner::{BuildToolRunner, GradleRunner};
pub use spec::DependencySpec;
