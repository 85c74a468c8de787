mod chain;
mod error;
mod extract;
mod fetch;
mod models;
mod platform;

pub mod egress;
pub mod file_name;
pub mod placeholder;
pub mod profile_url;
pub mod resolver;
pub mod settings;
pub mod silhouette;
pub mod strategies;

pub use chain::*;
pub use error::*;
pub use fetch::{FetchRequest, FetchResponse, Fetcher, Method, ReqwestFetcher};
pub use models::*;
pub use platform::*;

pub use egress::{EgressOutcome, FetchedImage, ImageEgress};
pub use profile_url::{parse_profile_url, ProfileRef};
pub use resolver::AvatarResolver;
