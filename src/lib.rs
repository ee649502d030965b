//! An MCP server exposing the ARM Live Data archive.
//!
//! Two tools are served over stdio:
//! - `query_live_data`: query a datastream's metadata and file listing for a
//!   time window, returning the archive's JSON response unchanged.
//! - `return_cdf_data`: download a netCDF file and return one named
//!   variable's full time series as numbers.
//!
//! ## Quick start
//! Configure credentials via environment variables (`ARM_USERNAME`,
//! `ARM_API_TOKEN`, optionally `ARM_LIVE_URL`) or an `.armliverc` file
//! (supported in the current directory and in your home directory), then run
//! the `arm-livedata` binary under any MCP client.
//!
//! The library pieces are usable on their own:
//!
//! ```no_run
//! use anyhow::Result;
//! use arm_livedata::{ArmClient, Config, TimeRange};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ArmClient::new(Config::from_env()?)?;
//!     let range = TimeRange::resolve(Some("2020-01-01"), Some("2020-01-02"))?;
//!     let listing = client.query("sgpmetE11.b1", &range).await?;
//!     println!("{listing}");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod cdf;
mod client;
mod config;
mod error;
mod server;
mod timerange;

pub use client::ArmClient;
pub use config::{Config, DEFAULT_API_BASE};
pub use error::{ArmError, Result};
pub use server::ArmLiveServer;
pub use timerange::TimeRange;
