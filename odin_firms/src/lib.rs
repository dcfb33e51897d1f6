/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License"); 
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! monthly archives of FIRMS (https://firms.modaps.eosdis.nasa.gov/) active fire detections.
//!
//! For each month we query the FIRMS area API for all configured products in windows of at most
//! 10 days, merge the returned hotspots so that each detection is only stored once and write one
//! GeoJSON FeatureCollection per month. Months that already have output are skipped, which means
//! an interrupted run can just be started again.

pub mod errors;
pub mod config;
pub mod hotspot;
pub mod dedup;
pub mod window;
pub mod client;
pub mod fetch;
pub mod store;
pub mod assemble;
pub mod driver;
pub mod import;

pub use errors::{OdinFirmsError, Result};
pub use config::{FirmsArchiveConfig, FirmsSource, RetryPolicy, load_config, DEFAULT_CONFIG};
pub use hotspot::{FirmsHotspot, RawRecord, normalize};
pub use dedup::{HotspotKey, MonthBucket};
pub use window::{RequestWindow, plan_windows, MAX_DAY_SPAN};
pub use client::{AreaQuery, AreaResponse, FirmsClient};
pub use fetch::{FetchState, FetchEvent, FetchOutcome, WindowFetcher};
pub use store::{BlobStore, DirStore, MemStore, ExistingOutput, MonthArchive};
pub use assemble::{MonthAssembler, MonthDecision, MonthReport, SkipReason, DeferReason};
pub use driver::{MonthSelection, RunSummary, run_months};
pub use import::{ImportSummary, import_dir};

use tracing_subscriber::EnvFilter;

/// log to stderr, filtered by RUST_LOG (default "info")
pub fn init_tracing () {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer( std::io::stderr).try_init();
}
