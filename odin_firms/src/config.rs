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

use std::{env, path::{Path,PathBuf}, time::Duration};
use serde::{Serialize,Deserialize};
use chrono::NaiveDate;
use odin_common::{
    BoundingBox,
    datetime::{YearMonth, deserialize_duration, serialize_duration, secs},
    fs::{expand_env_path, filepath_contents_as_string}
};
use crate::errors::{config_error, Result};
use crate::driver::MonthSelection;
use crate::window::MAX_DAY_SPAN;

pub const CONFIG_CRATE: &str = "odin_firms";
pub const DEFAULT_CONFIG: &str = "firms_archive.ron";

/// one FIRMS data product ("source" in terms of the area API), e.g. "VIIRS_SNPP_SP"
#[derive(Debug,Clone,Serialize,Deserialize,PartialEq)]
pub struct FirmsSource {
    pub id: String,
    /// first day the product has data for
    pub earliest: NaiveDate,
    /// last day the product has data for (NRT products are replaced by SP products after a while)
    #[serde(default)]
    pub latest: Option<NaiveDate>,
}

impl FirmsSource {
    pub fn new (id: impl ToString, earliest: NaiveDate)->Self {
        FirmsSource { id: id.to_string(), earliest, latest: None }
    }

    /// do we have to query this source for any day of the given month
    pub fn covers (&self, month: &YearMonth)->bool {
        self.earliest <= month.last_day() && self.latest.is_none_or( |latest| latest >= month.first_day())
    }
}

pub fn default_sources ()->Vec<FirmsSource> {
    let date = |y,m,d| NaiveDate::from_ymd_opt(y,m,d).unwrap_or(NaiveDate::MIN);
    vec![
        FirmsSource::new( "MODIS_SP", date(2000,11,1)),
        FirmsSource::new( "VIIRS_SNPP_SP", date(2012,1,20)),
        FirmsSource::new( "VIIRS_NOAA20_SP", date(2018,4,1)),
        FirmsSource::new( "VIIRS_NOAA21_NRT", date(2024,1,17)),
    ]
}

/// linear, capped backoff for rate limited requests
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct RetryPolicy {
    /// total number of attempts per request window
    pub max_retries: u32,

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub base_delay: Duration,

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// sleep time after the n-th (0-based) rate limited attempt
    pub fn backoff_delay (&self, n: u32)->Duration {
        self.base_delay.saturating_mul( n.saturating_add(1)).min( self.max_delay)
    }

    pub fn max_attempts (&self)->u32 { self.max_retries.max(1) }
}

impl Default for RetryPolicy {
    fn default()->Self {
        RetryPolicy { max_retries: 4, base_delay: secs(20), max_delay: secs(120) }
    }
}

fn default_base_url ()->String { "https://firms.modaps.eosdis.nasa.gov".to_string() }
fn default_file_prefix ()->String { "firms_".to_string() }
fn default_day_span ()->u32 { MAX_DAY_SPAN }
fn default_pacing_delay ()->Duration { secs(2) }
fn default_request_timeout ()->Duration { secs(180) }

/// the configuration for a FIRMS archive run. This is resolved once at startup and then passed down
/// by reference, it does not change during a run
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct FirmsArchiveConfig {
    #[serde(default="default_base_url")]
    pub base_url: String,

    /// FIRMS MAP_KEY. If not set here it has to be provided on the command line or as FIRMS_MAP_KEY
    #[serde(default)]
    pub map_key: Option<String>,

    pub bounds: BoundingBox<f64>,
    pub output_dir: PathBuf,

    #[serde(default="default_file_prefix")]
    pub file_prefix: String,

    /// max number of days per area request (the API does not accept more than 10)
    #[serde(default="default_day_span")]
    pub day_span: u32,

    #[serde(default="default_sources")]
    pub sources: Vec<FirmsSource>,

    /// delay after each successful request
    #[serde(default="default_pacing_delay", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub pacing_delay: Duration,

    #[serde(default)]
    pub retry: RetryPolicy,

    /// area responses for large regions can take minutes
    #[serde(default="default_request_timeout", deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub request_timeout: Duration,

    /// re-fetch months that already have an output file without features
    #[serde(default)]
    pub rebuild_empty: bool,

    /// re-fetch months regardless of existing output
    #[serde(default)]
    pub force: bool,

    #[serde(default)]
    pub start: Option<YearMonth>,
    #[serde(default)]
    pub end: Option<YearMonth>,

    /// explicit month list, takes precedence over start/end
    #[serde(default)]
    pub months: Option<Vec<YearMonth>>,
}

impl FirmsArchiveConfig {

    /// parse RON config from given path and expand env vars in the output_dir
    pub fn from_path (path: impl AsRef<Path>)->Result<Self> {
        let src = filepath_contents_as_string( &path.as_ref())?;
        let mut config: FirmsArchiveConfig = ron::from_str( &src)?;
        config.output_dir = expand_env_path( &config.output_dir)?;
        Ok(config)
    }

    pub fn map_key (&self)->Result<&str> {
        match self.map_key.as_deref().map( str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err( config_error!("no FIRMS map key (set map_key, --map-key or FIRMS_MAP_KEY)"))
        }
    }

    /// the month iteration order for this run
    pub fn month_selection (&self)->Result<MonthSelection> {
        if let Some(months) = &self.months {
            if months.is_empty() { return Err( config_error!("empty month list")) }
            Ok( MonthSelection::List( months.clone()))

        } else {
            match (self.start, self.end) {
                (Some(start), Some(end)) => {
                    if start > end { return Err( config_error!("start month {} after end month {}", start, end)) }
                    Ok( MonthSelection::Range(start,end))
                }
                (Some(start), None) => Ok( MonthSelection::Range(start,start)),
                _ => Err( config_error!("no month range or month list"))
            }
        }
    }

    /// apply command line month overrides. A month list replaces everything, a start or end month
    /// replaces a configured month list (a missing start is taken from the config)
    pub fn override_months (&mut self, months: Option<Vec<YearMonth>>, start: Option<YearMonth>, end: Option<YearMonth>) {
        if months.is_some() {
            self.months = months;
        } else if start.is_some() || end.is_some() {
            self.months = None;
            if start.is_some() { self.start = start }
            self.end = end;
        }
    }

    /// check everything we need before the first request goes out
    pub fn validate (&self)->Result<()> {
        self.map_key()?;
        self.month_selection()?;

        if !self.bounds.is_valid() {
            return Err( config_error!("invalid bounds {} (need west < east and south < north)", self.bounds))
        }
        if self.day_span == 0 || self.day_span > MAX_DAY_SPAN {
            return Err( config_error!("day_span {} outside 1..={}", self.day_span, MAX_DAY_SPAN))
        }
        if self.sources.is_empty() {
            return Err( config_error!("no FIRMS sources configured"))
        }
        if self.base_url.is_empty() {
            return Err( config_error!("no base_url"))
        }
        Ok(())
    }
}

/// locate a config file. Explicit paths are used as is, plain filenames are looked up in
/// `$ODIN_HOME/configs/odin_firms/`, `$HOME/.odin/configs/odin_firms/` and finally the `configs/` dir of this crate
pub fn find_config_file (filename: &str)->Option<PathBuf> {
    let path = Path::new(filename);
    if path.is_file() { return Some(path.to_path_buf()) }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(odin_home) = env::var("ODIN_HOME") {
        candidates.push( Path::new(&odin_home).join("configs").join(CONFIG_CRATE).join(filename));
    }
    if let Ok(usr_home) = env::var("HOME") {
        candidates.push( Path::new(&usr_home).join(".odin").join("configs").join(CONFIG_CRATE).join(filename));
    }
    candidates.push( Path::new( env!("CARGO_MANIFEST_DIR")).join("configs").join(filename));

    candidates.into_iter().find( |p| p.is_file())
}

pub fn load_config (filename: &str)->Result<FirmsArchiveConfig> {
    let path = find_config_file(filename).ok_or_else( || config_error!("config {} not found", filename))?;
    FirmsArchiveConfig::from_path( &path)
}
