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

use std::fmt;
use tracing::{debug, info, warn};
use odin_common::datetime::YearMonth;
use crate::{
    client::AreaQuery,
    config::FirmsArchiveConfig,
    dedup::MonthBucket,
    errors::Result,
    fetch::{FetchOutcome, WindowFetcher},
    store::{BlobStore, ExistingOutput, MonthArchive},
    window::plan_windows,
};

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum SkipReason {
    /// output exists and has features
    Exists(usize),
    /// output exists without features and we don't rebuild empty months
    ExistsEmpty,
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum DeferReason {
    /// no hotspots and at least one source stayed rate limited
    RateLimited,
}

/// what happened to a month
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum MonthDecision {
    Written(usize),
    Skipped(SkipReason),
    Deferred(DeferReason),
}

impl fmt::Display for MonthDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthDecision::Written(n) => write!(f, "written ({} hotspots)", n),
            MonthDecision::Skipped(SkipReason::Exists(n)) => write!(f, "skipped (exists with {} hotspots)", n),
            MonthDecision::Skipped(SkipReason::ExistsEmpty) => write!(f, "skipped (exists without hotspots)"),
            MonthDecision::Deferred(DeferReason::RateLimited) => write!(f, "deferred (rate limited)"),
        }
    }
}

/// the resumability rule: do we keep what is already stored for a month
pub fn skip_reason (existing: ExistingOutput, rebuild_empty: bool, force: bool)->Option<SkipReason> {
    if force { return None }

    match existing {
        ExistingOutput::Features(0) => if rebuild_empty { None } else { Some(SkipReason::ExistsEmpty) },
        ExistingOutput::Features(n) => Some(SkipReason::Exists(n)),
        ExistingOutput::Missing | ExistingOutput::Unreadable => None
    }
}

#[derive(Debug,Clone,PartialEq)]
pub struct MonthReport {
    pub month: YearMonth,
    pub decision: MonthDecision,
    pub n_requests: usize,
    pub n_failed_windows: usize,
    pub rate_limited_sources: Vec<String>,
}

impl MonthReport {
    fn skipped (month: YearMonth, reason: SkipReason)->Self {
        MonthReport { month, decision: MonthDecision::Skipped(reason), n_requests: 0, n_failed_windows: 0, rate_limited_sources: Vec::new() }
    }
}

/// fetches, merges and stores all hotspots of one month
pub struct MonthAssembler<'a,Q: AreaQuery, S: BlobStore> {
    config: &'a FirmsArchiveConfig,
    query: &'a Q,
    archive: &'a MonthArchive<S>,
}

impl<'a,Q: AreaQuery, S: BlobStore> MonthAssembler<'a,Q,S> {
    pub fn new (config: &'a FirmsArchiveConfig, query: &'a Q, archive: &'a MonthArchive<S>)->Self {
        MonthAssembler { config, query, archive }
    }

    /// returns an error only if we can't plan the month or can't store its output. Failed windows
    /// are logged and skipped
    pub async fn assemble (&self, month: YearMonth)->Result<MonthReport> {
        let config = self.config;
        let existing = self.archive.existing( &month);

        if let Some(reason) = skip_reason( existing, config.rebuild_empty, config.force) {
            return Ok( MonthReport::skipped( month, reason))
        }
        match existing {
            ExistingOutput::Unreadable => warn!("unreadable output {}, rebuilding", self.archive.location(&month)),
            ExistingOutput::Features(n) => info!("rebuilding {} ({} hotspots)", self.archive.location(&month), n),
            ExistingOutput::Missing => {}
        }

        let windows = plan_windows( month, config.day_span)?;
        let mut fetcher = WindowFetcher::new( self.query, &config.retry, config.pacing_delay, &config.bounds);
        let mut bucket = MonthBucket::new();
        let mut n_failed_windows = 0;
        let mut rate_limited_sources: Vec<String> = Vec::new();

        for source in &config.sources {
            if !source.covers( &month) {
                debug!("{} has no data for {}", source.id, month);
                continue
            }

            let mut saw_limit = false;
            for window in &windows {
                if window.end() < source.earliest || source.latest.is_some_and( |latest| window.start > latest) {
                    continue
                }

                match fetcher.fetch( &source.id, window).await {
                    Ok(FetchOutcome::Succeeded(hotspots)) => {
                        let n = hotspots.len();
                        let n_added = bucket.fold_all( hotspots);
                        if n_added < n { debug!("{} {}: dropped {} duplicates", source.id, window, n - n_added) }
                    }
                    Ok(FetchOutcome::Exhausted) => saw_limit = true,
                    Err(e) => {
                        warn!("skipping {} {}: {}", source.id, window, e);
                        n_failed_windows += 1;
                    }
                }
            }

            if saw_limit { rate_limited_sources.push( source.id.clone()) }
        }

        let decision = if bucket.is_empty() && !rate_limited_sources.is_empty() {
            MonthDecision::Deferred( DeferReason::RateLimited)
        } else {
            let hotspots = bucket.into_hotspots();
            self.archive.write( &month, &hotspots)?;
            info!("saved {} hotspots to {}", hotspots.len(), self.archive.location(&month));
            MonthDecision::Written( hotspots.len())
        };

        Ok( MonthReport { month, decision, n_requests: fetcher.n_requests(), n_failed_windows, rate_limited_sources })
    }
}
