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

use tracing::{error, info, warn};
use odin_common::datetime::YearMonth;
use crate::{
    assemble::{MonthAssembler, MonthDecision, MonthReport},
    client::AreaQuery,
    config::FirmsArchiveConfig,
    errors::Result,
    store::{BlobStore, MonthArchive},
};

/// the months of a run, in processing order
#[derive(Debug,Clone,PartialEq)]
pub enum MonthSelection {
    /// closed range [start,end]
    Range(YearMonth,YearMonth),
    /// explicit list, processed as given
    List(Vec<YearMonth>),
}

impl MonthSelection {
    pub fn months (&self)->Vec<YearMonth> {
        match self {
            MonthSelection::Range(start,end) => YearMonth::range_inclusive( *start, *end),
            MonthSelection::List(months) => months.clone()
        }
    }
}

#[derive(Debug,Clone,Default,PartialEq)]
pub struct RunSummary {
    pub written: Vec<YearMonth>,
    pub skipped: Vec<YearMonth>,
    pub deferred: Vec<YearMonth>,
    pub n_hotspots: usize,
    pub n_requests: usize,
    pub n_failed_windows: usize,
}

impl RunSummary {
    pub fn add (&mut self, report: &MonthReport) {
        match report.decision {
            MonthDecision::Written(n) => { self.written.push( report.month); self.n_hotspots += n; }
            MonthDecision::Skipped(_) => self.skipped.push( report.month),
            MonthDecision::Deferred(_) => self.deferred.push( report.month),
        }
        self.n_requests += report.n_requests;
        self.n_failed_windows += report.n_failed_windows;
    }

    pub fn log (&self) {
        info!("{} months written ({} hotspots), {} skipped, {} deferred, {} requests, {} failed windows",
              self.written.len(), self.n_hotspots, self.skipped.len(), self.deferred.len(), self.n_requests, self.n_failed_windows);

        if !self.deferred.is_empty() {
            let months: Vec<String> = self.deferred.iter().map( |m| m.to_string()).collect();
            warn!("deferred months need another run: {}", months.join(","));
        }
    }
}

/// assemble all selected months in order. The first month that fails aborts the run, rate limited
/// months are deferred and do not
pub async fn run_months<Q: AreaQuery, S: BlobStore> (config: &FirmsArchiveConfig, query: &Q, archive: &MonthArchive<S>, selection: &MonthSelection)->Result<RunSummary> {
    let assembler = MonthAssembler::new( config, query, archive);
    let mut summary = RunSummary::default();

    for month in selection.months() {
        match assembler.assemble( month).await {
            Ok(report) => {
                if report.rate_limited_sources.is_empty() {
                    info!("{}: {}", month, report.decision);
                } else {
                    info!("{}: {} (rate limited: {})", month, report.decision, report.rate_limited_sources.join(","));
                }
                summary.add( &report);
            }
            Err(e) => {
                error!("{} failed: {}", month, e);
                return Err(e)
            }
        }
    }

    summary.log();
    Ok(summary)
}
