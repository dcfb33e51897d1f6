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

//! batch import of previously downloaded FIRMS data (CSV archive downloads, JSON or GeoJSON exports).
//! Hotspots are bucketed by the month of their acquisition date

use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use odin_common::{BoundingBox, datetime::YearMonth, fs::{extension, matching_files_in_tree}};
use crate::{
    assemble::skip_reason,
    dedup::MonthBucket,
    errors::{op_failed, Result},
    hotspot::{json_records, normalize, read_csv_records, RawRecord},
    store::{BlobStore, MonthArchive},
};

lazy_static! {
    static ref IMPORT_FILE_RE: Regex = Regex::new(r"(?i)\.(csv|json|geojson)$").unwrap();
}

/// all raw records of a CSV, JSON or GeoJSON file
pub fn read_records (path: &Path)->Result<Vec<RawRecord>> {
    let ext = extension( &path).map( |e| e.to_lowercase());

    match ext.as_deref() {
        Some("csv") => read_csv_records( File::open(path)?),
        Some("json") | Some("geojson") => {
            let value: JsonValue = serde_json::from_reader( BufReader::new( File::open(path)?))?;
            Ok( json_records( &value))
        }
        _ => Err( op_failed!("unsupported import file {:?}", path))
    }
}

#[derive(Debug,Clone,Default,PartialEq)]
pub struct ImportSummary {
    pub n_files: usize,
    pub n_failed_files: usize,
    pub n_records: usize,
    /// records without valid in-bounds position
    pub n_rejected: usize,
    /// records we could not assign to a month
    pub n_undated: usize,
    pub n_duplicates: usize,
    pub written: Vec<(YearMonth,usize)>,
    pub skipped: Vec<YearMonth>,
}

impl ImportSummary {
    pub fn n_hotspots (&self)->usize {
        self.written.iter().map( |(_,n)| n).sum()
    }

    pub fn log (&self) {
        info!("imported {} files ({} failed): {} records, {} rejected, {} undated, {} duplicates",
              self.n_files, self.n_failed_files, self.n_records, self.n_rejected, self.n_undated, self.n_duplicates);
        info!("{} months written ({} hotspots), {} skipped", self.written.len(), self.n_hotspots(), self.skipped.len());
    }
}

/// import all matching files below dir into monthly archive outputs. Existing outputs are
/// handled the same way as for fetched months
pub fn import_dir<S: BlobStore> (dir: &Path, bounds: &BoundingBox<f64>, archive: &MonthArchive<S>, rebuild_empty: bool, force: bool)->Result<ImportSummary> {
    let files = matching_files_in_tree( &dir, &IMPORT_FILE_RE)?;
    let mut summary = ImportSummary::default();
    let mut buckets: BTreeMap<YearMonth,MonthBucket> = BTreeMap::new();

    for path in &files {
        summary.n_files += 1;

        let records = match read_records( path) {
            Ok(records) => records,
            Err(e) => {
                warn!("skipping {:?}: {}", path, e);
                summary.n_failed_files += 1;
                continue
            }
        };
        debug!("{:?}: {} records", path, records.len());
        summary.n_records += records.len();

        for rec in &records {
            match normalize( rec, bounds) {
                Some(hs) => {
                    if let Some(date) = hs.acq_date {
                        if !buckets.entry( YearMonth::of_date(date)).or_default().fold(hs) {
                            summary.n_duplicates += 1;
                        }
                    } else {
                        summary.n_undated += 1;
                    }
                }
                None => summary.n_rejected += 1
            }
        }
    }

    for (month,bucket) in buckets {
        if let Some(reason) = skip_reason( archive.existing(&month), rebuild_empty, force) {
            info!("{}: keeping existing output {:?}", month, reason);
            summary.skipped.push(month);
            continue
        }

        let hotspots = bucket.into_hotspots();
        archive.write( &month, &hotspots)?;
        info!("saved {} hotspots to {}", hotspots.len(), archive.location(&month));
        summary.written.push( (month, hotspots.len()));
    }

    Ok(summary)
}
