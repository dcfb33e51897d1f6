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
#![allow(unused)]

use std::{collections::HashMap, path::PathBuf, str::FromStr, sync::Mutex, time::Duration};
use async_trait::async_trait;
use chrono::NaiveDate;
use geojson::GeoJson;
use odin_common::{BoundingBox, datetime::{secs, YearMonth}};
use odin_firms::{
    assemble::*,
    client::{AreaQuery, AreaResponse},
    config::{FirmsArchiveConfig, FirmsSource, RetryPolicy},
    driver::{run_months, MonthSelection},
    errors::Result,
    store::{BlobStore, ExistingOutput, MemStore, MonthArchive},
    window::RequestWindow,
};

const HEADER: &str = "latitude,longitude,acq_date,acq_time,satellite,instrument,frp\n";

fn date (y: i32, m: u32, d: u32)->NaiveDate { NaiveDate::from_ymd_opt(y,m,d).unwrap() }
fn month (y: i32, m: u32)->YearMonth { YearMonth::new(y,m).unwrap() }

/// upstream mock: responses per (source,window start), everything else gets the default response
struct MockArea {
    responses: HashMap<(String,NaiveDate),(u16,String)>,
    default: (u16,String),
    calls: Mutex<Vec<(String,NaiveDate)>>,
}

impl MockArea {
    fn new (default_status: u16)->Self {
        MockArea { responses: HashMap::new(), default: (default_status, String::new()), calls: Mutex::new(Vec::new()) }
    }

    fn with (mut self, source: &str, start: NaiveDate, status: u16, body: String)->Self {
        self.responses.insert( (source.to_string(), start), (status, body));
        self
    }

    fn calls (&self)->Vec<(String,NaiveDate)> { self.calls.lock().unwrap().clone() }
}

#[async_trait]
impl AreaQuery for MockArea {
    async fn query_area (&self, source: &str, window: &RequestWindow)->Result<AreaResponse> {
        let key = (source.to_string(), window.start);
        self.calls.lock().unwrap().push( key.clone());
        let (status,body) = self.responses.get( &key).unwrap_or( &self.default);
        Ok( AreaResponse::new( *status, body))
    }
}

fn config (sources: &[(&str,NaiveDate)])->FirmsArchiveConfig {
    FirmsArchiveConfig {
        base_url: "http://localhost:9999".to_string(),
        map_key: Some("0123456789abcdef".to_string()),
        bounds: BoundingBox::new( -125.0, 24.0, -66.0, 50.0),
        output_dir: PathBuf::from("unused"),
        file_prefix: "firms_".to_string(),
        day_span: 10,
        sources: sources.iter().map( |(id,earliest)| FirmsSource::new( id, *earliest)).collect(),
        pacing_delay: Duration::ZERO,
        retry: RetryPolicy { max_retries: 2, base_delay: Duration::ZERO, max_delay: Duration::ZERO },
        request_timeout: secs(10),
        rebuild_empty: false,
        force: false,
        start: None,
        end: None,
        months: None,
    }
}

fn stored_frps (archive: &MonthArchive<MemStore>, month: &YearMonth)->Vec<f64> {
    let data = archive.store().read( &archive.key(month)).unwrap().unwrap();
    match GeoJson::from_str( std::str::from_utf8(&data).unwrap()).unwrap() {
        GeoJson::FeatureCollection(fc) => fc.features.iter()
            .filter_map( |f| f.property("frp").and_then(|v| v.as_f64()))
            .collect(),
        other => panic!("not a feature collection: {}", other)
    }
}

#[tokio::test]
async fn test_cross_source_dedup() {
    let config = config( &[("VIIRS_SNPP_SP", date(2012,1,20)), ("VIIRS_SNPP_NRT", date(2012,1,20))]);
    let query = MockArea::new(200)
        .with( "VIIRS_SNPP_SP", date(2024,7,1), 200, format!("{HEADER}37.12341,-120.54321,2024-07-03,951,N,VIIRS,5.2\n"))
        .with( "VIIRS_SNPP_NRT", date(2024,7,1), 200, format!("{HEADER}37.123412,-120.543212,2024-07-03,0951,N,VIIRS,9.9\n"));
    let archive = MonthArchive::new( MemStore::new(), "firms_");

    let report = MonthAssembler::new( &config, &query, &archive).assemble( month(2024,7)).await.unwrap();
    println!("{:?}", report);

    assert_eq!( report.decision, MonthDecision::Written(1));
    assert_eq!( report.n_requests, 8); // 2 sources x 4 windows
    assert_eq!( stored_frps( &archive, &month(2024,7)), vec![5.2]);
    assert_eq!( archive.store().keys(), vec!["firms_2024-07.geojson".to_string()]);
}

#[tokio::test]
async fn test_all_rate_limited_defers() {
    let config = config( &[("MODIS_SP", date(2000,11,1)), ("VIIRS_SNPP_SP", date(2012,1,20))]);
    let query = MockArea::new(429);
    let archive = MonthArchive::new( MemStore::new(), "firms_");

    let report = MonthAssembler::new( &config, &query, &archive).assemble( month(2023,2)).await.unwrap();
    println!("{:?}", report);

    assert_eq!( report.decision, MonthDecision::Deferred( DeferReason::RateLimited));
    assert_eq!( report.rate_limited_sources, vec!["MODIS_SP".to_string(), "VIIRS_SNPP_SP".to_string()]);
    assert_eq!( report.n_requests, 12); // 2 sources x 3 windows x 2 attempts
    assert!( archive.store().is_empty());
}

#[tokio::test]
async fn test_deferred_month_keeps_existing_output() {
    let mut config = config( &[("MODIS_SP", date(2000,11,1))]);
    config.rebuild_empty = true;
    let query = MockArea::new(403);
    let archive = MonthArchive::new( MemStore::new(), "firms_");
    archive.write( &month(2023,2), &[]).unwrap();
    let before = archive.store().read( &archive.key(&month(2023,2))).unwrap();

    let report = MonthAssembler::new( &config, &query, &archive).assemble( month(2023,2)).await.unwrap();
    assert!( matches!( report.decision, MonthDecision::Deferred(_)));
    assert_eq!( archive.store().read( &archive.key(&month(2023,2))).unwrap(), before);
}

#[tokio::test]
async fn test_rate_limited_with_hotspots_writes() {
    let config = config( &[("MODIS_SP", date(2000,11,1)), ("VIIRS_SNPP_SP", date(2012,1,20))]);
    let query = MockArea::new(429)
        .with( "VIIRS_SNPP_SP", date(2024,6,11), 200, format!("{HEADER}40.0,-100.0,2024-06-12,1200,N,VIIRS,3.0\n"));
    let archive = MonthArchive::new( MemStore::new(), "firms_");

    let report = MonthAssembler::new( &config, &query, &archive).assemble( month(2024,6)).await.unwrap();
    assert_eq!( report.decision, MonthDecision::Written(1));
    assert_eq!( report.rate_limited_sources, vec!["MODIS_SP".to_string(), "VIIRS_SNPP_SP".to_string()]);
}

#[tokio::test]
async fn test_no_detections_writes_empty() {
    let config = config( &[("MODIS_SP", date(2000,11,1))]);
    let query = MockArea::new(200);
    let archive = MonthArchive::new( MemStore::new(), "firms_");

    let report = MonthAssembler::new( &config, &query, &archive).assemble( month(2024,6)).await.unwrap();
    assert_eq!( report.decision, MonthDecision::Written(0));
    assert_eq!( archive.existing( &month(2024,6)), ExistingOutput::Features(0));
}

#[tokio::test]
async fn test_existing_output_policy() {
    let mut config = config( &[("MODIS_SP", date(2000,11,1))]);
    let query = MockArea::new(200)
        .with( "MODIS_SP", date(2024,6,1), 200, format!("{HEADER}40.0,-100.0,2024-06-02,1200,Aqua,MODIS,3.0\n"));
    let archive = MonthArchive::new( MemStore::new(), "firms_");
    let m = month(2024,6);

    // empty output is kept without rebuild_empty
    archive.write( &m, &[]).unwrap();
    let report = MonthAssembler::new( &config, &query, &archive).assemble(m).await.unwrap();
    assert_eq!( report.decision, MonthDecision::Skipped( SkipReason::ExistsEmpty));
    assert!( query.calls().is_empty());

    // .. and re-fetched with it
    config.rebuild_empty = true;
    let report = MonthAssembler::new( &config, &query, &archive).assemble(m).await.unwrap();
    assert_eq!( report.decision, MonthDecision::Written(1));
    assert_eq!( query.calls().len(), 3);

    // outputs with features are kept unless forced
    let report = MonthAssembler::new( &config, &query, &archive).assemble(m).await.unwrap();
    assert_eq!( report.decision, MonthDecision::Skipped( SkipReason::Exists(1)));
    assert_eq!( query.calls().len(), 3);

    config.force = true;
    let report = MonthAssembler::new( &config, &query, &archive).assemble(m).await.unwrap();
    assert_eq!( report.decision, MonthDecision::Written(1));
    assert_eq!( query.calls().len(), 6);
}

#[tokio::test]
async fn test_unreadable_output_is_rebuilt() {
    let config = config( &[("MODIS_SP", date(2000,11,1))]);
    let query = MockArea::new(200);
    let archive = MonthArchive::new( MemStore::new(), "firms_");
    let m = month(2024,6);

    archive.store().write( &archive.key(&m), b"{ \"type\": \"FeatureColl").unwrap();
    assert_eq!( archive.existing(&m), ExistingOutput::Unreadable);

    let report = MonthAssembler::new( &config, &query, &archive).assemble(m).await.unwrap();
    assert_eq!( report.decision, MonthDecision::Written(0));
    assert_eq!( archive.existing(&m), ExistingOutput::Features(0));
}

#[tokio::test]
async fn test_source_coverage() {
    let late = FirmsSource::new( "VIIRS_NOAA21_NRT", date(2024,7,15));
    let mut retired = FirmsSource::new( "VIIRS_NOAA20_NRT", date(2018,4,1));
    retired.latest = Some( date(2024,6,30));

    let mut config = config( &[("MODIS_SP", date(2000,11,1)), ("FUTURE_SP", date(2030,1,1))]);
    config.sources.push( late);
    config.sources.push( retired);

    let query = MockArea::new(200);
    let archive = MonthArchive::new( MemStore::new(), "firms_");
    MonthAssembler::new( &config, &query, &archive).assemble( month(2024,7)).await.unwrap();

    let calls = query.calls();
    for c in &calls { println!("{:?}", c) }

    assert_eq!( calls.iter().filter( |c| c.0 == "MODIS_SP").count(), 4);
    assert!( !calls.iter().any( |c| c.0 == "FUTURE_SP" || c.0 == "VIIRS_NOAA20_NRT"));

    // the first window ends before the source starts
    let late_starts: Vec<NaiveDate> = calls.iter().filter( |c| c.0 == "VIIRS_NOAA21_NRT").map( |c| c.1).collect();
    assert_eq!( late_starts, vec![date(2024,7,11), date(2024,7,21), date(2024,7,31)]);
}

#[tokio::test]
async fn test_failed_window_is_skipped() {
    let config = config( &[("MODIS_SP", date(2000,11,1))]);
    let query = MockArea::new(200)
        .with( "MODIS_SP", date(2024,6,1), 500, "server error".to_string())
        .with( "MODIS_SP", date(2024,6,11), 200, format!("{HEADER}40.0,-100.0,2024-06-12,1200,Aqua,MODIS,3.0\n"));
    let archive = MonthArchive::new( MemStore::new(), "firms_");

    let report = MonthAssembler::new( &config, &query, &archive).assemble( month(2024,6)).await.unwrap();
    assert_eq!( report.decision, MonthDecision::Written(1));
    assert_eq!( report.n_failed_windows, 1);
    assert_eq!( report.n_requests, 3);
}

#[test]
fn test_skip_reason() {
    assert_eq!( skip_reason( ExistingOutput::Missing, false, false), None);
    assert_eq!( skip_reason( ExistingOutput::Unreadable, false, false), None);
    assert_eq!( skip_reason( ExistingOutput::Features(0), false, false), Some(SkipReason::ExistsEmpty));
    assert_eq!( skip_reason( ExistingOutput::Features(0), true, false), None);
    assert_eq!( skip_reason( ExistingOutput::Features(3), true, false), Some(SkipReason::Exists(3)));
    assert_eq!( skip_reason( ExistingOutput::Features(3), false, true), None);
}

#[tokio::test]
async fn test_run_months() {
    let config = config( &[("MODIS_SP", date(2000,11,1))]);
    let query = MockArea::new(200)
        .with( "MODIS_SP", date(2024,5,21), 200, format!("{HEADER}40.0,-100.0,2024-05-22,1200,Aqua,MODIS,3.0\n"))
        .with( "MODIS_SP", date(2024,7,1), 429, String::new())
        .with( "MODIS_SP", date(2024,7,11), 429, String::new())
        .with( "MODIS_SP", date(2024,7,21), 429, String::new())
        .with( "MODIS_SP", date(2024,7,31), 429, String::new());
    let archive = MonthArchive::new( MemStore::new(), "firms_");
    archive.write( &month(2024,4), &[]).unwrap();

    let selection = MonthSelection::Range( month(2024,4), month(2024,7));
    let summary = run_months( &config, &query, &archive, &selection).await.unwrap();
    println!("{:?}", summary);

    assert_eq!( summary.written, vec![month(2024,5), month(2024,6)]);
    assert_eq!( summary.skipped, vec![month(2024,4)]);
    assert_eq!( summary.deferred, vec![month(2024,7)]);
    assert_eq!( summary.n_hotspots, 1);
    assert_eq!( archive.store().len(), 3);
}

#[tokio::test]
async fn test_run_aborts_on_error() {
    let mut config = config( &[("MODIS_SP", date(2000,11,1))]);
    config.day_span = 0;
    let query = MockArea::new(200);
    let archive = MonthArchive::new( MemStore::new(), "firms_");

    let selection = MonthSelection::List( vec![month(2024,1), month(2024,2)]);
    assert!( run_months( &config, &query, &archive, &selection).await.is_err());
    assert!( query.calls().is_empty());
}
