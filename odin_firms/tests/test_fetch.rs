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

use std::{collections::VecDeque, sync::Mutex, time::Duration};
use async_trait::async_trait;
use chrono::NaiveDate;
use odin_common::{BoundingBox, datetime::secs};
use odin_firms::{
    client::{AreaQuery, AreaResponse},
    config::RetryPolicy,
    errors::{OdinFirmsError, Result},
    fetch::{FetchEvent, FetchOutcome, FetchState, WindowFetcher},
    window::RequestWindow,
};

const CSV: &str = "latitude,longitude,acq_date,acq_time,satellite,instrument,frp\n\
                   37.1,-120.5,2024-07-01,951,N,VIIRS,5.2\n\
                   37.2,-120.6,2024-07-01,952,N,VIIRS,1.1\n";

/// replays a fixed sequence of responses. None is a transport failure
struct ScriptedQuery {
    script: Mutex<VecDeque<Option<(u16,&'static str)>>>,
    n_calls: Mutex<usize>,
}

impl ScriptedQuery {
    fn new (script: Vec<Option<(u16,&'static str)>>)->Self {
        ScriptedQuery { script: Mutex::new( script.into()), n_calls: Mutex::new(0) }
    }
    fn n_calls (&self)->usize { *self.n_calls.lock().unwrap() }
}

#[async_trait]
impl AreaQuery for ScriptedQuery {
    async fn query_area (&self, source: &str, window: &RequestWindow)->Result<AreaResponse> {
        *self.n_calls.lock().unwrap() += 1;
        match self.script.lock().unwrap().pop_front() {
            Some(Some((status,body))) => Ok( AreaResponse::new( status, body)),
            Some(None) => Err( OdinFirmsError::IOError( std::io::Error::new( std::io::ErrorKind::ConnectionReset, "connection reset"))),
            None => panic!("unexpected request {} {}", source, window)
        }
    }
}

fn bounds ()->BoundingBox<f64> { BoundingBox::new( -125.0, 24.0, -66.0, 50.0) }

fn policy (max_retries: u32)->RetryPolicy {
    RetryPolicy { max_retries, base_delay: Duration::ZERO, max_delay: Duration::ZERO }
}

fn window ()->RequestWindow {
    RequestWindow { start: NaiveDate::from_ymd_opt(2024,7,1).unwrap(), span: 10 }
}

#[test]
fn test_transitions() {
    let p = policy(2);
    let b = bounds();

    let s = FetchState::initial();
    assert_eq!( s, FetchState::Attempting(0));
    assert!( !s.is_terminal());

    let s = s.transition( FetchEvent::Response( AreaResponse::new(429,"")), &p, &b).unwrap();
    assert_eq!( s, FetchState::Backoff(0));
    let s = s.transition( FetchEvent::BackoffElapsed, &p, &b).unwrap();
    assert_eq!( s, FetchState::Attempting(1));
    let s = s.transition( FetchEvent::Response( AreaResponse::new(403,"")), &p, &b).unwrap();
    assert_eq!( s, FetchState::Backoff(1));
    let s = s.transition( FetchEvent::BackoffElapsed, &p, &b).unwrap();
    assert_eq!( s, FetchState::Exhausted);
    assert!( s.is_terminal());

    let s = FetchState::Attempting(0).transition( FetchEvent::Response( AreaResponse::new(200, CSV)), &p, &b).unwrap();
    match &s {
        FetchState::Succeeded(hotspots) => assert_eq!( hotspots.len(), 2),
        other => panic!("unexpected state {:?}", other)
    }

    let res = FetchState::Attempting(0).transition( FetchEvent::Response( AreaResponse::new(500,"")), &p, &b);
    assert!( matches!( res, Err(OdinFirmsError::RequestError{ status: 500 })));

    assert!( FetchState::Exhausted.transition( FetchEvent::BackoffElapsed, &p, &b).is_err());
    assert!( FetchState::Attempting(0).transition( FetchEvent::BackoffElapsed, &p, &b).is_err());
}

#[test]
fn test_backoff_delay() {
    let p = RetryPolicy { max_retries: 5, base_delay: secs(20), max_delay: secs(60) };
    let delays: Vec<Duration> = (0..4).map( |n| p.backoff_delay(n)).collect();
    assert_eq!( delays, vec![secs(20), secs(40), secs(60), secs(60)]);

    assert_eq!( policy(0).max_attempts(), 1);
}

#[tokio::test]
async fn test_exhausted() {
    let query = ScriptedQuery::new( vec![Some((429,"")), Some((429,"")), Some((429,"")), Some((429,""))]);
    let p = policy(4);
    let b = bounds();
    let mut fetcher = WindowFetcher::new( &query, &p, Duration::ZERO, &b);

    let outcome = fetcher.fetch( "VIIRS_SNPP_SP", &window()).await.unwrap();
    assert_eq!( outcome, FetchOutcome::Exhausted);
    assert!( outcome.into_hotspots().is_empty());
    assert_eq!( query.n_calls(), 4);
    assert_eq!( fetcher.n_requests(), 4);
}

#[tokio::test]
async fn test_recovery() {
    let query = ScriptedQuery::new( vec![Some((429,"")), Some((403,"")), Some((200,CSV))]);
    let p = policy(4);
    let b = bounds();
    let mut fetcher = WindowFetcher::new( &query, &p, Duration::ZERO, &b);

    let outcome = fetcher.fetch( "VIIRS_SNPP_SP", &window()).await.unwrap();
    println!("{:?}", outcome);
    assert!( !outcome.is_exhausted());
    assert_eq!( outcome.into_hotspots().len(), 2);
    assert_eq!( query.n_calls(), 3);
}

#[tokio::test]
async fn test_fast_fail() {
    let query = ScriptedQuery::new( vec![Some((500,"internal error"))]);
    let p = policy(4);
    let b = bounds();
    let mut fetcher = WindowFetcher::new( &query, &p, Duration::ZERO, &b);

    let res = fetcher.fetch( "VIIRS_SNPP_SP", &window()).await;
    assert!( matches!( res, Err(OdinFirmsError::RequestError{ status: 500 })));
    assert_eq!( query.n_calls(), 1); // not retried

    let query = ScriptedQuery::new( vec![None]);
    let mut fetcher = WindowFetcher::new( &query, &p, Duration::ZERO, &b);
    assert!( fetcher.fetch( "VIIRS_SNPP_SP", &window()).await.is_err());
    assert_eq!( query.n_calls(), 1);
    assert_eq!( fetcher.n_requests(), 1); // failed transports are still requests
}

#[tokio::test]
async fn test_empty_window() {
    let query = ScriptedQuery::new( vec![Some((200,"")), Some((200,"latitude,longitude,acq_date\n"))]);
    let p = policy(4);
    let b = bounds();
    let mut fetcher = WindowFetcher::new( &query, &p, Duration::ZERO, &b);

    assert_eq!( fetcher.fetch( "MODIS_SP", &window()).await.unwrap(), FetchOutcome::Succeeded( vec![]));
    assert_eq!( fetcher.fetch( "MODIS_SP", &window()).await.unwrap(), FetchOutcome::Succeeded( vec![]));
}
