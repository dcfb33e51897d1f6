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

//! the retrying fetcher for a single (source, window) area request.
//!
//! Each request is driven by an explicit state machine:
//! ```text
//!   Attempting(0) --ok--> Succeeded(hotspots)
//!        |
//!   rate limited
//!        v
//!   Backoff(n) --elapsed--> Attempting(n+1)   if n+1 < max attempts
//!              --elapsed--> Exhausted         otherwise
//! ```
//! Responses with other non-2xx status are errors and are not retried.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use odin_common::BoundingBox;
use crate::{
    client::{AreaQuery, AreaResponse},
    config::RetryPolicy,
    errors::{op_failed, OdinFirmsError, Result},
    hotspot::{normalize, read_csv_records, FirmsHotspot},
    window::RequestWindow,
};

#[derive(Debug,Clone,PartialEq)]
pub enum FetchState {
    /// about to issue attempt n (0-based)
    Attempting(u32),
    /// attempt n was rate limited, waiting for backoff delay
    Backoff(u32),
    Succeeded(Vec<FirmsHotspot>),
    Exhausted,
}

#[derive(Debug,Clone,PartialEq)]
pub enum FetchEvent {
    Response(AreaResponse),
    BackoffElapsed,
}

impl FetchState {
    pub fn initial ()->Self { FetchState::Attempting(0) }

    pub fn is_terminal (&self)->bool {
        matches!( self, FetchState::Succeeded(_) | FetchState::Exhausted)
    }

    /// the pure transition function. Returns an error for non rate limit failures and for events
    /// that are not valid in the current state
    pub fn transition (self, event: FetchEvent, policy: &RetryPolicy, bounds: &BoundingBox<f64>)->Result<FetchState> {
        use FetchState::*;

        match (self, event) {
            (Attempting(n), FetchEvent::Response(response)) => {
                if response.is_success() {
                    Ok( Succeeded( parse_hotspots( &response.body, bounds)?))
                } else if response.is_rate_limited() {
                    Ok( Backoff(n))
                } else {
                    Err( OdinFirmsError::RequestError{ status: response.status })
                }
            }
            (Backoff(n), FetchEvent::BackoffElapsed) => {
                if n + 1 < policy.max_attempts() { Ok( Attempting(n+1)) } else { Ok( Exhausted) }
            }
            (state, event) => Err( op_failed!("invalid fetch transition {:?} on {:?}", state, event))
        }
    }
}

/// parse a CSV response body into in-bounds hotspots. An empty body means no data for this window
pub fn parse_hotspots (body: &str, bounds: &BoundingBox<f64>)->Result<Vec<FirmsHotspot>> {
    if body.trim().is_empty() { return Ok( Vec::new()) }

    let records = read_csv_records( body.as_bytes())?;
    Ok( records.iter().filter_map( |rec| normalize( rec, bounds)).collect())
}

/// the terminal result of a window fetch
#[derive(Debug,Clone,PartialEq)]
pub enum FetchOutcome {
    Succeeded(Vec<FirmsHotspot>),
    /// still rate limited after all attempts. Counts as an empty result
    Exhausted,
}

impl FetchOutcome {
    pub fn is_exhausted (&self)->bool { matches!( self, FetchOutcome::Exhausted) }

    pub fn into_hotspots (self)->Vec<FirmsHotspot> {
        match self {
            FetchOutcome::Succeeded(hotspots) => hotspots,
            FetchOutcome::Exhausted => Vec::new()
        }
    }
}

/// runs the fetch state machine against an `AreaQuery`, one request at a time
pub struct WindowFetcher<'a,Q: AreaQuery> {
    query: &'a Q,
    policy: &'a RetryPolicy,
    pacing_delay: Duration,
    bounds: &'a BoundingBox<f64>,
    n_requests: usize,
}

impl<'a,Q: AreaQuery> WindowFetcher<'a,Q> {
    pub fn new (query: &'a Q, policy: &'a RetryPolicy, pacing_delay: Duration, bounds: &'a BoundingBox<f64>)->Self {
        WindowFetcher { query, policy, pacing_delay, bounds, n_requests: 0 }
    }

    /// number of requests issued so far
    pub fn n_requests (&self)->usize { self.n_requests }

    pub async fn fetch (&mut self, source: &str, window: &RequestWindow)->Result<FetchOutcome> {
        let mut state = FetchState::initial();

        loop {
            state = match state {
                FetchState::Attempting(n) => {
                    debug!("requesting {} {} (attempt {})", source, window, n+1);
                    self.n_requests += 1;
                    let response = self.query.query_area( source, window).await?;
                    FetchState::Attempting(n).transition( FetchEvent::Response(response), self.policy, self.bounds)?
                }
                FetchState::Backoff(n) => {
                    let delay = self.policy.backoff_delay(n);
                    warn!("rate limited on {} {} (attempt {}), backing off for {:?}", source, window, n+1, delay);
                    sleep(delay).await;
                    FetchState::Backoff(n).transition( FetchEvent::BackoffElapsed, self.policy, self.bounds)?
                }
                FetchState::Succeeded(hotspots) => {
                    info!("{} {}: {} hotspots", source, window, hotspots.len());
                    if !self.pacing_delay.is_zero() { sleep( self.pacing_delay).await }
                    return Ok( FetchOutcome::Succeeded(hotspots))
                }
                FetchState::Exhausted => {
                    warn!("giving up on {} {} after {} rate limited attempts", source, window, self.policy.max_attempts());
                    return Ok( FetchOutcome::Exhausted)
                }
            }
        }
    }
}
