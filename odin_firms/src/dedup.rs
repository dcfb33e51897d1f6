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

use chrono::NaiveDate;
use indexmap::{IndexMap, map::Entry};
use crate::hotspot::FirmsHotspot;

/// coordinate resolution of the identity key (1e-4 deg, roughly 11m)
const KEY_SCALE: f64 = 10_000.0;

/// identity of a physical detection. Different sources (e.g. SP and NRT products of the same
/// satellite) report the same detection with slightly different coordinate formatting, hence we
/// compare positions rounded to 4 decimals
#[derive(Debug,Clone,PartialEq,Eq,Hash,PartialOrd,Ord)]
pub struct HotspotKey {
    lon: i64,
    lat: i64,
    date: Option<NaiveDate>,
    time: Option<String>,
    instrument: Option<String>,
    satellite: Option<String>,
}

impl HotspotKey {
    pub fn new (hs: &FirmsHotspot)->Self {
        HotspotKey {
            lon: round_coord( hs.lon),
            lat: round_coord( hs.lat),
            date: hs.acq_date,
            time: hs.acq_time.clone(),
            instrument: hs.instrument.clone(),
            satellite: hs.satellite.clone(),
        }
    }
}

#[inline]
fn round_coord (deg: f64)->i64 {
    (deg * KEY_SCALE).round() as i64
}

/// the deduplicating hotspot accumulator for one month. The first hotspot we see for a given
/// key is kept, later ones with the same key are dropped. Iteration is in insertion order
#[derive(Debug,Default)]
pub struct MonthBucket {
    hotspots: IndexMap<HotspotKey,FirmsHotspot>
}

impl MonthBucket {
    pub fn new ()->Self { MonthBucket::default() }

    /// add hotspot if we don't have its key yet. Returns true if it was added
    pub fn fold (&mut self, hs: FirmsHotspot)->bool {
        match self.hotspots.entry( HotspotKey::new(&hs)) {
            Entry::Vacant(e) => { e.insert(hs); true }
            Entry::Occupied(_) => false
        }
    }

    /// fold all hotspots and return the number of added ones
    pub fn fold_all (&mut self, hotspots: impl IntoIterator<Item=FirmsHotspot>)->usize {
        let mut n_added = 0;
        for hs in hotspots {
            if self.fold(hs) { n_added += 1 }
        }
        n_added
    }

    pub fn len (&self)->usize { self.hotspots.len() }
    pub fn is_empty (&self)->bool { self.hotspots.is_empty() }

    pub fn into_hotspots (self)->Vec<FirmsHotspot> {
        self.hotspots.into_values().collect()
    }
}
