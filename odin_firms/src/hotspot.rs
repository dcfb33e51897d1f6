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

//! hotspot records as we get them from FIRMS (CSV rows) or from previously stored/exported
//! point data (GeoJSON features or flat JSON objects), and their normalized form.
//! Field descriptions are on https://www.earthdata.nasa.gov/data/instruments/viirs/viirs-i-band-375-m-active-fire-data

use std::{collections::HashMap, io};
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use geojson::{Feature, Geometry, JsonObject, Value as GeoValue};
use odin_common::{BoundingBox, if_let};
use crate::errors::Result;

// known spellings of the same logical field, lower case. First non-empty one wins
pub const LAT_FIELDS: &[&str] = &["latitude", "lat", "y"];
pub const LON_FIELDS: &[&str] = &["longitude", "lon", "lng", "long", "x"];
pub const DATE_FIELDS: &[&str] = &["acq_date", "acqdate", "date", "acquisition_date"];
pub const TIME_FIELDS: &[&str] = &["acq_time", "acqtime", "time", "acquisition_time"];
pub const SATELLITE_FIELDS: &[&str] = &["satellite", "sat"];
pub const INSTRUMENT_FIELDS: &[&str] = &["instrument", "sensor"];
pub const CONFIDENCE_FIELDS: &[&str] = &["confidence", "conf"];
pub const FRP_FIELDS: &[&str] = &["frp", "fire_radiative_power"];
pub const DAYNIGHT_FIELDS: &[&str] = &["daynight", "day_night"];
pub const VERSION_FIELDS: &[&str] = &["version", "processing_version"];

/* #region RawRecord ********************************************************************************************/

/// an untyped upstream record: field name (lower case) -> trimmed text value
#[derive(Debug,Clone,Default,PartialEq)]
pub struct RawRecord {
    fields: HashMap<String,String>
}

impl RawRecord {
    pub fn new ()->Self { RawRecord::default() }

    pub fn insert (&mut self, name: &str, value: impl AsRef<str>) {
        self.fields.insert( name.trim().to_lowercase(), value.as_ref().trim().to_string());
    }

    /// value of the first alias that is present and not empty
    pub fn get (&self, aliases: &[&str])->Option<&str> {
        aliases.iter()
            .filter_map( |a| self.fields.get(*a))
            .map( |v| v.as_str())
            .find( |v| !v.is_empty())
    }

    pub fn len (&self)->usize { self.fields.len() }
    pub fn is_empty (&self)->bool { self.fields.is_empty() }

    /// a GeoJSON point feature (coordinates override same-named properties) or a flat JSON object.
    /// Returns None for anything else
    pub fn from_json (value: &JsonValue)->Option<Self> {
        let obj = value.as_object()?;
        let mut rec = RawRecord::new();

        let is_feature = obj.get("type").and_then( |t| t.as_str()) == Some("Feature");

        if is_feature || obj.contains_key("properties") {
            if let Some(props) = obj.get("properties").and_then( |p| p.as_object()) {
                insert_scalars( &mut rec, props.iter());
            }

            if_let! {
                Some(coords) = obj.get("geometry").and_then( |g| g.get("coordinates")).and_then( |c| c.as_array()),
                Some(lon) = coords.first().and_then( |v| v.as_f64()),
                Some(lat) = coords.get(1).and_then( |v| v.as_f64()) => {
                    rec.insert( "longitude", lon.to_string());
                    rec.insert( "latitude", lat.to_string());
                }
            }
        } else {
            insert_scalars( &mut rec, obj.iter());
        }

        if rec.is_empty() { None } else { Some(rec) }
    }
}

impl <K,V> FromIterator<(K,V)> for RawRecord where K: AsRef<str>, V: AsRef<str> {
    fn from_iter<I: IntoIterator<Item=(K,V)>>(iter: I) -> Self {
        let mut rec = RawRecord::new();
        for (k,v) in iter { rec.insert( k.as_ref(), v); }
        rec
    }
}

fn insert_scalars<'a> (rec: &mut RawRecord, entries: impl Iterator<Item=(&'a String,&'a JsonValue)>) {
    for (k,v) in entries {
        match v {
            JsonValue::String(s) => rec.insert( k, s),
            JsonValue::Number(n) => rec.insert( k, n.to_string()),
            JsonValue::Bool(b) => rec.insert( k, b.to_string()),
            _ => {} // null, arrays and objects are not hotspot fields
        }
    }
}

/// read all rows of delimited text with a header row. Rows that can't be read are skipped,
/// an empty input yields no records
pub fn read_csv_records (reader: impl io::Read)->Result<Vec<RawRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut records = Vec::new();

    for res in csv_reader.records() {
        if let Ok(row) = res {
            let rec: RawRecord = headers.iter().zip( row.iter()).collect();
            if !rec.is_empty() { records.push(rec) }
        }
    }
    Ok(records)
}

/// all records of a JSON document, which can be a GeoJSON FeatureCollection, a single Feature,
/// an array of features/objects or a single flat object
pub fn json_records (value: &JsonValue)->Vec<RawRecord> {
    match value {
        JsonValue::Array(items) => items.iter().filter_map( RawRecord::from_json).collect(),
        JsonValue::Object(obj) => {
            if let Some(features) = obj.get("features").and_then( |f| f.as_array()) {
                features.iter().filter_map( RawRecord::from_json).collect()
            } else {
                RawRecord::from_json(value).into_iter().collect()
            }
        }
        _ => Vec::new()
    }
}

/* #endregion RawRecord */

/* #region FirmsHotspot ****************************************************************************************/

/// the normalized hotspot. Everything besides the position is optional since historical
/// products and exports do not all have the same fields
#[derive(Debug,Clone,PartialEq)]
pub struct FirmsHotspot {
    pub lon: f64,
    pub lat: f64,
    pub acq_date: Option<NaiveDate>,
    pub acq_time: Option<String>, // "HHMM" (UTC)
    pub satellite: Option<String>,
    pub instrument: Option<String>,
    pub confidence: Option<String>, // VIIRS uses l,n,h - MODIS 0..100
    pub frp: Option<f64>,           // MW
    pub daynight: Option<String>,
    pub version: Option<String>,
}

impl FirmsHotspot {
    pub fn new (lon: f64, lat: f64)->Self {
        FirmsHotspot {
            lon, lat,
            acq_date: None, acq_time: None, satellite: None, instrument: None,
            confidence: None, frp: None, daynight: None, version: None
        }
    }

    /// GeoJSON point feature with all available fields as properties
    pub fn to_feature (&self)->Feature {
        let mut props = JsonObject::new();

        if let Some(date) = &self.acq_date { props.insert( "acq_date".into(), date.format("%Y-%m-%d").to_string().into()); }
        if let Some(time) = &self.acq_time { props.insert( "acq_time".into(), time.as_str().into()); }
        if let Some(sat) = &self.satellite { props.insert( "satellite".into(), sat.as_str().into()); }
        if let Some(inst) = &self.instrument { props.insert( "instrument".into(), inst.as_str().into()); }
        if let Some(conf) = &self.confidence { props.insert( "confidence".into(), conf.as_str().into()); }
        if let Some(frp) = self.frp { props.insert( "frp".into(), frp.into()); }
        if let Some(dn) = &self.daynight { props.insert( "daynight".into(), dn.as_str().into()); }
        if let Some(version) = &self.version { props.insert( "version".into(), version.as_str().into()); }

        Feature {
            bbox: None,
            geometry: Some( Geometry::new( GeoValue::Point( vec![self.lon, self.lat]))),
            id: None,
            properties: Some(props),
            foreign_members: None
        }
    }
}

/// map a raw record into a FirmsHotspot. Rejects records without finite coordinates or
/// with a position outside of `bounds`. Missing or unparseable optional fields are left out
pub fn normalize (raw: &RawRecord, bounds: &BoundingBox<f64>)->Option<FirmsHotspot> {
    if_let! {
        Some(lon) = { raw.get(LON_FIELDS).and_then(parse_finite) } else { None },
        Some(lat) = { raw.get(LAT_FIELDS).and_then(parse_finite) } else { None },
        true = { bounds.contains_lon_lat( lon, lat) } else { None } => {
            Some( FirmsHotspot {
                lon, lat,
                acq_date: raw.get(DATE_FIELDS).and_then(parse_date),
                acq_time: raw.get(TIME_FIELDS).and_then(normalize_time),
                satellite: raw.get(SATELLITE_FIELDS).map(String::from),
                instrument: raw.get(INSTRUMENT_FIELDS).map(String::from),
                confidence: raw.get(CONFIDENCE_FIELDS).map(String::from),
                frp: raw.get(FRP_FIELDS).and_then(parse_finite),
                daynight: raw.get(DAYNIGHT_FIELDS).map(String::from),
                version: raw.get(VERSION_FIELDS).map(String::from),
            })
        }
    }
}

//--- field parsers

pub fn parse_finite (s: &str)->Option<f64> {
    s.trim().parse::<f64>().ok().filter( |v| v.is_finite())
}

/// FIRMS uses "YYYY-MM-DD", older exports also have "YYYY/MM/DD", "YYYYMMDD" or full timestamps
pub fn parse_date (s: &str)->Option<NaiveDate> {
    let s = s.trim();
    ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"].iter()
        .find_map( |fmt| NaiveDate::parse_from_str( s, fmt).ok())
        .or_else( || s.get(..10).and_then( |d| NaiveDate::parse_from_str( d, "%Y-%m-%d").ok()))
}

/// acquisition times come as "312", "0312", "03:12" or 312.0 (from JSON) - all are turned into "0312".
/// Anything we can't interpret as HHMM is kept verbatim
pub fn normalize_time (s: &str)->Option<String> {
    let s = s.trim();
    if s.is_empty() { return None }

    let digits = s.replace(':', "");
    let hhmm = digits.parse::<u32>().ok()
        .or_else( || digits.parse::<f64>().ok().filter( |v| v.fract() == 0.0 && *v >= 0.0).map( |v| v as u32));

    match hhmm {
        Some(t) if t / 100 < 24 && t % 100 < 60 => Some( format!("{:04}", t)),
        _ => Some( s.to_string())
    }
}

/* #endregion FirmsHotspot */
