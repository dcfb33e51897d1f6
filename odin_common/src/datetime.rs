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

use chrono::{Datelike, NaiveDate};
use serde::{Serialize,Deserialize,Serializer,Deserializer,de::{Error as DeError}};
use std::{fmt, str::FromStr, time::Duration};
use parse_duration::parse;

#[inline] pub fn millis (n: u64)->Duration { Duration::from_millis(n) }
#[inline] pub fn secs (n: u64)->Duration { Duration::from_secs(n) }

pub fn is_leap_year (year: i32)->bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// number of calendar days in given month, None if month is not in 1..=12
pub fn days_in_month (year: i32, month: u32)->Option<u32> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 => Some( if is_leap_year(year) { 29 } else { 28 }),
        _ => None
    }
}

/* #region YearMonth ********************************************************************************************/

/// a calendar month, displayed and parsed as "YYYY-MM"
#[derive(Debug,Clone,Copy,PartialEq,Eq,PartialOrd,Ord,Hash)]
pub struct YearMonth {
    year: i32,
    month: u32
}

impl YearMonth {
    pub fn new (year: i32, month: u32)->Option<Self> {
        if (1..=12).contains(&month) && (0..=9999).contains(&year) { Some( YearMonth{year,month} ) } else { None }
    }

    pub fn of_date (date: NaiveDate)->Self {
        YearMonth { year: date.year(), month: date.month() }
    }

    #[inline] pub fn year (&self)->i32 { self.year }
    #[inline] pub fn month (&self)->u32 { self.month }

    pub fn n_days (&self)->u32 {
        days_in_month( self.year, self.month).unwrap_or(0) // month is checked on construction
    }

    pub fn day (&self, day: u32)->Option<NaiveDate> {
        NaiveDate::from_ymd_opt( self.year, self.month, day)
    }

    pub fn first_day (&self)->NaiveDate {
        NaiveDate::from_ymd_opt( self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day (&self)->NaiveDate {
        NaiveDate::from_ymd_opt( self.year, self.month, self.n_days()).unwrap_or(NaiveDate::MAX)
    }

    /// the following month
    pub fn succ (&self)->Self {
        if self.month == 12 { YearMonth{ year: self.year+1, month: 1 } } else { YearMonth{ year: self.year, month: self.month+1 } }
    }

    /// all months between start and end, both inclusive. Empty if start > end
    pub fn range_inclusive (start: YearMonth, end: YearMonth)->Vec<YearMonth> {
        let mut months = Vec::new();
        let mut ym = start;
        while ym <= end {
            months.push(ym);
            ym = ym.succ();
        }
        months
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug,Clone,PartialEq)]
pub struct ParseYearMonthError(String);

impl fmt::Display for ParseYearMonthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a YYYY-MM month: '{}'", self.0)
    }
}

impl std::error::Error for ParseYearMonthError {}

impl FromStr for YearMonth {
    type Err = ParseYearMonthError;

    fn from_str (s: &str)->Result<Self,Self::Err> {
        let err = || ParseYearMonthError(s.to_string());
        let s = s.trim();
        let (y,m) = s.split_once('-').ok_or_else(err)?;
        if y.len() != 4 || m.is_empty() || m.len() > 2 { return Err(err()) }

        let year: i32 = y.parse().map_err(|_| err())?;
        let month: u32 = m.parse().map_err(|_| err())?;
        YearMonth::new( year, month).ok_or_else(err)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        serializer.serialize_str( &self.to_string())
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err( |e: ParseYearMonthError| DeError::custom(e.to_string()))
    }
}

/* #endregion YearMonth */

//--- support for serde

pub fn deserialize_duration <'a,D>(deserializer: D) -> Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| DeError::custom(format!("{:?}",e)))
    })
}

pub fn serialize_duration<S: Serializer> (dur: &Duration, s: S) -> Result<S::Ok, S::Error>  {
    let dfm = format!("{:?}", dur);
    s.serialize_str(&dfm)
}
