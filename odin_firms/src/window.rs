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
use chrono::{NaiveDate, TimeDelta};
use odin_common::datetime::YearMonth;
use crate::errors::{config_error, Result};

/// the FIRMS area API only accepts full day ranges of 1..10 days
pub const MAX_DAY_SPAN: u32 = 10;

/// one area request time range: `span` full days starting at `start`
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct RequestWindow {
    pub start: NaiveDate,
    pub span: u32,
}

impl RequestWindow {
    /// the last day covered by this window
    pub fn end (&self)->NaiveDate {
        self.start + TimeDelta::days( self.span.saturating_sub(1) as i64)
    }
}

impl fmt::Display for RequestWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}d", self.start.format("%Y-%m-%d"), self.span)
    }
}

/// partition the days of the given month into consecutive windows of `max_span` days.
/// The last window is truncated to the remaining days of the month
pub fn plan_windows (month: YearMonth, max_span: u32)->Result<Vec<RequestWindow>> {
    if max_span == 0 || max_span > MAX_DAY_SPAN {
        return Err( config_error!("day span {} outside 1..={}", max_span, MAX_DAY_SPAN))
    }

    let n_days = month.n_days();
    let mut windows = Vec::with_capacity( n_days.div_ceil(max_span) as usize);
    let mut day = 1;

    while day <= n_days {
        let span = max_span.min( n_days - day + 1);
        if let Some(start) = month.day(day) {
            windows.push( RequestWindow{ start, span });
        }
        day += span;
    }

    Ok(windows)
}
