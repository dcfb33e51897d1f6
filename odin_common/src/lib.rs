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
use serde::{Serialize,Deserialize};
use num::{Num,ToPrimitive};

pub mod macros;
pub mod fs;
pub mod datetime;

/// a generic bounding box without semantics for the coordinate type
#[repr(C)]
#[derive(Debug,Copy,Clone,Serialize,Deserialize,PartialEq)]
pub struct BoundingBox <T: Num> {
    pub west: T,
    pub south: T,
    pub east: T,
    pub north: T
}

impl <T: Num + Copy + PartialOrd + ToPrimitive> BoundingBox<T> {
    pub fn new(west: T, south: T, east: T, north: T)->Self {
        BoundingBox{ west, south, east, north}
    }

    /// a box is only usable if its bounds are strictly ordered
    pub fn is_valid (&self) -> bool {
        self.west < self.east && self.south < self.north
    }
}

impl BoundingBox<f64> {
    /// inclusive containment test for geodetic degrees. Non-finite coordinates are never inside
    pub fn contains_lon_lat (&self, lon: f64, lat: f64) -> bool {
        lon.is_finite() && lat.is_finite()
            && lon >= self.west && lon <= self.east
            && lat >= self.south && lat <= self.north
    }
}

/// the "west,south,east,north" notation used by area query APIs
impl <T: Num + fmt::Display> fmt::Display for BoundingBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}
