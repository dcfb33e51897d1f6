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

#[allow(unused_macros)]

/// macro to flatten nested "if let .." trees into a single construct, with optional
/// side effects and/or fallback values for failed matches.
///
/// ```
/// use odin_common::if_let;
///
/// let lon: Option<&str> = Some("-121.5");
/// let lat: Option<&str> = Some("38.2");
///
/// let pos = if_let! {
///     Some(lon) = { lon } else { None },
///     Ok(lon) = { lon.parse::<f64>() } else |_| { None },
///     Some(lat) = { lat } else { None },
///     Ok(lat) = { lat.parse::<f64>() } else |_| { None } => {
///         Some((lon,lat))
///     }
/// };
/// assert_eq!( pos, Some((-121.5, 38.2)));
/// ```
///
/// Constraints:
///   - if there is an `else` clause both the match expression and the else clause have to be blocks
///   - non-terminal arms are always separated by ','
///   - `else` closures get the failed match value, which is the whole `Result` or `Option`
#[macro_export]
macro_rules! if_let {
    //--- the leafs
    { $p:pat = $x:block else $e:block => $r:expr } => {
        if let $p = $x { $r } else $e
    };
    { $p:pat = $x:block else $closure:expr => $r:expr } => {
        match $x {
            $p => { $r }
            other => { $closure( other) }
        }
    };
    { $p:pat = $x:expr => $r:expr } => {
        if let $p = $x { $r }
    };

    //--- the recursive tt munchers
    { $p:pat = $x:block else $e:block , $($ts:tt)+ } => {
        if let $p = $x { $crate::if_let! { $($ts)+ } } else $e
    };
    { $p:pat = $x:block else $closure:expr , $($ts:tt)+ } => {
        match $x {
            $p => { $crate::if_let! { $($ts)+ } }
            other => { $closure( other) }
        }
    };
    { $p:pat = $x:expr , $($ts:tt)+ } => {
        if let $p = $x {
            $crate::if_let! { $($ts)+ }
        }
    };
}
pub use if_let;

#[macro_export]
macro_rules! io_error {
    ( $kind:expr, $fmt:literal $(, $($arg:expr),* )? ) =>
    {
        std::io::Error::new( $kind, format!($fmt, $( $($arg),* )?))
    }
}
pub use io_error;
