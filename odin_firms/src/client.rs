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

use async_trait::async_trait;
use reqwest::Client;
use crate::{config::FirmsArchiveConfig, errors::{is_rate_limit_status, Result}, window::RequestWindow};

/// status and body of one area query. Non-2xx responses are not errors at this level since we
/// have to tell rate limiting apart from other failures
#[derive(Debug,Clone,PartialEq)]
pub struct AreaResponse {
    pub status: u16,
    pub body: String,
}

impl AreaResponse {
    pub fn new (status: u16, body: impl ToString)->Self {
        AreaResponse { status, body: body.to_string() }
    }

    pub fn is_success (&self)->bool { (200..300).contains( &self.status) }

    pub fn is_rate_limited (&self)->bool { is_rate_limit_status( self.status) }
}

/// the upstream area query boundary: one request for one source and one time window.
/// Transport errors are returned as `Err`, everything that has a status as `AreaResponse`
#[async_trait]
pub trait AreaQuery: Send + Sync {
    async fn query_area (&self, source: &str, window: &RequestWindow)->Result<AreaResponse>;
}

/// the FIRMS area API client
pub struct FirmsClient {
    client: Client,
    base_url: String,
    map_key: String,  // never log this
    area: String,     // "west,south,east,north"
}

impl FirmsClient {
    pub fn new (config: &FirmsArchiveConfig)->Result<Self> {
        let client = Client::builder().timeout( config.request_timeout).build()?;
        Ok( FirmsClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            map_key: config.map_key()?.to_string(),
            area: config.bounds.to_string()
        })
    }

    /// according to https://firms.modaps.eosdis.nasa.gov/api/area/
    ///   [BASE_URL]/api/area/csv/[MAP_KEY]/[SOURCE]/[AREA_COORDINATES]/[DAY_RANGE]/[DATE]
    /// e.g. /api/area/csv/0123456789abcdef/VIIRS_NOAA21_NRT/-126,21,-66,50/10/2025-04-01
    pub fn request_url (&self, source: &str, window: &RequestWindow)->String {
        format!( "{}/api/area/csv/{}/{}/{}/{}/{}",
                 self.base_url, self.map_key, source, self.area, window.span, window.start.format("%Y-%m-%d"))
    }
}

#[async_trait]
impl AreaQuery for FirmsClient {
    async fn query_area (&self, source: &str, window: &RequestWindow)->Result<AreaResponse> {
        // reqwest errors carry the request url, which contains the map key
        let url = self.request_url( source, window);
        let response = self.client.get( &url).send().await.map_err( |e| e.without_url())?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err( |e| e.without_url())?;

        Ok( AreaResponse { status, body } )
    }
}
