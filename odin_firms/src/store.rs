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

use std::{collections::BTreeMap, path::{Path,PathBuf}, str::FromStr, sync::Mutex};
use geojson::{FeatureCollection, GeoJson};
use odin_common::{datetime::YearMonth, fs::{ensure_writable_dir, existing_file_contents, write_file_atomic}};
use crate::{errors::{op_failed, Result}, hotspot::FirmsHotspot};

/// a key/value blob store for monthly output. Keys are relative file names
pub trait BlobStore {
    /// contents for key, or None if there is no such blob
    fn read (&self, key: &str)->Result<Option<Vec<u8>>>;

    /// replace the blob for key. This has to be all-or-nothing
    fn write (&self, key: &str, data: &[u8])->Result<()>;

    /// human readable location of key (for logging)
    fn location (&self, key: &str)->String;
}

/// blobs are files in a directory
pub struct DirStore {
    dir: PathBuf
}

impl DirStore {
    /// open (and create if necessary) the output directory
    pub fn new (dir: impl AsRef<Path>)->Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        ensure_writable_dir( &dir)?;
        Ok( DirStore { dir } )
    }
}

impl BlobStore for DirStore {
    fn read (&self, key: &str)->Result<Option<Vec<u8>>> {
        Ok( existing_file_contents( &self.dir.join(key))?)
    }

    fn write (&self, key: &str, data: &[u8])->Result<()> {
        Ok( write_file_atomic( self.dir.join(key), data)?)
    }

    fn location (&self, key: &str)->String {
        self.dir.join(key).display().to_string()
    }
}

/// in-memory blobs
#[derive(Default)]
pub struct MemStore {
    blobs: Mutex<BTreeMap<String,Vec<u8>>>
}

impl MemStore {
    pub fn new ()->Self { MemStore::default() }

    pub fn keys (&self)->Vec<String> {
        self.blobs.lock().map( |blobs| blobs.keys().cloned().collect()).unwrap_or_default()
    }

    pub fn len (&self)->usize {
        self.blobs.lock().map( |blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty (&self)->bool { self.len() == 0 }
}

impl BlobStore for MemStore {
    fn read (&self, key: &str)->Result<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().map_err( |_| op_failed!("poisoned blob store"))?;
        Ok( blobs.get(key).cloned())
    }

    fn write (&self, key: &str, data: &[u8])->Result<()> {
        let mut blobs = self.blobs.lock().map_err( |_| op_failed!("poisoned blob store"))?;
        blobs.insert( key.to_string(), data.to_vec());
        Ok(())
    }

    fn location (&self, key: &str)->String {
        format!("mem:{}", key)
    }
}

/// what we already have for a month
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ExistingOutput {
    Missing,
    Features(usize),
    /// there is a blob but it is not a feature collection we can count
    Unreadable,
}

pub fn output_key (prefix: &str, month: &YearMonth)->String {
    format!("{}{}.geojson", prefix, month)
}

/// compact (single line) GeoJSON FeatureCollection in the given order
pub fn encode_feature_collection (hotspots: &[FirmsHotspot])->Result<Vec<u8>> {
    let fc = FeatureCollection {
        bbox: None,
        features: hotspots.iter().map( |hs| hs.to_feature()).collect(),
        foreign_members: None
    };
    Ok( serde_json::to_vec( &fc)?)
}

pub fn count_features (data: &[u8])->ExistingOutput {
    let geojson = std::str::from_utf8(data).ok().and_then( |s| GeoJson::from_str(s).ok());
    match geojson {
        Some( GeoJson::FeatureCollection(fc)) => ExistingOutput::Features( fc.features.len()),
        _ => ExistingOutput::Unreadable
    }
}

/// the monthly output files of an archive
pub struct MonthArchive<S: BlobStore> {
    store: S,
    prefix: String,
}

impl<S: BlobStore> MonthArchive<S> {
    pub fn new (store: S, prefix: impl ToString)->Self {
        MonthArchive { store, prefix: prefix.to_string() }
    }

    pub fn store (&self)->&S { &self.store }

    pub fn key (&self, month: &YearMonth)->String { output_key( &self.prefix, month) }

    pub fn location (&self, month: &YearMonth)->String { self.store.location( &self.key(month)) }

    /// check the output for month. Read errors count as unreadable, not as failures
    pub fn existing (&self, month: &YearMonth)->ExistingOutput {
        match self.store.read( &self.key(month)) {
            Ok(Some(data)) => count_features( &data),
            Ok(None) => ExistingOutput::Missing,
            Err(_) => ExistingOutput::Unreadable
        }
    }

    pub fn write (&self, month: &YearMonth, hotspots: &[FirmsHotspot])->Result<()> {
        let data = encode_feature_collection( hotspots)?;
        self.store.write( &self.key(month), &data)
    }
}
