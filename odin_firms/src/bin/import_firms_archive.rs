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

use std::path::PathBuf;
use anyhow::{anyhow, Result};
use clap::Parser;
use odin_firms::{import_dir, init_tracing, load_config, DirStore, MonthArchive, DEFAULT_CONFIG};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "import downloaded FIRMS CSV/JSON/GeoJSON files into monthly GeoJSON archives")]
pub struct Args {
    /// RON config file (only bounds, output_dir and file_prefix are used)
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: String,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// overwrite existing outputs that have no hotspots
    #[arg(long, alias = "retryEmpty")]
    pub retry_empty: bool,

    /// overwrite existing outputs
    #[arg(long)]
    pub force: bool,

    /// directory with downloaded files (searched recursively)
    pub input_dir: PathBuf,
}

fn main()->Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_config( &args.config)?;
    if let Some(dir) = args.output_dir { config.output_dir = dir }
    if !config.bounds.is_valid() {
        return Err( anyhow!("invalid bounds {}", config.bounds))
    }

    let archive = MonthArchive::new( DirStore::new( &config.output_dir)?, &config.file_prefix);
    let summary = import_dir( &args.input_dir, &config.bounds, &archive, args.retry_empty || config.rebuild_empty, args.force || config.force)?;
    summary.log();

    Ok(())
}
