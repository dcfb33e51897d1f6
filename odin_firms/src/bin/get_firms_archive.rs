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
use anyhow::Result;
use clap::Parser;
use tracing::info;
use odin_common::datetime::YearMonth;
use odin_firms::{init_tracing, load_config, run_months, DirStore, FirmsArchiveConfig, FirmsClient, MonthArchive, DEFAULT_CONFIG};

#[derive(Parser, Debug)]
#[command(version, about, long_about = "build monthly GeoJSON archives of FIRMS hotspots for a region")]
pub struct Args {
    /// RON config file (path or name in the odin_firms config dirs)
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: String,

    /// first month (YYYY-MM)
    #[arg(long)]
    pub start: Option<YearMonth>,

    /// last month (YYYY-MM), defaults to start
    #[arg(long)]
    pub end: Option<YearMonth>,

    /// explicit comma separated month list, overrides start/end
    #[arg(long, value_delimiter = ',')]
    pub months: Option<Vec<YearMonth>>,

    /// FIRMS MAP_KEY
    #[arg(long, env = "FIRMS_MAP_KEY", hide_env_values = true)]
    pub map_key: Option<String>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// re-fetch months with existing output that has no hotspots
    #[arg(long, alias = "retryEmpty")]
    pub retry_empty: bool,

    /// re-fetch months regardless of existing output
    #[arg(long)]
    pub force: bool,
}

fn apply_args (config: &mut FirmsArchiveConfig, args: Args) {
    config.override_months( args.months, args.start, args.end);

    if args.map_key.is_some() { config.map_key = args.map_key }
    if let Some(dir) = args.output_dir { config.output_dir = dir }
    if args.retry_empty { config.rebuild_empty = true }
    if args.force { config.force = true }
}

#[tokio::main(flavor = "current_thread")]
async fn main()->Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_config( &args.config)?;
    apply_args( &mut config, args);
    config.validate()?;

    let selection = config.month_selection()?;
    let client = FirmsClient::new( &config)?;
    let archive = MonthArchive::new( DirStore::new( &config.output_dir)?, &config.file_prefix);
    info!("archiving FIRMS hotspots within {} to {:?}", config.bounds, config.output_dir);

    run_months( &config, &client, &archive, &selection).await?;
    Ok(())
}
