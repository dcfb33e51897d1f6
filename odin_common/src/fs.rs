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

use std::fs::{self,File};
use std::io::{self,Write,ErrorKind};
use std::env;
use std::path::{Path,PathBuf};
use regex::Regex;

use crate::macros::io_error;

type Result<T> = std::result::Result<T,std::io::Error>;

pub fn filename<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().file_name().and_then(|ostr| ostr.to_str())
}

pub fn extension<'a,T: AsRef<Path>> (path: &'a T)->Option<&'a str> {
    path.as_ref().extension().and_then(|ostr| ostr.to_str())
}

/// check if dir pathname exists and is writable, try to create dir otherwise
pub fn ensure_writable_dir (path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        let md = fs::metadata(&path)?;
        if md.permissions().readonly() {
            Err(io_error!(ErrorKind::PermissionDenied, "output_dir {:?} not writable", &path))
        } else {
            Ok(())
        }

    } else {
        fs::create_dir_all(path)
    }
}

pub fn filepath_contents_as_string <P: AsRef<Path>> (path: &P) -> Result<String> {
    fs::read_to_string(path)
}

/// read file contents if the file exists. A missing file is not an error
pub fn existing_file_contents <P: AsRef<Path>> (path: &P) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e)
    }
}

/// write contents to a temporary sibling first and then rename it, so that readers (or interrupted
/// writers) never see a partially written file
pub fn write_file_atomic (path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let fname = filename(&path).ok_or_else(|| io_error!(ErrorKind::InvalidInput, "not a file path {:?}", path))?;
    let tmp_path = path.with_file_name( format!(".{fname}.tmp"));

    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.flush()?;
    }
    fs::rename( &tmp_path, path)
}

/// recursively collect all files below dir whose name matches the given regex, sorted by path
pub fn matching_files_in_tree<P: AsRef<Path>> (dir: &P, fname_regex: &Regex) -> Result<Vec<PathBuf>> {
    let dir: &Path = dir.as_ref();
    if !dir.is_dir() {
        return Err( io_error!(ErrorKind::NotFound, "dir {:?}", dir))
    }

    let mut list: Vec<PathBuf> = Vec::new();
    collect_matching_files( dir, fname_regex, &mut list)?;
    list.sort();
    Ok(list)
}

fn collect_matching_files (dir: &Path, fname_regex: &Regex, list: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_matching_files( &path, fname_regex, list)?;
        } else if filename(&path).is_some_and( |fname| fname_regex.is_match(fname)) {
            list.push(path)
        }
    }
    Ok(())
}

/// replace '~' and '$<name>' path elements with the respective environment values
pub fn expand_env_path (path: impl AsRef<Path>)->Result<PathBuf> {
    let mut p = PathBuf::new();

    for (n,c) in path.as_ref().iter().enumerate() {
        let e = c.to_str().ok_or_else( || io_error!(ErrorKind::InvalidInput, "invalid path: {:?}", path.as_ref()))?;

        if e == "~" && n == 0 {
            p.push( env::var("HOME").map_err( |_| io_error!(ErrorKind::NotFound, "HOME not set"))?)
        } else if e.len() > 1 && e.starts_with('$') {
            p.push( env::var( &e[1..]).map_err( |_| io_error!(ErrorKind::NotFound, "{} not set", e))?)
        } else {
            p.push(e)
        }
    }

    Ok(p)
}
