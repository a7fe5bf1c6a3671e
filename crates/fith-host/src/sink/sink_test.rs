// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Tests for the filesystem sink.

#![allow(clippy::unwrap_used)]

use std::fs::{self, File};
use std::io::BufReader;

use fith_image::container::read_container;
use fith_image::loader::ImageLoader;
use fith_image::sidecar;
use fith_vm::persist::{ImageSink, ImageSnapshot};

use super::FsImageSink;

#[test]
fn writes_sidecars_and_container() {
    let dir = std::env::temp_dir().join(format!("fith-sink-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let base = dir.join("image");

    let map = vec![(4, "MAIN".to_string())];
    let snapshot = ImageSnapshot {
        text: &[4, 10, 20, 30],
        data: &[2, -5],
        map: &map,
        entry: Some(4),
    };
    FsImageSink::new(&base, 1, 1).save(&snapshot).unwrap();

    // sidecar triple
    let mut text = [0i32; 8];
    let n = sidecar::read_image(File::open(base.with_extension("bin")).unwrap(), &mut text).unwrap();
    assert_eq!(&text[..n], &[4, 10, 20, 30]);

    let mut data = [0i32; 8];
    let n = sidecar::read_image(File::open(base.with_extension("dat")).unwrap(), &mut data).unwrap();
    assert_eq!(&data[..n], &[2, -5]);

    let entries =
        sidecar::read_map(BufReader::new(File::open(base.with_extension("map")).unwrap())).unwrap();
    assert_eq!(sidecar::find_entry(&entries, "MAIN"), Some(4));

    // container
    let mut text = [0i32; 8];
    let mut data = [0i32; 8];
    let mut loader = ImageLoader::new(&mut text, &mut data, 1, 1).with_entry_name("MAIN");
    read_container(File::open(base.with_extension("fith")).unwrap(), &mut loader).unwrap();
    assert_eq!(loader.entry(), Some(4));
    assert_eq!(loader.named_entry(), Some(4));
    assert_eq!(&text[..4], &[4, 10, 20, 30]);
    assert_eq!(&data[..2], &[2, -5]);

    fs::remove_dir_all(&dir).unwrap();
}
