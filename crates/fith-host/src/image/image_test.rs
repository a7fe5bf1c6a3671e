// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Tests for host-side image loading.

#![allow(clippy::unwrap_used)]

use std::fs;

use fith_vm::persist::{ImageSink, ImageSnapshot};

use super::load;
use crate::sink::FsImageSink;

#[test]
fn loads_saved_image_from_either_format() {
    let dir = std::env::temp_dir().join(format!("fith-image-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let base = dir.join("prog");

    let map = vec![(3, "MAIN".to_string())];
    let snapshot = ImageSnapshot {
        text: &[5, 1, 2, 3, 4],
        data: &[2, 9],
        map: &map,
        entry: Some(3),
    };
    FsImageSink::new(&base, 1, 1).save(&snapshot).unwrap();

    // the container, by its ENTRY tag
    let mut text = [0i32; 8];
    let mut data = [0i32; 8];
    let entry = load(&base.with_extension("fith"), None, &mut text, &mut data).unwrap();
    assert_eq!(entry, 3);
    assert_eq!(&text[..5], &[5, 1, 2, 3, 4]);

    // the sidecar triple, by name
    let mut text = [0i32; 8];
    let mut data = [0i32; 8];
    let entry = load(&base, Some("MAIN"), &mut text, &mut data).unwrap();
    assert_eq!(entry, 3);
    assert_eq!(&data[..2], &[2, 9]);

    // sidecars without a name cannot resolve an entry
    let mut text = [0i32; 8];
    let mut data = [0i32; 8];
    assert!(load(&base, None, &mut text, &mut data).is_err());

    fs::remove_dir_all(&dir).unwrap();
}
