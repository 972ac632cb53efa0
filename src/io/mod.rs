// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: dataset enumeration and image/mask files.

pub mod dataset;
pub mod media;
