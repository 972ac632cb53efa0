// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Core data model: mask layers, the two-layer compositor, the point
//! prompt session, and dataset record shapes.

pub mod composite;
pub mod mask;
pub mod prompt;
pub mod record;
