// Copyright 2026 Demanda RT Contributors
// SPDX-License-Identifier: Apache-2.0

//! Demanda RT — resilient multi-source acquisition engine for Colombia's
//! real-time national power demand.
//!
//! The provider exposes the same underlying series through several
//! unreliable, mutually-inconsistent channels. This crate tries them in a
//! configurable priority order — structured metrics API, legacy
//! session-based service, script-embedded page scrape, headless-browser
//! chart readout — decodes each channel's idiosyncratic payload into
//! canonical points, and hands back either a usable series or a structured
//! reason for failure.

pub mod catalog;
pub mod chain;
pub mod cli;
pub mod config;
pub mod decode;
pub mod errors;
pub mod events;
pub mod model;
pub mod poll;
pub mod series;
pub mod sources;
