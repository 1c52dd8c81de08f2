// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in processors that run in the engine's own process.

pub mod factory;
pub mod processors;

pub use factory::LocalProcessorFactory;
pub use processors::*;
