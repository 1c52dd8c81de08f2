// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod echo;
pub mod select_fields;

pub use echo::*;
pub use select_fields::*;
