// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // tree definitions + builder
pub mod engine;     // leaf and composite operations
pub mod errors;     // error handling
pub mod observability;
pub mod traits;     // unified abstractions
pub mod work;       // work functions run by leaves
