// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Work functions that leaves run, and the registry that resolves them by name.

pub mod fn_work;
pub mod registry;
pub mod simulated;

pub use fn_work::FnWork;
pub use registry::{WorkOptions, WorkRegistry};
pub use simulated::SimulatedWork;
