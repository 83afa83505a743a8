// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default bound on children a parallel composite runs at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
/// Name used in validation messages for the root's parent
pub const ROOT_SCOPE: &str = "<root>";
