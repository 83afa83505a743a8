// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::traits::OperationNode;

/// Cancels a node if its in-flight `execute()` future is dropped.
///
/// Held for the duration of a run. When `execute()` finishes normally the node
/// is already terminal and the `cancel()` issued on drop is a no-op; when the
/// caller abandons the future (a timeout, a losing `select!` branch) the node
/// is forced to `Failure` instead of staying `InProgress` forever.
pub(crate) struct CancelOnDrop<'a>(pub(crate) &'a dyn OperationNode);

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
