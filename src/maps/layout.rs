//! Mount geometry and the layout readiness signal.
//!
//! Every card owns a `watch` channel describing its map mount. Map
//! construction waits on it until the mount has a real size instead of
//! sleeping for a fixed amount of time.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;

use crate::core::config::LayoutConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_nonzero(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Layout box of a map mount, stamped with the card epoch it belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MountLayout {
    pub size: Size,
    pub epoch: u64,
}

/// Outcome of waiting for a mount to become measurable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutWait {
    Ready(Size),
    /// The card changed state (or was destroyed) while waiting
    Superseded,
    TimedOut,
}

/// Size of a card's map mount for the given viewport.
///
/// Collapsed cards hide the mount entirely.
pub fn mount_size(expanded: bool, viewport: Size, layout: &LayoutConfig) -> Size {
    if !expanded || !viewport.is_nonzero() {
        return Size::default();
    }

    let width = viewport
        .width
        .saturating_sub(layout.card_padding.saturating_mul(2))
        .min(layout.max_map_width);

    if width == 0 {
        return Size::default();
    }

    Size::new(width, layout.map_height)
}

/// Wait until the mount reports a nonzero size for `epoch`.
pub async fn wait_for_mount(
    rx: &mut watch::Receiver<MountLayout>,
    epoch: u64,
    timeout: Duration,
) -> LayoutWait {
    let waited = tokio::time::timeout(
        timeout,
        rx.wait_for(|layout| layout.epoch != epoch || layout.size.is_nonzero()),
    )
    .await;

    match waited {
        Ok(Ok(layout)) => {
            if layout.epoch != epoch {
                LayoutWait::Superseded
            } else {
                LayoutWait::Ready(layout.size)
            }
        }
        Ok(Err(_closed)) => LayoutWait::Superseded,
        Err(_elapsed) => LayoutWait::TimedOut,
    }
}
