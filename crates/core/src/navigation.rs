//! Breadcrumb navigation over aims, sub-aims and activities.

use grantwise_shared::AppError;
use grantwise_shared::types::{AimId, GrantId, SubAimId};
use serde::Serialize;
use thiserror::Error;

use crate::grant::Grant;

/// Navigation errors.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Aim not on the grant.
    #[error("Aim not found: {0}")]
    AimNotFound(AimId),

    /// Sub-aim not on the aim.
    #[error("Sub-aim not found: {0}")]
    SubAimNotFound(SubAimId),

    /// Drill attempted from the wrong level.
    #[error("Cannot open {target} from the {current} level")]
    WrongLevel {
        /// Level being shown.
        current: &'static str,
        /// Level requested.
        target: &'static str,
    },

    /// Breadcrumb index past the end of the stack.
    #[error("No breadcrumb at position {index} (depth {depth})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Stack depth.
        depth: usize,
    },
}

impl From<NavigationError> for AppError {
    fn from(err: NavigationError) -> Self {
        match err {
            NavigationError::AimNotFound(_) | NavigationError::SubAimNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            _ => Self::Validation(err.to_string()),
        }
    }
}

/// Level shown by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum FrameView {
    /// All aims of the grant.
    Aims,
    /// Sub-aims of one aim.
    SubAims {
        /// Grant.
        grant: GrantId,
        /// Aim.
        aim: AimId,
    },
    /// Activities of one sub-aim.
    Activities {
        /// Grant.
        grant: GrantId,
        /// Aim.
        aim: AimId,
        /// Sub-aim.
        sub_aim: SubAimId,
    },
}

impl FrameView {
    fn level(&self) -> &'static str {
        match self {
            Self::Aims => "aims",
            Self::SubAims { .. } => "sub-aims",
            Self::Activities { .. } => "activities",
        }
    }
}

/// One entry of the navigation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// Key unique within this navigator, for render lists.
    pub key: u64,
    /// What the frame shows.
    pub view: FrameView,
}

/// Label for one breadcrumb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    /// Frame key.
    pub key: u64,
    /// Display label.
    pub label: String,
}

/// Drill-down stack. Always holds the `Aims` root.
#[derive(Debug, Clone)]
pub struct BucketNavigator {
    frames: Vec<Frame>,
    next_key: u64,
}

impl Default for BucketNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketNavigator {
    /// Creates a navigator showing the aims.
    #[must_use]
    pub fn new() -> Self {
        let mut navigator = Self {
            frames: Vec::new(),
            next_key: 0,
        };
        navigator.push(FrameView::Aims);
        navigator
    }

    /// Frames from root to current.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Frame on top.
    #[must_use]
    pub fn current(&self) -> &Frame {
        // The root frame is never popped.
        &self.frames[self.frames.len() - 1]
    }

    /// Stack depth, at least 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Opens an aim's sub-aims. Returns false without moving when the aim has none.
    pub fn drill_into_aim(&mut self, grant: &Grant, aim_id: AimId) -> Result<bool, NavigationError> {
        let current = self.current().view;
        if current != FrameView::Aims {
            return Err(NavigationError::WrongLevel {
                current: current.level(),
                target: "sub-aims",
            });
        }
        let aim = grant.aim(aim_id).ok_or(NavigationError::AimNotFound(aim_id))?;
        if aim.sub_aims.is_empty() {
            return Ok(false);
        }
        self.push(FrameView::SubAims {
            grant: grant.id,
            aim: aim_id,
        });
        Ok(true)
    }

    /// Opens a sub-aim's activities. Returns false without moving when it has none.
    pub fn drill_into_sub_aim(
        &mut self,
        grant: &Grant,
        sub_aim_id: SubAimId,
    ) -> Result<bool, NavigationError> {
        let FrameView::SubAims { aim, .. } = self.current().view else {
            return Err(NavigationError::WrongLevel {
                current: self.current().view.level(),
                target: "activities",
            });
        };
        let sub_aim = grant
            .aim(aim)
            .ok_or(NavigationError::AimNotFound(aim))?
            .sub_aim(sub_aim_id)
            .ok_or(NavigationError::SubAimNotFound(sub_aim_id))?;
        if sub_aim.activities.is_empty() {
            return Ok(false);
        }
        self.push(FrameView::Activities {
            grant: grant.id,
            aim,
            sub_aim: sub_aim_id,
        });
        Ok(true)
    }

    /// Truncates the stack to `[0..=index]`.
    pub fn navigate_to(&mut self, index: usize) -> Result<(), NavigationError> {
        if index >= self.frames.len() {
            return Err(NavigationError::IndexOutOfRange {
                index,
                depth: self.frames.len(),
            });
        }
        self.frames.truncate(index + 1);
        Ok(())
    }

    /// Pops one frame. Returns false at the root.
    pub fn back(&mut self) -> bool {
        if self.frames.len() > 1 {
            self.frames.pop();
            true
        } else {
            false
        }
    }

    /// Breadcrumb labels for the current stack.
    #[must_use]
    pub fn breadcrumbs(&self, grant: &Grant) -> Vec<Breadcrumb> {
        self.frames
            .iter()
            .map(|frame| Breadcrumb {
                key: frame.key,
                label: match frame.view {
                    FrameView::Aims => "Aims".to_string(),
                    FrameView::SubAims { aim, .. } => grant
                        .aim(aim)
                        .map_or_else(|| "Aim".to_string(), |a| a.number.clone()),
                    FrameView::Activities { aim, sub_aim, .. } => grant
                        .aim(aim)
                        .and_then(|a| a.sub_aim(sub_aim))
                        .map_or_else(|| "Sub-aim".to_string(), |s| s.number.clone()),
                },
            })
            .collect()
    }

    fn push(&mut self, view: FrameView) {
        let key = self.next_key;
        self.next_key += 1;
        self.frames.push(Frame { key, view });
    }
}
