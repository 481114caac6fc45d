use std::fmt;

use super::error::LifecycleError;

/// Kind of pass the renderer can have open.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Pass {
    Render,
    Compute,
    Copy,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pass::Render => "render",
            Pass::Compute => "compute",
            Pass::Copy => "copy",
        })
    }
}

/// Tracks where the renderer is in its frame protocol.
///
/// At most one pass is open at a time. Render passes only exist inside a
/// frame; compute and copy passes may also run between frames (load-time
/// uploads and dispatches).
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct FramePhase {
    frame_open: bool,
    pass: Option<Pass>,
}

impl FramePhase {
    pub fn frame_open(&self) -> bool {
        self.frame_open
    }

    pub fn open_pass(&self) -> Option<Pass> {
        self.pass
    }

    pub fn is_idle(&self) -> bool {
        !self.frame_open && self.pass.is_none()
    }

    pub fn begin_frame(&mut self) -> Result<(), LifecycleError> {
        if self.frame_open {
            return Err(LifecycleError::FrameAlreadyBegun);
        }
        if let Some(open) = self.pass {
            return Err(LifecycleError::PassOpen(open));
        }
        self.frame_open = true;
        Ok(())
    }

    pub fn begin_pass(&mut self, requested: Pass) -> Result<(), LifecycleError> {
        if let Some(open) = self.pass {
            return Err(LifecycleError::PassAlreadyOpen { requested, open });
        }
        if requested == Pass::Render && !self.frame_open {
            return Err(LifecycleError::NoFrame);
        }
        self.pass = Some(requested);
        Ok(())
    }

    pub fn end_pass(&mut self, requested: Pass) -> Result<(), LifecycleError> {
        if self.pass != Some(requested) {
            return Err(LifecycleError::PassNotOpen {
                requested,
                open: self.pass,
            });
        }
        self.pass = None;
        Ok(())
    }

    /// Requires an open frame with no pass other than a render pass.
    ///
    /// The caller closes an open render pass before calling this.
    pub fn end_frame(&mut self) -> Result<(), LifecycleError> {
        if !self.frame_open {
            return Err(LifecycleError::NoFrame);
        }
        if let Some(open) = self.pass {
            return Err(LifecycleError::PassOpenAtFrameEnd(open));
        }
        self.frame_open = false;
        Ok(())
    }

    /// Requires an open frame and no open pass (swapchain blits).
    pub fn require_frame_outside_pass(&self) -> Result<(), LifecycleError> {
        if !self.frame_open {
            return Err(LifecycleError::NoFrame);
        }
        match self.pass {
            Some(open) => Err(LifecycleError::PassOpen(open)),
            None => Ok(()),
        }
    }

    pub fn require_pass(&self, requested: Pass) -> Result<(), LifecycleError> {
        if self.pass == Some(requested) {
            Ok(())
        } else {
            Err(LifecycleError::PassNotOpen {
                requested,
                open: self.pass,
            })
        }
    }

    /// Drops any open frame or pass without validation.
    pub fn reset(&mut self) {
        *self = FramePhase::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_frame_sequence() {
        let mut phase = FramePhase::default();
        phase.begin_frame().unwrap();
        phase.begin_pass(Pass::Render).unwrap();
        phase.end_pass(Pass::Render).unwrap();
        phase.end_frame().unwrap();
        assert!(phase.is_idle());
    }

    #[test]
    fn double_begin_frame_is_rejected() {
        let mut phase = FramePhase::default();
        phase.begin_frame().unwrap();
        assert_eq!(phase.begin_frame(), Err(LifecycleError::FrameAlreadyBegun));
    }

    #[test]
    fn render_pass_needs_a_frame() {
        let mut phase = FramePhase::default();
        assert_eq!(phase.begin_pass(Pass::Render), Err(LifecycleError::NoFrame));
        assert!(phase.is_idle());
    }

    #[test]
    fn copy_and_compute_run_outside_frames() {
        let mut phase = FramePhase::default();
        phase.begin_pass(Pass::Copy).unwrap();
        phase.end_pass(Pass::Copy).unwrap();
        phase.begin_pass(Pass::Compute).unwrap();
        phase.end_pass(Pass::Compute).unwrap();
        assert!(phase.is_idle());
    }

    #[test]
    fn passes_are_mutually_exclusive() {
        let mut phase = FramePhase::default();
        phase.begin_frame().unwrap();
        phase.begin_pass(Pass::Render).unwrap();
        assert_eq!(
            phase.begin_pass(Pass::Compute),
            Err(LifecycleError::PassAlreadyOpen {
                requested: Pass::Compute,
                open: Pass::Render
            })
        );
        assert_eq!(
            phase.begin_pass(Pass::Copy),
            Err(LifecycleError::PassAlreadyOpen {
                requested: Pass::Copy,
                open: Pass::Render
            })
        );
    }

    #[test]
    fn ending_the_wrong_pass_is_rejected() {
        let mut phase = FramePhase::default();
        phase.begin_pass(Pass::Copy).unwrap();
        let err = phase.end_pass(Pass::Compute).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::PassNotOpen {
                requested: Pass::Compute,
                open: Some(Pass::Copy)
            }
        );
        assert_eq!(
            err.to_string(),
            "cannot end a compute pass: a copy pass is open"
        );

        let mut idle = FramePhase::default();
        assert_eq!(
            idle.end_pass(Pass::Render).unwrap_err().to_string(),
            "cannot end a render pass: no pass is open"
        );
    }

    #[test]
    fn frame_cannot_start_during_a_pass() {
        let mut phase = FramePhase::default();
        phase.begin_pass(Pass::Compute).unwrap();
        assert_eq!(phase.begin_frame(), Err(LifecycleError::PassOpen(Pass::Compute)));
    }

    #[test]
    fn frame_end_requires_closed_passes() {
        let mut phase = FramePhase::default();
        assert_eq!(phase.end_frame(), Err(LifecycleError::NoFrame));

        phase.begin_frame().unwrap();
        phase.begin_pass(Pass::Render).unwrap();
        assert_eq!(
            phase.end_frame(),
            Err(LifecycleError::PassOpenAtFrameEnd(Pass::Render))
        );
    }

    #[test]
    fn blit_needs_frame_without_pass() {
        let mut phase = FramePhase::default();
        assert_eq!(phase.require_frame_outside_pass(), Err(LifecycleError::NoFrame));

        phase.begin_frame().unwrap();
        assert!(phase.require_frame_outside_pass().is_ok());

        phase.begin_pass(Pass::Render).unwrap();
        assert_eq!(
            phase.require_frame_outside_pass(),
            Err(LifecycleError::PassOpen(Pass::Render))
        );
    }

    #[test]
    fn compute_inside_a_frame_before_render() {
        let mut phase = FramePhase::default();
        phase.begin_frame().unwrap();
        phase.begin_pass(Pass::Compute).unwrap();
        phase.end_pass(Pass::Compute).unwrap();
        phase.begin_pass(Pass::Render).unwrap();
        phase.end_pass(Pass::Render).unwrap();
        phase.end_frame().unwrap();
        assert!(phase.is_idle());
    }
}
