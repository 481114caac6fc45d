use crate::core::AppControl;

use super::frame::InputFrame;
use super::types::{InputEvent, Key, KeyState};

/// Arrow-key flags for the current frame.
///
/// Flags are edge-triggered: a flag is true only on the frame the key went
/// down. Holding a key does not keep it set and OS key-repeats are ignored.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl InputState {
    /// Rebuilds the flags from this frame's events.
    ///
    /// Returns `AppControl::Exit` when the frame holds a quit request or an
    /// Escape key-down. Flags are still updated from the remaining events.
    pub fn manage(&mut self, frame: &InputFrame) -> AppControl {
        *self = InputState::default();
        let mut control = AppControl::Continue;

        for ev in frame.iter() {
            match ev {
                InputEvent::Quit => control = AppControl::Exit,

                InputEvent::Key {
                    key,
                    state: KeyState::Pressed,
                    repeat: false,
                } => match key {
                    Key::Escape => control = AppControl::Exit,
                    Key::ArrowLeft => self.left = true,
                    Key::ArrowRight => self.right = true,
                    Key::ArrowUp => self.up = true,
                    Key::ArrowDown => self.down = true,
                    _ => {}
                },

                InputEvent::Key { .. } => {}
            }
        }

        control
    }

    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(events: impl IntoIterator<Item = InputEvent>) -> InputFrame {
        events.into_iter().collect()
    }

    #[test]
    fn quit_event_requests_exit() {
        let mut input = InputState::default();
        assert_eq!(input.manage(&frame([InputEvent::Quit])), AppControl::Exit);
    }

    #[test]
    fn escape_key_down_requests_exit() {
        let mut input = InputState::default();
        let control = input.manage(&frame([InputEvent::key_down(Key::Escape)]));
        assert_eq!(control, AppControl::Exit);
    }

    #[test]
    fn escape_release_keeps_running() {
        let mut input = InputState::default();
        let control = input.manage(&frame([InputEvent::key_up(Key::Escape)]));
        assert_eq!(control, AppControl::Continue);
    }

    #[test]
    fn other_keys_keep_running() {
        let mut input = InputState::default();
        let control = input.manage(&frame([
            InputEvent::key_down(Key::Space),
            InputEvent::key_down(Key::Enter),
            InputEvent::key_down(Key::Unknown(42)),
        ]));
        assert_eq!(control, AppControl::Continue);
        assert!(!input.any());
    }

    #[test]
    fn arrow_sets_exactly_one_flag_for_one_frame() {
        let mut input = InputState::default();
        input.manage(&frame([InputEvent::key_down(Key::ArrowLeft)]));
        assert_eq!(
            input,
            InputState {
                left: true,
                ..InputState::default()
            }
        );

        input.manage(&InputFrame::new());
        assert!(!input.any());
    }

    #[test]
    fn each_arrow_maps_to_its_flag() {
        let cases = [
            (Key::ArrowLeft, InputState { left: true, ..Default::default() }),
            (Key::ArrowRight, InputState { right: true, ..Default::default() }),
            (Key::ArrowUp, InputState { up: true, ..Default::default() }),
            (Key::ArrowDown, InputState { down: true, ..Default::default() }),
        ];

        for (key, expected) in cases {
            let mut input = InputState::default();
            input.manage(&frame([InputEvent::key_down(key)]));
            assert_eq!(input, expected, "{key}");
        }
    }

    #[test]
    fn key_repeat_is_ignored() {
        let mut input = InputState::default();
        let repeat = InputEvent::Key {
            key: Key::ArrowUp,
            state: KeyState::Pressed,
            repeat: true,
        };
        input.manage(&frame([repeat]));
        assert!(!input.up);
    }

    #[test]
    fn flags_still_update_on_exit_frame() {
        let mut input = InputState::default();
        let control = input.manage(&frame([
            InputEvent::key_down(Key::ArrowRight),
            InputEvent::Quit,
        ]));
        assert_eq!(control, AppControl::Exit);
        assert!(input.right);
    }
}
