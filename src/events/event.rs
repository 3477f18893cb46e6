//! # Time-stamped input events.
//!
//! [`Event`] pairs the host time at which an input occurred with its
//! [`Input`] payload. Events are immutable and cheap to clone; a plan receives
//! its own copy through `push`.
//!
//! ## Channels
//! Continuous inputs map to a deterministic channel name (see
//! [`Event::channel`]), which is how filters and tables address them:
//!
//! ```text
//! Axis       joy<j>axis<a>          e.g. joy0axis1
//! Ball       joy<j>ball<b>
//! Hat        joy<j>hat<h>
//! Position   Nx<HH>                 e.g. Nx3C  (node id, two hex digits)
//! Midi       midi<dev>sc<scene><kind><index>
//! ```
//!
//! Discrete inputs (buttons, keys, mouse buttons) map to click names instead
//! (see [`Event::click_name`]).

use std::fmt;

/// Controller kind of a MIDI input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiKind {
    /// Linear fader.
    Slider,
    /// Rotary dial.
    Knob,
    /// Upper button row.
    ButtonUpper,
    /// Middle button row.
    ButtonMiddle,
    /// Lower button row.
    ButtonLower,
}

impl MidiKind {
    /// Short name used inside channel names.
    pub fn as_str(&self) -> &'static str {
        match self {
            MidiKind::Slider => "slider",
            MidiKind::Knob => "knob",
            MidiKind::ButtonUpper => "btnU",
            MidiKind::ButtonMiddle => "btnM",
            MidiKind::ButtonLower => "btnL",
        }
    }

    /// Decodes the controller group nibble of a raw MIDI control number.
    pub fn from_control(control: u8) -> Option<Self> {
        match (control >> 4) & 0xF {
            0 => Some(MidiKind::Slider),
            1 => Some(MidiKind::Knob),
            2 => Some(MidiKind::ButtonUpper),
            3 => Some(MidiKind::ButtonMiddle),
            4 => Some(MidiKind::ButtonLower),
            _ => None,
        }
    }
}

impl fmt::Display for MidiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Periodic poll with no payload.
    Tick,
    /// Joystick axis moved.
    Axis {
        /// Joystick index.
        joy: u32,
        /// Axis index.
        axis: u32,
        /// New axis value.
        value: f64,
    },
    /// Joystick trackball moved.
    Ball {
        /// Joystick index.
        joy: u32,
        /// Ball index.
        ball: u32,
        /// Relative motion.
        rel: f64,
    },
    /// Joystick hat moved.
    Hat {
        /// Joystick index.
        joy: u32,
        /// Hat index.
        hat: u32,
        /// New hat value.
        value: f64,
    },
    /// Joystick button pressed.
    ButtonDown {
        /// Joystick index.
        joy: u32,
        /// Button index.
        button: u32,
    },
    /// Joystick button released.
    ButtonUp {
        /// Joystick index.
        joy: u32,
        /// Button index.
        button: u32,
    },
    /// Keyboard key pressed.
    KeyDown {
        /// Key code.
        key: u32,
        /// Modifier bit mask.
        modifiers: u32,
    },
    /// Keyboard key released.
    KeyUp {
        /// Key code.
        key: u32,
        /// Modifier bit mask.
        modifiers: u32,
    },
    /// Mouse button pressed.
    MouseDown {
        /// Button number.
        button: u8,
    },
    /// Mouse button released.
    MouseUp {
        /// Button number.
        button: u8,
    },
    /// Position report from an actuator module.
    Position {
        /// Module node id.
        node: u8,
        /// Reported position.
        pos: f64,
    },
    /// MIDI controller change.
    Midi {
        /// Device number.
        dev: u32,
        /// Scene number.
        scene: u32,
        /// Controller kind.
        kind: MidiKind,
        /// Controller index within its kind.
        index: u32,
        /// New value.
        value: f64,
    },
}

/// Tag of an [`Input`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// See [`Input::Tick`].
    Tick,
    /// See [`Input::Axis`].
    Axis,
    /// See [`Input::Ball`].
    Ball,
    /// See [`Input::Hat`].
    Hat,
    /// See [`Input::ButtonDown`].
    ButtonDown,
    /// See [`Input::ButtonUp`].
    ButtonUp,
    /// See [`Input::KeyDown`].
    KeyDown,
    /// See [`Input::KeyUp`].
    KeyUp,
    /// See [`Input::MouseDown`].
    MouseDown,
    /// See [`Input::MouseUp`].
    MouseUp,
    /// See [`Input::Position`].
    Position,
    /// See [`Input::Midi`].
    Midi,
}

impl EventKind {
    /// Stable lowercase label.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::Tick => "tick",
            EventKind::Axis => "axis",
            EventKind::Ball => "ball",
            EventKind::Hat => "hat",
            EventKind::ButtonDown => "button_down",
            EventKind::ButtonUp => "button_up",
            EventKind::KeyDown => "key_down",
            EventKind::KeyUp => "key_up",
            EventKind::MouseDown => "mouse_down",
            EventKind::MouseUp => "mouse_up",
            EventKind::Position => "position",
            EventKind::Midi => "midi",
        }
    }
}

/// An input occurrence stamped with host time (seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Host time at which the input occurred.
    pub at: f64,
    /// What happened.
    pub input: Input,
}

impl Event {
    /// Creates an event.
    #[inline]
    pub fn new(at: f64, input: Input) -> Self {
        Self { at, input }
    }

    /// Creates a tick event.
    #[inline]
    pub fn tick(at: f64) -> Self {
        Self::new(at, Input::Tick)
    }

    /// Creates a joystick axis event.
    #[inline]
    pub fn axis(at: f64, joy: u32, axis: u32, value: f64) -> Self {
        Self::new(at, Input::Axis { joy, axis, value })
    }

    /// Returns the payload-free tag.
    pub fn kind(&self) -> EventKind {
        match self.input {
            Input::Tick => EventKind::Tick,
            Input::Axis { .. } => EventKind::Axis,
            Input::Ball { .. } => EventKind::Ball,
            Input::Hat { .. } => EventKind::Hat,
            Input::ButtonDown { .. } => EventKind::ButtonDown,
            Input::ButtonUp { .. } => EventKind::ButtonUp,
            Input::KeyDown { .. } => EventKind::KeyDown,
            Input::KeyUp { .. } => EventKind::KeyUp,
            Input::MouseDown { .. } => EventKind::MouseDown,
            Input::MouseUp { .. } => EventKind::MouseUp,
            Input::Position { .. } => EventKind::Position,
            Input::Midi { .. } => EventKind::Midi,
        }
    }

    /// True for [`Input::Tick`].
    #[inline]
    pub fn is_tick(&self) -> bool {
        matches!(self.input, Input::Tick)
    }

    /// Channel name and scalar value of a continuous input.
    ///
    /// Returns `None` for ticks and discrete inputs.
    pub fn channel(&self) -> Option<(String, f64)> {
        match self.input {
            Input::Axis { joy, axis, value } => Some((format!("joy{joy}axis{axis}"), value)),
            Input::Ball { joy, ball, rel } => Some((format!("joy{joy}ball{ball}"), rel)),
            Input::Hat { joy, hat, value } => Some((format!("joy{joy}hat{hat}"), value)),
            Input::Position { node, pos } => Some((format!("Nx{node:02X}"), pos)),
            Input::Midi {
                dev,
                scene,
                kind,
                index,
                value,
            } => Some((format!("midi{dev}sc{scene}{kind}{index}"), value)),
            _ => None,
        }
    }

    /// Name and press direction of a discrete up/down input.
    ///
    /// Returns `Some((name, true))` for a press, `Some((name, false))` for a
    /// release and `None` for everything else.
    pub fn click_name(&self) -> Option<(String, bool)> {
        match self.input {
            Input::KeyDown { key, modifiers } => Some((key_name(key, modifiers), true)),
            Input::KeyUp { key, modifiers } => Some((key_name(key, modifiers), false)),
            Input::MouseDown { button } => Some((format!("mouse{button}"), true)),
            Input::MouseUp { button } => Some((format!("mouse{button}"), false)),
            Input::ButtonDown { joy, button } => Some((format!("joy{joy}btn{button}"), true)),
            Input::ButtonUp { joy, button } => Some((format!("joy{joy}btn{button}"), false)),
            _ => None,
        }
    }
}

fn key_name(key: u32, modifiers: u32) -> String {
    format!("key{:08x}", key | (modifiers << 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_follow_schemata() {
        let cases = [
            (Event::axis(0.0, 0, 1, 0.5), "joy0axis1", 0.5),
            (
                Event::new(0.0, Input::Ball { joy: 2, ball: 0, rel: -3.0 }),
                "joy2ball0",
                -3.0,
            ),
            (
                Event::new(0.0, Input::Hat { joy: 1, hat: 3, value: 1.0 }),
                "joy1hat3",
                1.0,
            ),
            (
                Event::new(0.0, Input::Position { node: 0x3C, pos: 12.0 }),
                "Nx3C",
                12.0,
            ),
            (
                Event::new(
                    0.0,
                    Input::Midi {
                        dev: 20,
                        scene: 0,
                        kind: MidiKind::Knob,
                        index: 4,
                        value: 64.0,
                    },
                ),
                "midi20sc0knob4",
                64.0,
            ),
        ];
        for (ev, name, value) in cases {
            assert_eq!(ev.channel(), Some((name.to_string(), value)));
        }
        assert_eq!(Event::tick(1.0).channel(), None);
    }

    #[test]
    fn click_names_pair_up_and_down() {
        let down = Event::new(0.0, Input::KeyDown { key: 0x61, modifiers: 1 });
        let up = Event::new(0.1, Input::KeyUp { key: 0x61, modifiers: 1 });
        assert_eq!(down.click_name(), Some(("key00000461".to_string(), true)));
        assert_eq!(up.click_name(), Some(("key00000461".to_string(), false)));
        let btn = Event::new(0.0, Input::ButtonUp { joy: 1, button: 7 });
        assert_eq!(btn.click_name(), Some(("joy1btn7".to_string(), false)));
        assert_eq!(Event::axis(0.0, 0, 0, 0.0).click_name(), None);
    }

    #[test]
    fn midi_kind_decodes_control_nibble() {
        assert_eq!(MidiKind::from_control(0x14), Some(MidiKind::Knob));
        assert_eq!(MidiKind::from_control(0x42), Some(MidiKind::ButtonLower));
        assert_eq!(MidiKind::from_control(0x70), None);
        assert_eq!(Event::tick(0.0).kind().as_label(), "tick");
    }
}
