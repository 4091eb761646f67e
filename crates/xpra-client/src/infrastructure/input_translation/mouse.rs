//! Mouse translator producing pointer packets.
//!
//! ```text
//! ["pointer-position", wid, [x, y], modifiers, buttons]
//! ["button-action",    wid, button, pressed, [x, y], modifiers, buttons]
//! ```
//!
//! Positions are in server (root window) coordinates: the surface origin plus
//! the canvas-local position multiplied by the surface scale.
//!
//! # Button numbering
//!
//! | DOM button | Meaning   | X11 button |
//! |-----------:|-----------|-----------:|
//! | 0          | primary   | 1          |
//! | 1          | middle    | 2          |
//! | 2          | secondary | 3          |
//! | 3          | back      | 8          |
//! | 4          | forward   | 9          |
//!
//! X11 has no wheel events; a wheel step is a press and release of button
//! 4 (up), 5 (down), 6 (left) or 7 (right).

use tracing::debug;
use xpra_core::{ClientPacket, Surface, Wid};

use crate::application::input::{DomButton, MouseAction, MouseInput, MouseTranslator};

const WHEEL_UP: u32 = 4;
const WHEEL_DOWN: u32 = 5;
const WHEEL_LEFT: u32 = 6;
const WHEEL_RIGHT: u32 = 7;

/// Maps a DOM button number to the X11 button number.
pub fn dom_button_to_x11(button: DomButton) -> Option<u32> {
    match button {
        0 => Some(1),
        1 => Some(2),
        2 => Some(3),
        3 => Some(8),
        4 => Some(9),
        _ => None,
    }
}

/// Default mouse translator.
#[derive(Debug, Default)]
pub struct XpraMouse;

impl XpraMouse {
    pub fn new() -> Self {
        Self
    }
}

struct Pointer {
    wid: Wid,
    x: i32,
    y: i32,
    modifiers: Vec<String>,
    buttons: Vec<u32>,
}

impl Pointer {
    fn button(&self, button: u32, pressed: bool) -> ClientPacket {
        ClientPacket::ButtonAction {
            wid: self.wid,
            button,
            pressed,
            x: self.x,
            y: self.y,
            modifiers: self.modifiers.clone(),
            buttons: self.buttons.clone(),
        }
    }
}

impl MouseTranslator for XpraMouse {
    fn translate(&mut self, input: &MouseInput, surface: Option<&Surface>) -> Vec<ClientPacket> {
        let (wid, x, y) = match surface {
            Some(s) => {
                let scale = s.scale.unwrap_or(1.0);
                (
                    s.wid,
                    s.x + (input.x * scale).round() as i32,
                    s.y + (input.y * scale).round() as i32,
                )
            }
            None => (0, input.x.round() as i32, input.y.round() as i32),
        };
        let pointer = Pointer {
            wid,
            x,
            y,
            modifiers: input.modifiers.to_x11_names(),
            buttons: input.buttons.iter().copied().filter_map(dom_button_to_x11).collect(),
        };

        match input.action {
            MouseAction::Move => vec![ClientPacket::PointerPosition {
                wid: pointer.wid,
                x: pointer.x,
                y: pointer.y,
                modifiers: pointer.modifiers,
                buttons: pointer.buttons,
            }],
            MouseAction::Button { button, pressed } => match dom_button_to_x11(button) {
                Some(b) => vec![pointer.button(b, pressed)],
                None => {
                    debug!(button, "unmapped mouse button ignored");
                    Vec::new()
                }
            },
            MouseAction::Wheel { dx, dy } => {
                let mut steps = Vec::new();
                if dy < 0.0 {
                    steps.push(WHEEL_UP);
                } else if dy > 0.0 {
                    steps.push(WHEEL_DOWN);
                }
                if dx < 0.0 {
                    steps.push(WHEEL_LEFT);
                } else if dx > 0.0 {
                    steps.push(WHEEL_RIGHT);
                }
                steps
                    .into_iter()
                    .flat_map(|b| [pointer.button(b, true), pointer.button(b, false)])
                    .collect()
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::input::Modifiers;
    use crate::infrastructure::renderer::HeadlessRenderer;
    use xpra_core::Metadata;

    fn surface_at(x: i32, y: i32) -> Surface {
        Surface::new(
            3,
            (x, y, 100, 100),
            Metadata::new(),
            Metadata::new(),
            Box::new(HeadlessRenderer::new(100, 100)),
        )
    }

    fn input(action: MouseAction) -> MouseInput {
        MouseInput {
            wid: Some(3),
            x: 10.0,
            y: 20.0,
            action,
            buttons: vec![],
            modifiers: Modifiers::default(),
        }
    }

    #[test]
    fn test_move_offsets_by_surface_origin() {
        // Arrange
        let mut mouse = XpraMouse::new();
        let surface = surface_at(100, 50);

        // Act
        let packets = mouse.translate(&input(MouseAction::Move), Some(&surface));

        // Assert
        assert_eq!(
            packets,
            vec![ClientPacket::PointerPosition {
                wid: 3,
                x: 110,
                y: 70,
                modifiers: vec![],
                buttons: vec![],
            }]
        );
    }

    #[test]
    fn test_move_applies_surface_scale() {
        let mut mouse = XpraMouse::new();
        let mut surface = surface_at(0, 0);
        surface.rescale(2.0);

        let packets = mouse.translate(&input(MouseAction::Move), Some(&surface));

        let [ClientPacket::PointerPosition { x, y, .. }] = &packets[..] else {
            panic!("expected pointer-position");
        };
        assert_eq!((*x, *y), (20, 40));
    }

    #[test]
    fn test_move_without_surface_uses_root_window() {
        let mut mouse = XpraMouse::new();
        let mut event = input(MouseAction::Move);
        event.wid = None;

        let packets = mouse.translate(&event, None);

        let [ClientPacket::PointerPosition { wid, x, y, .. }] = &packets[..] else {
            panic!("expected pointer-position");
        };
        assert_eq!((*wid, *x, *y), (0, 10, 20));
    }

    #[test]
    fn test_secondary_button_maps_to_x11_button_3() {
        let mut mouse = XpraMouse::new();
        let mut event = input(MouseAction::Button {
            button: 2,
            pressed: true,
        });
        event.buttons = vec![2];

        let packets = mouse.translate(&event, Some(&surface_at(0, 0)));

        let [ClientPacket::ButtonAction { button, pressed, buttons, .. }] = &packets[..] else {
            panic!("expected button-action");
        };
        assert_eq!(*button, 3);
        assert!(*pressed);
        assert_eq!(buttons, &vec![3]);
    }

    #[test]
    fn test_wheel_down_is_button_5_press_and_release() {
        let mut mouse = XpraMouse::new();

        let packets = mouse.translate(
            &input(MouseAction::Wheel { dx: 0.0, dy: 3.0 }),
            Some(&surface_at(0, 0)),
        );

        let presses: Vec<(u32, bool)> = packets
            .iter()
            .map(|p| match p {
                ClientPacket::ButtonAction { button, pressed, .. } => (*button, *pressed),
                other => panic!("unexpected packet {other:?}"),
            })
            .collect();
        assert_eq!(presses, vec![(5, true), (5, false)]);
    }

    #[test]
    fn test_diagonal_wheel_emits_both_axes() {
        let mut mouse = XpraMouse::new();
        let packets = mouse.translate(
            &input(MouseAction::Wheel { dx: -1.0, dy: -1.0 }),
            Some(&surface_at(0, 0)),
        );
        assert_eq!(packets.len(), 4);
    }

    #[test]
    fn test_dom_button_table() {
        assert_eq!(dom_button_to_x11(0), Some(1));
        assert_eq!(dom_button_to_x11(1), Some(2));
        assert_eq!(dom_button_to_x11(3), Some(8));
        assert_eq!(dom_button_to_x11(4), Some(9));
        assert_eq!(dom_button_to_x11(7), None);
    }
}
