use serde::{Deserialize, Serialize};

/// Input delivered by the host between frames.
///
/// Serialized as externally tagged snake_case JSON, e.g.
/// `{"pointer_move":{"x":10.0,"y":20.0}}` or `{"resize":{"width":800.0,"height":600.0}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    PointerMove { x: f32, y: f32 },
    Resize { width: f32, height: f32 },
}
