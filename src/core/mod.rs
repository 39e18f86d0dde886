//! Core interfaces and types.

pub mod editor_component;
pub mod input;
pub mod input_event;
pub mod keybindings;
pub mod output;
pub mod terminal;
pub mod text;
