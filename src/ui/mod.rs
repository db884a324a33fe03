/// Terminal shell: input, gamepad, sound cues and the diff renderer.

pub mod gamepad;
pub mod input;
pub mod renderer;
pub mod sound;
