pub mod ascii;
pub mod backend;
pub mod cache;
pub mod cli;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod playback;
pub mod ramp;
pub mod render;
pub mod sink;
pub mod video;
