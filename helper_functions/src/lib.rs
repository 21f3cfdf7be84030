pub mod classification;
pub mod misc;
