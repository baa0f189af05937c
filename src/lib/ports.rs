pub mod encoder;
pub mod hasher;
