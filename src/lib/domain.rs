pub mod descriptor;
pub mod error;
pub mod leaf;
pub mod merkle;
pub mod policy;
pub mod proof;
