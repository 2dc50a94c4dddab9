pub mod camera;
pub mod directory;
pub mod enrollment;
pub mod monitor;
pub mod recognition;
pub mod sampling;
pub mod shared;

#[cfg(test)]
mod testing;
