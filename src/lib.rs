pub mod assets;
pub mod config;
pub mod decode;
pub mod error;
pub mod feed;
pub mod model;
pub mod pace;
pub mod pipeline;
pub mod queue;
pub mod replay;

#[cfg(test)]
mod test;
