pub mod classification;
pub mod density;
pub mod lines;
pub mod metallicity;
pub mod pipeline;
pub mod ratios;
pub mod serialization;

mod traits;

pub use pipeline::TableAssembler;
pub use traits::TableEngine;
