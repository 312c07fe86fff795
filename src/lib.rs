#![doc = include_str!("../readme.md")]

mod assembler;
mod bitset;
mod builder;
mod contour;
mod error;
mod math;
mod nest;
mod perimeter;
mod region;
mod tin;
mod tip;
mod tracer;

pub use builder::{contour_tin, BuildResult, ContourBuilder};
pub use contour::{Contour, ContourId, ContourKind, PERIMETER_SIDE};
pub use error::ContourError;
pub use region::{ContourRegion, RegionId, RegionKind};
pub use tin::{EdgeId, Tin, Valuator};
