mod reconstruct;


pub use reconstruct::{get_chunk, reconstruct_geometry};
