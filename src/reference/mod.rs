//! Compiled-in reference data.

pub mod postal_centroids;
