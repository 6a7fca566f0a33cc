//! Raster statistics
//!
//! - Neighborhood: mean and categorical percentage inside a metric radius

mod neighborhood;

pub use neighborhood::{
    NeighborhoodParams, ellipse_mask, mean_within_radius, percentage_equal_within_radius,
    radius_to_crs_units, raster_mean_within_radius, raster_percentage_equal_within_radius,
    window_for_circle,
};
