// Domain layer - Weather samples and their daily rollups
pub mod summary;
pub mod weather;
