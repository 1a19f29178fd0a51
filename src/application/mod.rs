// Application layer - Collection, aggregation and query use cases
pub mod aggregator;
pub mod collector;
pub mod cycle_report;
pub mod errors;
pub mod query_service;
pub mod scheduler;
pub mod weather_repository;

#[cfg(test)]
pub mod test_support;
