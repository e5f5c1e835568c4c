// Application layer - Use cases and the algorithms behind them
pub mod chart_synchronizer;
pub mod comparison_service;
pub mod constants_source;
pub mod metric_converter;
pub mod regression_engine;
pub mod result_registry;
pub mod selection_validator;
