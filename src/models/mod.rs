//! # Data Models
//!
//! SeaORM entities for the three tables backing an integration.

pub mod integration;
pub mod integration_data;
pub mod setting;

pub use integration::Entity as Integration;
pub use integration_data::Entity as IntegrationData;
pub use setting::Entity as Setting;
