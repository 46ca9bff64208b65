// Read-only data shapes handed to the chart renderer
pub mod view_models;
