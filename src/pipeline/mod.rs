pub mod fields;
pub mod extraction;
pub mod validation;
pub mod name_correction;
pub mod mapping;
pub mod workflow; // Capture → validate → fill → submit state machine
