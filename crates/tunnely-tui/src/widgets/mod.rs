//! Reusable rendering pieces shared by screens.

pub mod settings_row;
