//! UI module - painted widgets shared by the views and modals

pub mod components;
