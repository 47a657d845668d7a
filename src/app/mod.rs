// Application layer: operator actions wired to storage, import and export.

pub mod commands;
