// Shared configuration for the breakout scout workspace.

pub mod config;
