pub mod garch;
