pub mod run_options;
