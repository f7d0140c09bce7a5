//! `paperchat models`: list the answer models that can be selected.

use crate::config::Config;

pub fn run_models(config: &Config) {
    print_models(&config.answer.available_models, &config.answer.model);
}

pub fn print_models(available: &[String], current: &str) {
    for model in available {
        let marker = if model == current { "*" } else { " " };
        println!("{} {}", marker, model);
    }
}
