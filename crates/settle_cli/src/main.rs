//! Maintenance CLI for the settings store.
//!
//! # Responsibility
//! - Provide `delete-all` maintenance against a settings store file.
//! - Keep output deterministic for scripting.

use settle_core::db::open_store;
use settle_core::{
    SettingsDeserializer, SettingsManager, SettingsRepository, SettingsSerializer,
    SqliteSettingsRepository, WrapperRegistry,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String, String> {
    match args.first().map(String::as_str) {
        None | Some("version") => Ok(format!(
            "settle_core version={}",
            settle_core::core_version()
        )),
        Some("delete-all") => {
            let path = args
                .get(1)
                .ok_or_else(|| usage("delete-all requires a store path"))?;
            delete_all(path)
        }
        Some(other) => Err(usage(&format!("unknown command `{other}`"))),
    }
}

fn delete_all(path: &str) -> Result<String, String> {
    let mut conn =
        open_store(path).map_err(|err| format!("failed to open settings store: {err}"))?;
    let repository = SqliteSettingsRepository::try_new(&mut conn)
        .map_err(|err| format!("settings store is not usable: {err}"))?;
    let encoding = repository.storage_encoding();

    let mut manager = SettingsManager::new(
        repository,
        SettingsSerializer::new(encoding, false),
        SettingsDeserializer::new(WrapperRegistry::new(), encoding, false),
    );
    manager
        .delete_all()
        .map_err(|err| format!("failed to delete settings: {err}"))?;

    Ok("Settings were successfully deleted.".to_string())
}

fn usage(problem: &str) -> String {
    format!("{problem}\nusage: settle_cli [version | delete-all <store-path>]")
}
