use std::path::{Path, PathBuf};

use chrono::Local;
use dqg_core::transfer::suggested_export_file_name;

use crate::commands::common::open_service;
use crate::error::CliError;

pub async fn run_export(
    output_path: Option<&Path>,
    dated: bool,
    data_dir: &Path,
) -> Result<(), CliError> {
    let service = open_service(data_dir)?;
    let rendered = service.export_json().await?;

    let output_path = output_path.map(Path::to_path_buf).or_else(|| {
        dated.then(|| PathBuf::from(suggested_export_file_name(Some(Local::now().date_naive()))))
    });

    if let Some(path) = output_path {
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
