use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tcdecode_core::{DecodeOptions, ExportOptions, decode_capture, write_csv};

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let input = path.join("input.TC");
        if !input.exists() {
            continue;
        }
        let output = path.join("expected.csv");
        regenerate_one(&input, &output)?;
    }

    Ok(())
}

fn regenerate_one(input: &Path, output: &Path) -> Result<(), String> {
    let bytes =
        fs::read(input).map_err(|err| format!("failed to read {}: {}", input.display(), err))?;
    let capture = decode_capture(&bytes, &DecodeOptions::default())
        .map_err(|err| format!("decode failed for {}: {}", input.display(), err))?;
    let mut csv = Vec::new();
    write_csv(&mut csv, &capture, &ExportOptions::default())
        .map_err(|err| format!("CSV export failed: {}", err))?;
    fs::write(output, csv)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
