use std::path::PathBuf;

use larder::{DirectoryStorage, KeyValueStorage as _};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <path-to-storage-directory>", args[0]);
        eprintln!("\nExample: {} ~/.local/share/devpulse", args[0]);
        std::process::exit(1);
    }

    let root = PathBuf::from(&args[1]);

    if !root.is_dir() {
        eprintln!("Error: '{}' is not a directory", root.display());
        std::process::exit(1);
    }

    let storage = match DirectoryStorage::open(&root) {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!("Error opening '{}': {e}", root.display());
            std::process::exit(1);
        }
    };

    let keys = match storage.keys() {
        Ok(keys) => keys,
        Err(e) => {
            eprintln!("Error listing '{}': {e}", root.display());
            std::process::exit(1);
        }
    };

    println!("LarderScope - Snapshot Store Analyzer");
    println!("=====================================");
    println!("Directory: {}", root.display());
    println!("Documents: {}", keys.len());
    println!();

    let mut unreadable = 0;
    let mut total_bytes = 0;

    for key in &keys {
        println!("  Key: {key}");

        let raw = match storage.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                println!("    ⚠️  Listed but vanished before it could be read");
                unreadable += 1;
                continue;
            }
            Err(e) => {
                println!("    ❌ Read failed: {e}");
                unreadable += 1;
                continue;
            }
        };

        total_bytes += raw.len();
        println!(
            "    Size: {} bytes ({:.2} KB)",
            raw.len(),
            raw.len() as f64 / 1024.0
        );

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => println!("    Shape: {}", describe(&value)),
            Err(e) => {
                println!("    ❌ Does not parse, will be replaced by seed data on next load: {e}");
                unreadable += 1;
            }
        }
        println!();
    }

    println!("Summary:");
    println!("--------");
    println!("  Total size: {total_bytes} bytes");
    if unreadable == 0 {
        println!("  ✅ All documents parse");
    } else {
        println!("  ⚠️  {unreadable} document(s) will fall back to seed data");
    }
}

fn describe(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null (treated as empty)".to_string(),
        serde_json::Value::Array(items) if items.is_empty() => {
            "empty array (treated as empty)".to_string()
        }
        serde_json::Value::Array(items) => format!("array of {} item(s)", items.len()),
        serde_json::Value::Object(fields) => {
            let names: Vec<&str> = fields.keys().map(String::as_str).collect();
            format!("object with fields [{}]", names.join(", "))
        }
        other => format!("scalar `{other}`"),
    }
}
