//! CLI smoke entry point.
//!
//! # Responsibility
//! - Print the linked `synapse_core` version.
//! - With `<vault> <note>`, load one note and print its outline and index.

use log::error;
use std::process::ExitCode;
use synapse_core::decoration::outline;
use synapse_core::{index_document, parse, NoteStore, Schema, VaultNoteStore};

fn main() -> ExitCode {
    println!("synapse_core version={}", synapse_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [vault, note] = args.as_slice() else {
        if !args.is_empty() {
            eprintln!("usage: synapse_cli [<vault-dir> <note-path>]");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    match describe_note(vault, note) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_describe module=cli status=error");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn describe_note(vault: &str, note: &str) -> Result<(), String> {
    let schema = Schema::notes().map_err(|err| err.to_string())?;
    let store = VaultNoteStore::new(vault);
    let markup = store.read(note).map_err(|err| err.to_string())?;
    let doc = parse(&schema, &markup).map_err(|err| err.to_string())?;

    for entry in outline(&schema, &doc) {
        println!(
            "{}{} (pos {})",
            "  ".repeat(usize::from(entry.level.saturating_sub(1))),
            entry.text,
            entry.pos
        );
    }

    let index = index_document(&schema, note, &doc);
    println!("title={}", index.title);
    println!("words={}", index.word_count);
    println!("links={}", index.outgoing_links.join(", "));
    println!("tags={}", index.tags.join(" "));
    Ok(())
}
