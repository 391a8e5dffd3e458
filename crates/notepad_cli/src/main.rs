//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise `notepad_core` end to end against an in-memory store.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `notepad_cli [TITLE] [BODY]`

use notepad_core::{NoteStore, NoteValues, StoreConfig};
use std::error::Error;
use std::io::Read;

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let title = args.next().unwrap_or_else(|| "Hello".to_string());
    let body = args.next().unwrap_or_else(|| "Written by notepad_cli.".to_string());

    let store = NoteStore::open_in_memory(StoreConfig::default())?;
    let id = store.insert(
        &store.routes().collection_uri(),
        NoteValues::new().title(title).body(body),
    )?;
    let item = store.routes().item_uri(id);

    println!("notepad_core version={}", notepad_core::core_version());
    println!("inserted uri={item} type={}", store.get_type(&item)?);

    let Some(mut stream) = store.open_typed_stream(&item, "text/plain")? else {
        return Err(format!("no text/plain export for {item}").into());
    };
    let mut text = String::new();
    stream.read_to_string(&mut text)?;
    print!("{text}");
    Ok(())
}
