//! Builder options: pretty output, typed values, read-only opens.
//!
//! Run with `cargo run --example builder`.

use json_stash::JsonStash;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
struct Server {
    host: String,
    port: u16,
}

fn main() -> Result<(), json_stash::Error> {
    let path = std::env::temp_dir().join("json_stash_demo_builder.json");
    let _ = std::fs::remove_file(&path);

    let db: JsonStash<Server> = JsonStash::builder(&path).pretty(true).build()?;
    db.upsert(
        "primary",
        Server {
            host: "10.0.0.1".into(),
            port: 8080,
        },
    )?;
    db.upsert(
        "fallback",
        Server {
            host: "10.0.0.2".into(),
            port: 8081,
        },
    )?
    .wait()?;

    println!("pretty file:\n{}", std::fs::read_to_string(&path)?);

    // a read-only handle sees the data but refuses mutations
    let ro: JsonStash<Server> = JsonStash::open_read_only(&path)?;
    println!("read-only primary = {:?}", ro.get("primary")?);
    let denied = ro.remove("primary");
    println!("read-only remove  -> {:?}", denied.unwrap_err());
    println!("handle: {:?}", ro);

    std::fs::remove_file(&path)?;
    Ok(())
}
