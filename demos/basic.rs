//! Minimal tour: open a store, write a few values, read them back.
//!
//! Run with `cargo run --example basic`.

use json_stash::JsonStash;
use serde_json::json;

fn main() -> Result<(), json_stash::Error> {
    let path = std::env::temp_dir().join("json_stash_demo_basic.json");
    let _ = std::fs::remove_file(&path);

    let db = JsonStash::open(&path)?;

    // inserts return immediately; the file is written in the background
    db.insert("greeting", json!("hello"))?;
    db.insert("visits", json!(1))?;
    db.insert("tags", json!(["a", "b"]))?;

    println!("greeting = {:?}", db.get("greeting")?);
    println!("visits   = {:?}", db.get("visits")?);
    println!("entries  = {}", db.len()?);

    // upsert overwrites, insert on an existing key does not
    db.upsert("visits", json!(2))?;
    let clash = db.insert("visits", json!(999));
    println!("double insert -> {:?}", clash.unwrap_err());

    // wait on a receipt when you need the bytes on disk right now
    db.remove("tags")?.wait()?;
    println!("on disk: {}", std::fs::read_to_string(&path)?);

    std::fs::remove_file(&path)?;
    Ok(())
}
