//! Loading a TOML file into a node tree, editing it, and saving it back.
//!
//! Run with: cargo run --example load_save

use std::error::Error;
use std::fs;
use toml_node::{IntegerOverflow, Loader};

const CONFIG: &str = r#"# Server configuration.

title = "TOML Example"

[database]
server = "192.168.1.1"
ports = [8001, 8001, 8002]
enabled = true

[[products]]
name = "Hammer"
sku = 738594937
"#;

fn main() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    fs::write(&path, CONFIG)?;

    let loader = Loader::builder()
        .path(&path)
        .integer_overflow(IntegerOverflow::Saturate)
        .build();

    let mut root = loader.load()?;
    println!("Header: {:?}", root.comment());
    println!(
        "Database server: {:?}",
        root.at(["database", "server"]).and_then(|n| n.as_str())
    );

    // Edit the tree
    root.at_mut(["database", "ports"]).append_list_node().set(8003);
    let nail = root.child_mut("products").append_list_node();
    nail.child_mut("name").set("Nail");
    nail.child_mut("sku").set(284758393);
    nail.child_mut("color").set("gray");

    loader.save(&root)?;
    println!("\nSaved:\n{}", fs::read_to_string(&path)?);

    // Null nodes are rejected before the file is touched
    root.at_mut(["owner", "name"]).set_null();
    match loader.save(&root) {
        Ok(()) => println!("unexpectedly saved a null node"),
        Err(e) => println!("Rejected: {}", e),
    }

    Ok(())
}
