//! Reading and writing typed configuration through serde.
//!
//! Run with: cargo run --example typed_config

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use toml_node::{from_node, to_node, Loader};

#[derive(Debug, Serialize, Deserialize)]
struct Owner {
    name: String,
    dob: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Server {
    ip: String,
    dc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    country: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Config {
    title: String,
    owner: Owner,
    servers: BTreeMap<String, Server>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let text = r#"
title = "TOML Example"

[owner]
name = "Tom Preston-Werner"
dob = 1979-05-27T07:32:00-08:00

[servers.alpha]
ip = "10.0.0.1"
dc = "eqdc10"

[servers.beta]
ip = "10.0.0.2"
dc = "eqdc10"
country = "中国"
"#;

    // TOML text -> struct
    let config: Config = toml_node::from_str(text)?;
    println!("Owner: {} (born {})", config.owner.name, config.owner.dob);
    for (name, server) in &config.servers {
        println!("  {}: {} in {}", name, server.ip, server.dc);
    }

    // struct -> node tree -> TOML text
    let mut root = to_node(&config)?;
    root.set_comment("Generated from a typed configuration.");
    let loader = Loader::builder().build();
    println!("\n{}", loader.save_to_string(&root)?);

    // node tree -> struct
    let back: Config = from_node(&root)?;
    assert_eq!(back.servers.len(), 2);

    Ok(())
}
