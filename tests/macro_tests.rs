use toml_node::{node, Loader, NodeKey, Scalar};

#[test]
fn test_node_macro_null() {
    assert!(node!(null).is_null());
}

#[test]
fn test_node_macro_scalars() {
    assert_eq!(node!(true).as_bool(), Some(true));
    assert_eq!(node!(false).as_bool(), Some(false));
    assert_eq!(node!(42).scalar(), Some(&Scalar::Integer(42)));
    assert_eq!(node!(3.5).scalar(), Some(&Scalar::Float(3.5)));
    assert_eq!(node!("").as_str(), Some(""));
}

#[test]
fn test_node_macro_nested() {
    let root = node!({
        "title": "TOML Example",
        "servers": {
            "alpha": { "ip": "10.0.0.1", "dc": "eqdc10" },
            "beta": { "ip": "10.0.0.2", "country": "中国" }
        },
        "products": [
            { "name": "Hammer", "sku": 738594937 },
            { "name": "Nail", "sku": 284758393, "color": "gray" }
        ]
    });

    assert_eq!(
        root.at(["servers", "beta", "country"]).unwrap().as_str(),
        Some("中国")
    );
    let nail = &root.child("products").unwrap().children_list().unwrap()[1];
    assert_eq!(nail.path().to_string(), "products[1]");
    assert_eq!(nail.child("color").unwrap().path().to_string(), "products[1].color");
}

#[test]
fn test_node_macro_output_is_savable() {
    let root = node!({
        "database": { "ports": [8001, 8001, 8002], "enabled": true },
        "products": [{ "name": "Hammer" }, { "name": "Nail" }]
    });
    let text = Loader::builder().build().save_to_string(&root).unwrap();
    assert!(text.contains("[database]"));
    assert!(text.contains("ports = [8001, 8001, 8002]"));
    assert_eq!(text.matches("[[products]]").count(), 2);
}

#[test]
fn test_node_macro_index_keys() {
    let root = node!({ 1: "one", "two": 2 });
    assert_eq!(root.child(NodeKey::Index(1)).unwrap().as_str(), Some("one"));
    let text = Loader::builder().build().save_to_string(&root).unwrap();
    assert!(text.contains("1 = \"one\""));
}
