/// Builds a [`ConfigNode`](crate::ConfigNode) from a literal tree.
///
/// Objects become map nodes, arrays become list nodes, `null` becomes a null
/// node, and any other expression is set as a scalar through
/// `Into<Scalar>`.
///
/// ```rust
/// use toml_node::node;
///
/// let root = node!({
///     "title": "TOML Example",
///     "database": { "enabled": true, "ports": [8001, 8001, 8002] }
/// });
/// assert_eq!(root.at(["database", "ports"]).unwrap().children_list().unwrap().len(), 3);
/// ```
#[macro_export]
macro_rules! node {
    (@list $list:ident; ) => {};

    (@list $list:ident; - $value:literal $(, $($rest:tt)*)?) => {
        $list.append_list_node().set(-$value);
        $crate::node!(@list $list; $($($rest)*)?);
    };

    (@list $list:ident; $value:tt $(, $($rest:tt)*)?) => {
        $list.append_list_node().set_node($crate::node!($value));
        $crate::node!(@list $list; $($($rest)*)?);
    };

    (@map $map:ident; ) => {};

    (@map $map:ident; $key:literal : - $value:literal $(, $($rest:tt)*)?) => {
        $map.child_mut($crate::NodeKey::from($key)).set(-$value);
        $crate::node!(@map $map; $($($rest)*)?);
    };

    (@map $map:ident; $key:literal : $value:tt $(, $($rest:tt)*)?) => {
        $map.child_mut($crate::NodeKey::from($key)).set_node($crate::node!($value));
        $crate::node!(@map $map; $($($rest)*)?);
    };

    (null) => {
        $crate::ConfigNode::new()
    };

    ([]) => {{
        let mut list = $crate::ConfigNode::new();
        list.set_empty_list();
        list
    }};

    ([ $($elems:tt)+ ]) => {{
        let mut list = $crate::ConfigNode::new();
        list.set_empty_list();
        $crate::node!(@list list; $($elems)+);
        list
    }};

    ({}) => {{
        let mut map = $crate::ConfigNode::new();
        map.set_empty_map();
        map
    }};

    ({ $($entries:tt)+ }) => {{
        let mut map = $crate::ConfigNode::new();
        map.set_empty_map();
        $crate::node!(@map map; $($entries)+);
        map
    }};

    ($scalar:expr) => {{
        let mut scalar = $crate::ConfigNode::new();
        scalar.set($scalar);
        scalar
    }};
}

#[cfg(test)]
mod tests {
    use crate::{NodeKey, Scalar};

    #[test]
    fn test_node_macro_scalars() {
        assert!(node!(null).is_null());
        assert_eq!(node!(true).as_bool(), Some(true));
        assert_eq!(node!(42).scalar(), Some(&Scalar::Integer(42)));
        assert_eq!(node!(3.5).as_f64(), Some(3.5));
        assert_eq!(node!("hello").as_str(), Some("hello"));
    }

    #[test]
    fn test_node_macro_collections() {
        assert!(node!([]).is_list());
        assert!(node!({}).is_map());

        let list = node!([1, "two", [3]]);
        let items = list.children_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].as_str(), Some("two"));
        assert_eq!(items[2].path().to_string(), "[2]");

        let map = node!({ "name": "Hammer", 7: "seven" });
        assert_eq!(map.child("name").unwrap().as_str(), Some("Hammer"));
        assert_eq!(map.child(NodeKey::Index(7)).unwrap().as_str(), Some("seven"));
    }

    #[test]
    fn test_node_macro_negative_literals() {
        assert_eq!(node!(-1).as_i64(), Some(-1));

        let list = node!([-1, 2, -3.5,]);
        let items = list.children_list().unwrap();
        assert_eq!(items[0].as_i64(), Some(-1));
        assert_eq!(items[1].as_i64(), Some(2));
        assert_eq!(items[2].as_f64(), Some(-3.5));

        let map = node!({ "a": -1, "b": { "c": -2 }, "d": [-4] });
        assert_eq!(map.child("a").unwrap().as_i64(), Some(-1));
        assert_eq!(map.at(["b", "c"]).unwrap().as_i64(), Some(-2));
        assert_eq!(map.child("d").unwrap().children_list().unwrap()[0].as_i64(), Some(-4));
    }
}
